//! Regex fallbacks for contact details the model missed or mangled.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b").expect("email regex is valid")
});

static EMAIL_EXACT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").expect("email regex is valid")
});

// Requires at least three digit groups so year ranges like "2019-2024" never match.
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+\d{1,3}[\s.-]?)?(?:\(\d{2,4}\)[\s.-]?|\d{2,4}[\s.-])\d{3,4}[\s.-]?\d{3,4}")
        .expect("phone regex is valid")
});

const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL_EXACT_RE.is_match(candidate)
}

/// First email address in the text, lowercased.
pub fn find_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_lowercase())
}

pub fn is_plausible_phone(candidate: &str) -> bool {
    let digits = candidate.chars().filter(|c| c.is_ascii_digit()).count();
    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits)
}

/// First phone-number-shaped span in the text with a plausible digit count.
pub fn find_phone(text: &str) -> Option<String> {
    PHONE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .find(|m| is_plausible_phone(m))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_email_lowercases() {
        let text = "Contact: Jane.Doe@Example.COM | github.com/jane";
        assert_eq!(find_email(text).as_deref(), Some("jane.doe@example.com"));
    }

    #[test]
    fn test_find_email_none() {
        assert_eq!(find_email("no contact info here"), None);
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a.b+c@mail.co"));
        assert!(!is_valid_email("jane at example dot com"));
        assert!(!is_valid_email("jane@localhost"));
    }

    #[test]
    fn test_find_us_phone() {
        assert_eq!(
            find_phone("Phone: (555) 123-4567").as_deref(),
            Some("(555) 123-4567")
        );
    }

    #[test]
    fn test_find_international_phone() {
        assert_eq!(
            find_phone("Tel +44 20 7946 0958, London").as_deref(),
            Some("+44 20 7946 0958")
        );
    }

    #[test]
    fn test_year_range_is_not_a_phone() {
        assert_eq!(find_phone("Acme Corp 2019-2024, Globex 2015-2019"), None);
    }

    #[test]
    fn test_plausible_phone_digit_bounds() {
        assert!(is_plausible_phone("555-1234"));
        assert!(!is_plausible_phone("12-34"));
        assert!(!is_plausible_phone("1234567890123456"));
    }
}
