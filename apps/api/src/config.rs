use anyhow::{Context, Result};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_MATCH_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_INTERVIEW_QUESTION_COUNT: usize = 8;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Largest resume upload accepted, in bytes.
    pub max_upload_bytes: usize,
    /// How long a finished match stays in Redis, keyed by fingerprint.
    pub match_cache_ttl_secs: u64,
    /// Default number of interview questions per match (3..=15).
    pub interview_question_count: usize,
    /// `false` selects the deterministic keyword scorer instead of the LLM scorer.
    pub enable_llm_match_scoring: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let interview_question_count = optional_env(
            "INTERVIEW_QUESTION_COUNT",
            DEFAULT_INTERVIEW_QUESTION_COUNT,
        )?;
        if !(3..=15).contains(&interview_question_count) {
            anyhow::bail!(
                "INTERVIEW_QUESTION_COUNT must be between 3 and 15, got {interview_question_count}"
            );
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: optional_env("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_upload_bytes: optional_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            match_cache_ttl_secs: optional_env(
                "MATCH_CACHE_TTL_SECS",
                DEFAULT_MATCH_CACHE_TTL_SECS,
            )?,
            interview_question_count,
            enable_llm_match_scoring: optional_env("ENABLE_LLM_MATCH_SCORING", true)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Reads and parses an optional variable, falling back to `default` when unset.
fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_env_uses_default_when_unset() {
        let value: usize = optional_env("SCREENER_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_optional_env_parses_value() {
        std::env::set_var("SCREENER_TEST_PORT_VALUE", " 9090 ");
        let value: u16 = optional_env("SCREENER_TEST_PORT_VALUE", 8080).unwrap();
        assert_eq!(value, 9090);
    }

    #[test]
    fn test_optional_env_rejects_garbage() {
        std::env::set_var("SCREENER_TEST_BAD_BOOL", "maybe");
        let result: Result<bool> = optional_env("SCREENER_TEST_BAD_BOOL", true);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("SCREENER_TEST_BAD_BOOL"), "error was: {err}");
    }

    #[test]
    fn test_require_env_names_missing_key() {
        let err = require_env("SCREENER_TEST_DEFINITELY_MISSING").unwrap_err();
        assert!(err.to_string().contains("SCREENER_TEST_DEFINITELY_MISSING"));
    }
}
