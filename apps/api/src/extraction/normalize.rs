/// Normalizes extracted resume text.
///
/// - drops control characters except newline and tab
/// - unifies line endings to `\n`
/// - collapses runs of spaces/tabs into one space and trims every line
/// - keeps at most one blank line between blocks
pub fn normalize_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(unified.len());
    let mut blank_run = 0usize;

    for line in unified.lines() {
        let cleaned = collapse_inline_whitespace(line);
        if cleaned.is_empty() {
            blank_run += 1;
            if blank_run == 1 && !out.is_empty() {
                out.push('\n');
            }
            continue;
        }
        blank_run = 0;
        out.push_str(&cleaned);
        out.push('\n');
    }

    out.trim().to_string()
}

fn collapse_inline_whitespace(line: &str) -> String {
    let mut cleaned = String::with_capacity(line.len());
    let mut pending_space = false;

    for c in line.chars() {
        if c == ' ' || c == '\t' || c == '\u{a0}' {
            pending_space = true;
            continue;
        }
        if c.is_control() {
            continue;
        }
        if pending_space && !cleaned.is_empty() {
            cleaned.push(' ');
        }
        pending_space = false;
        cleaned.push(c);
    }

    cleaned
}
