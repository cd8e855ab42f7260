use regex::Regex;
use std::sync::LazyLock;

pub const MAX_TEXT_LEN: usize = 255;
pub const MAX_EMAIL_LEN: usize = 100;
pub const MAX_PHONE_LEN: usize = 20;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-()]{8,15}$").expect("valid regex"));
static ORG_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{9}$").expect("valid regex"));

/// Trims, truncates to `max_len` characters and removes markup characters.
pub fn sanitize_text(input: &str, max_len: usize) -> String {
    input
        .trim()
        .chars()
        .take(max_len)
        .filter(|c| !matches!(c, '<' | '>' | '\'' | '"' | '&'))
        .collect()
}

/// Lower-cased address, or `None` when it is not an email address.
pub fn sanitize_email(input: &str) -> Option<String> {
    let email = sanitize_text(input, MAX_EMAIL_LEN).to_lowercase();
    EMAIL.is_match(&email).then_some(email)
}

/// Keeps digits, `+`, `-`, spaces and parentheses; `None` when the result
/// is not a phone number.
pub fn sanitize_phone(input: &str) -> Option<String> {
    let phone: String = sanitize_text(input, MAX_PHONE_LEN)
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
        .collect();
    PHONE.is_match(&phone).then_some(phone)
}

/// Nine digit Norwegian organisation number, separators removed.
pub fn sanitize_org_number(input: &str) -> Option<String> {
    let digits: String = sanitize_text(input, MAX_PHONE_LEN)
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    ORG_NUMBER.is_match(&digits).then_some(digits)
}
