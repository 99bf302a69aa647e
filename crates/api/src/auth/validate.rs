//! Request field validation

/// Check that `email` looks like a deliverable address: exactly one `@`,
/// a non-empty local part, and a domain containing a dot. Full RFC 5321
/// parsing is deliberately out of scope; the mailed one-time code is the
/// real proof of ownership.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 || email.contains(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Nicknames are 1..=32 characters of letters, digits, `_` or `-`
pub fn is_valid_nickname(nickname: &str) -> bool {
    let len = nickname.chars().count();
    (1..=32).contains(&len)
        && nickname
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}
