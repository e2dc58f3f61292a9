//! Kazakhstan phone number helpers.
//!
//! The backend keys users by the normalized 11-digit form `7XXXXXXXXXX`.

#[cfg(test)]
#[path = "phone_test.rs"]
mod phone_test;

fn digits(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Strip formatting, turn a leading `8` into `7`, and prepend `7` otherwise.
#[must_use]
pub fn normalize(phone: &str) -> String {
    let digits = digits(phone);
    if let Some(rest) = digits.strip_prefix('8') {
        return format!("7{rest}");
    }
    if !digits.is_empty() && !digits.starts_with('7') {
        return format!("7{digits}");
    }
    digits
}

/// Exactly 11 digits starting with `7`.
#[must_use]
pub fn is_valid(phone: &str) -> bool {
    let digits = digits(phone);
    digits.len() == 11 && digits.starts_with('7')
}

/// Render as `+7 (XXX) XXX-XX-XX`, progressively for partial input.
#[must_use]
pub fn format(phone: &str) -> String {
    let digits = digits(phone);
    if digits.is_empty() {
        return String::new();
    }

    let slice = |from: usize, to: usize| digits.get(from..to.min(digits.len())).unwrap_or("");
    let mut out = String::from("+7");
    if digits.len() > 1 {
        out.push_str(" (");
        out.push_str(slice(1, 4));
    }
    if digits.len() >= 4 {
        out.push_str(") ");
        out.push_str(slice(4, 7));
    }
    if digits.len() >= 7 {
        out.push('-');
        out.push_str(slice(7, 9));
    }
    if digits.len() >= 9 {
        out.push('-');
        out.push_str(slice(9, 11));
    }
    out
}

/// Hide the middle digits: `+7 (700) ***-**-67`. Short input is returned unchanged.
#[must_use]
pub fn mask(phone: &str) -> String {
    let digits = digits(phone);
    if digits.len() < 11 {
        return phone.to_owned();
    }
    format!("+7 ({}) ***-**-{}", &digits[1..4], &digits[9..11])
}
