//! Input checks shared by account and form handling

use once_cell::sync::Lazy;
use regex::Regex;

/// Shortest accepted password
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_NAME_LENGTH: usize = 100;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Returns the trimmed email, or a message for the user.
pub fn validate_email(email: &str) -> Result<String, String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Please enter your email address".to_string());
    }
    if email.len() > 255 || !EMAIL.is_match(email) {
        return Err("Please enter a valid email address".to_string());
    }
    Ok(email.to_string())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }
    Ok(())
}

/// Returns the trimmed name.
pub fn validate_name(name: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Please enter your name".to_string());
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(format!("Name must be at most {} characters", MAX_NAME_LENGTH));
    }
    Ok(name.to_string())
}

/// Absolute http(s) URL
pub fn validate_link(link: &str) -> Result<String, String> {
    let link = link.trim();
    let parsed = url::Url::parse(link).map_err(|_| format!("'{}' is not a valid URL", link))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host().is_some() => Ok(link.to_string()),
        _ => Err(format!("'{}' must be an http or https URL", link)),
    }
}
