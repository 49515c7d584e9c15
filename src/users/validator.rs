// src/users/validator.rs
// Field validation for account creation and updates

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{PdmsError, PdmsResult};

const MAX_FIELD_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 8;
const PASSWORD_SPECIALS: &str = "@#$%^&+=";

lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[a-zA-Z0-9_+&*-]+(?:\.[a-zA-Z0-9_+&*-]+)*@(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,7}$")
            .expect("email pattern is valid");
}

pub fn validate_email(email: &str) -> PdmsResult<()> {
    if email.trim().is_empty() {
        return Err(PdmsError::invalid("Email is required"));
    }
    if email.len() > MAX_FIELD_LEN {
        return Err(PdmsError::invalid("Email cannot exceed 255 characters"));
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(PdmsError::invalid("Invalid email format"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> PdmsResult<()> {
    if password.trim().is_empty() {
        return Err(PdmsError::invalid("Password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PdmsError::invalid("Password must be at least 8 characters long"));
    }

    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    let has_whitespace = password.chars().any(char::is_whitespace);

    if !(has_digit && has_lower && has_upper && has_special) || has_whitespace {
        return Err(PdmsError::invalid(
            "Password must contain at least one digit, one lowercase letter, \
             one uppercase letter, one special character, and no whitespace",
        ));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> PdmsResult<()> {
    if name.trim().is_empty() {
        return Err(PdmsError::invalid("Name is required"));
    }
    if name.len() > MAX_FIELD_LEN {
        return Err(PdmsError::invalid("Name cannot exceed 255 characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_format() {
        assert!(validate_email("jane.doe@example.com").is_ok());
        assert!(validate_email("ops+alerts@sub.example.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign.example.com").is_err());
        assert!(validate_email("user@localhost").is_err());
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password("Str0ng@pass").is_ok());
        assert!(validate_password("Sh0rt@").is_err());
        assert!(validate_password("alllowercase1@").is_err());
        assert!(validate_password("NoDigits@here").is_err());
        assert!(validate_password("NoSpecial123").is_err());
        assert!(validate_password("Has Space1@").is_err());
    }

    #[test]
    fn test_name_length() {
        assert!(validate_name("Jane").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(256)).is_err());
    }
}
