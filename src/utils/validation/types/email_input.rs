//! A validated, normalized email address used as the login identifier.

use anyhow::{bail, Result};
use std::fmt;
use validator::ValidateEmail;

/// Maximum length of an address (RFC 5321 path limit minus the brackets)
const MAX_EMAIL_LENGTH: usize = 254;

/// Trimmed and lowercased email address, guaranteed to follow the HTML5 email format.
/// Two inputs differing only by case or surrounding spaces yield the same value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmailInput {
    email: String,
}

impl EmailInput {
    pub fn new(email: &str) -> Result<Self> {
        let trimmed = email.trim();

        if trimmed.is_empty() {
            bail!("Email address cannot be empty");
        }
        if trimmed.len() > MAX_EMAIL_LENGTH {
            bail!("Email address exceeds maximum length of {} characters", MAX_EMAIL_LENGTH);
        }
        if !trimmed.validate_email() {
            bail!("Invalid email format");
        }

        Ok(Self {
            email: trimmed.to_lowercase(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.email
    }
}

impl fmt::Display for EmailInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.email)
    }
}

impl AsRef<str> for EmailInput {
    fn as_ref(&self) -> &str {
        &self.email
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        for email in [
            "priya@example.com",
            "dr.mehta@hospital.co.in",
            "patient+clinic@example.org",
            "  LAKSHMI@EXAMPLE.COM ",
        ] {
            assert!(EmailInput::new(email).is_ok(), "Should accept valid email: {}", email);
        }
    }

    #[test]
    fn test_invalid_emails() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        for email in ["", " ", "priya", "@example.com", "priya@", "priya @example.com", too_long.as_str()] {
            assert!(EmailInput::new(email).is_err(), "Should reject invalid email: {}", email);
        }
    }

    #[test]
    fn test_email_is_normalized() {
        let email = EmailInput::new("  Priya@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "priya@example.com");
        assert_eq!(email, EmailInput::new("priya@example.com").unwrap());
    }
}
