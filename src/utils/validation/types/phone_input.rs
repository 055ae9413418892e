//! Phone numbers used for reminders and emergency contacts.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;

// Chiffres avec un indicatif optionnel, séparateurs espace ou tiret autorisés
static PHONE_REGEX: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{6,18}[0-9]$"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneInput(String);

impl PhoneInput {
    pub fn new(phone: &str) -> Result<Self> {
        let trimmed = phone.trim();
        let Ok(regex) = PHONE_REGEX.as_ref() else {
            bail!("Phone validation unavailable");
        };
        if !regex.is_match(trimmed) {
            bail!("Invalid phone number");
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Accepts an empty value as "no phone number"
    pub fn optional(phone: &str) -> Result<Option<Self>> {
        if phone.trim().is_empty() {
            Ok(None)
        } else {
            Self::new(phone).map(Some)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_formats() {
        for ok in ["+91 98765 43210", "011-26588500", "9876543210"] {
            assert!(PhoneInput::new(ok).is_ok(), "Should accept {}", ok);
        }
        for bad in ["", "12345", "call me", "+91 98765 4321x", "++919876543210"] {
            assert!(PhoneInput::new(bad).is_err(), "Should reject {}", bad);
        }
    }

    #[test]
    fn test_optional_phone() {
        assert_eq!(PhoneInput::optional("  ").unwrap(), None);
        assert!(PhoneInput::optional("abc").is_err());
    }
}
