//! Provides a validated text representation for free-form user input:
//! names, symptom descriptions, chat messages, prescription text.
//!
//! Lengths are counted in characters, not bytes, since most supported
//! languages use multi-byte scripts (Devanagari, Tamil, Bengali...).

use ammonia::is_html;
use anyhow::{bail, Context, Result};
use std::fmt;
use unicode_normalization::UnicodeNormalization;
use validator::ValidateNonControlCharacter;

use crate::utils::validation::{MAX_CONTENT_LENGTH, MAX_SHORT_CONTENT_LENGTH};

/// Validated, trimmed and NFKC-normalized text. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextInput {
    text_content: String,
}

impl TextInput {
    /// For multi-line content such as symptoms, chat messages or notes
    pub fn new_long_form(content: &str) -> Result<Self> {
        Self::new(content, MAX_CONTENT_LENGTH, true).context("Invalid text")
    }

    /// For single-line content such as a name, a city or a title
    pub fn new_short_form(content: &str) -> Result<Self> {
        Self::new(content, MAX_SHORT_CONTENT_LENGTH, false).context("Invalid field")
    }

    /// An empty optional field is accepted and yields `None`
    pub fn optional_short_form(content: Option<&str>) -> Result<Option<Self>> {
        match content.map(str::trim) {
            None | Some("") => Ok(None),
            Some(content) => Self::new_short_form(content).map(Some),
        }
    }

    fn new(content: &str, max_length: usize, multiline: bool) -> Result<Self> {
        let trimmed = content.trim();

        if trimmed.is_empty() {
            bail!("Content cannot be empty");
        }

        if trimmed.chars().count() > max_length {
            bail!("Content exceeds maximum length of {} characters", max_length);
        }

        // Les retours à la ligne sont des caractères de contrôle légitimes en texte long
        let controls_ok = if multiline {
            trimmed.lines().all(|line| line.validate_non_control_character())
        } else {
            trimmed.validate_non_control_character()
        };
        if !controls_ok {
            bail!("Content contains invalid control characters");
        }

        if is_html(trimmed) {
            bail!("Content cannot contain HTML");
        }

        Ok(Self {
            text_content: trimmed.nfkc().collect(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text_content
    }

    pub fn into_string(self) -> String {
        self.text_content
    }
}

impl fmt::Display for TextInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text_content)
    }
}

impl AsRef<str> for TextInput {
    fn as_ref(&self) -> &str {
        &self.text_content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_content() {
        let valid_contents = vec![
            "Priya Sharma",
            "Fever since 3 days, 101°F",
            "मुझे सिरदर्द है",
            "தலைவலி",
            " Dr. Kim  ", // Should be trimmed
        ];

        for content in valid_contents {
            let result = TextInput::new_short_form(content);
            assert!(result.is_ok(), "Should accept valid content: {}", content);
        }
    }

    #[test]
    fn test_invalid_content() {
        let too_long = "a".repeat(MAX_SHORT_CONTENT_LENGTH + 1);
        let invalid_contents = vec![
            "",
            "   ",
            "<script>alert(1)</script>",
            &too_long,
            "Text with null\0character",
            "two\nlines",
        ];

        for content in invalid_contents {
            let result = TextInput::new_short_form(content);
            assert!(result.is_err(), "Should reject invalid content: {:?}", content);
        }
    }

    #[test]
    fn test_long_form_accepts_newlines() {
        let text = TextInput::new_long_form("Headache\nFever\r\nCough").unwrap();
        assert_eq!(text.as_str(), "Headache\nFever\r\nCough");
        assert!(TextInput::new_long_form("bad\u{7}bell").is_err());
    }

    #[test]
    fn test_length_is_counted_in_characters() {
        // 200 caractères devanagari font bien plus de 200 octets
        let hindi = "ह".repeat(MAX_SHORT_CONTENT_LENGTH);
        assert!(hindi.len() > MAX_SHORT_CONTENT_LENGTH);
        assert!(TextInput::new_short_form(&hindi).is_ok());
    }

    #[test]
    fn test_optional_short_form() {
        assert_eq!(TextInput::optional_short_form(None).unwrap(), None);
        assert_eq!(TextInput::optional_short_form(Some("  ")).unwrap(), None);
        assert_eq!(
            TextInput::optional_short_form(Some(" Cardiology ")).unwrap().unwrap().as_str(),
            "Cardiology"
        );
        assert!(TextInput::optional_short_form(Some("<b>x</b>")).is_err());
    }

    #[test]
    fn test_unicode_normalization() {
        // "ﬁ" (ligature) devient "fi" après NFKC
        let text = TextInput::new_short_form("ﬁle").unwrap();
        assert_eq!(text.as_str(), "file");
    }
}
