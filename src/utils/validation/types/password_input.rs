//! A password accepted at registration or password change.

use anyhow::{bail, Result};

use crate::utils::validation::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

/// Plain-text password that satisfies the length policy and differs from the
/// account email. Only ever handed to the hasher, never stored or displayed.
pub struct PasswordInput(String);

impl PasswordInput {
    pub fn new(password: &str, email: &str) -> Result<Self> {
        let length = password.chars().count();

        if length < MIN_PASSWORD_LENGTH {
            bail!("Password must be at least {} characters", MIN_PASSWORD_LENGTH);
        }
        if length > MAX_PASSWORD_LENGTH {
            bail!("Password must be at most {} characters", MAX_PASSWORD_LENGTH);
        }
        if password.trim().eq_ignore_ascii_case(email.trim()) {
            bail!("Password cannot be the same as the email address");
        }

        Ok(Self(password.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Pas de Debug dérivé: le mot de passe ne doit pas apparaître dans les logs
impl std::fmt::Debug for PasswordInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordInput(***)")
    }
}
