//! Account email addresses.
//!
//! Emails are the login key of staff accounts and must be unique in the
//! store, so they are compared in a single canonical form: trimmed and
//! lower-cased. Registration and login both go through [`EmailInput`] so the
//! two always agree on that form.

use anyhow::{bail, Result};
use std::fmt;
use validator::ValidateEmail;

use crate::utils::validation::MAX_EMAIL_LENGTH;

/// A syntactically valid email address in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmailInput {
    email: String,
}

impl EmailInput {
    /// Validates `email` against the HTML5 email grammar and normalizes it.
    ///
    /// # Example
    /// ```ignore
    /// let email = EmailInput::new("  Nurse.Joy@Ward.test ")?;
    /// assert_eq!(email.as_str(), "nurse.joy@ward.test");
    /// ```
    pub fn new(email: &str) -> Result<Self> {
        let email_trimmed = email.trim();

        if email_trimmed.is_empty() {
            bail!("email is required");
        }

        if email_trimmed.len() > MAX_EMAIL_LENGTH {
            bail!("email exceeds maximum length of {} characters", MAX_EMAIL_LENGTH);
        }

        if !email_trimmed.validate_email() {
            bail!("email {:?} is not a valid address", email_trimmed);
        }

        Ok(Self {
            email: email_trimmed.to_lowercase(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.email
    }

    pub fn into_string(self) -> String {
        self.email
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
