//! Free-text fields of accounts and patient records.
//!
//! Names, gender, specialty and diagnosis are stored as given by the client
//! and later rendered by the ward dashboards, so they are checked before they
//! reach the store:
//! - length limits (short form for labels, long form for the diagnosis)
//! - no control characters
//! - no HTML
//! - Unicode NFKC normalization

use ammonia::is_html;
use anyhow::{bail, Context, Result};
use std::fmt;
use unicode_normalization::UnicodeNormalization;
use validator::ValidateNonControlCharacter;

use crate::utils::validation::{MAX_CONTENT_LENGTH, MAX_SHORT_CONTENT_LENGTH};

/// Validated, normalized free text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextInput {
    text_content: String,
}

impl TextInput {
    /// Long free text, such as a diagnosis.
    pub fn new_long_form(content: &str) -> Result<Self> {
        Self::new(content, MAX_CONTENT_LENGTH).context("invalid long text")
    }

    /// Short labels, such as a name, a gender or a specialty.
    pub fn new_short_form(content: &str) -> Result<Self> {
        Self::new(content, MAX_SHORT_CONTENT_LENGTH).context("invalid short text")
    }

    /// Optional field: absent or blank input yields `None`, anything else
    /// goes through the short-form checks. `field` names the field in the
    /// error message.
    pub fn optional_short_form(field: &str, content: Option<&str>) -> Result<Option<String>> {
        Self::optional(field, content, Self::new_short_form)
    }

    /// Same as [`TextInput::optional_short_form`] with the long-form limits.
    pub fn optional_long_form(field: &str, content: Option<&str>) -> Result<Option<String>> {
        Self::optional(field, content, Self::new_long_form)
    }

    fn optional(
        field: &str,
        content: Option<&str>,
        validate: fn(&str) -> Result<Self>,
    ) -> Result<Option<String>> {
        match content.map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => {
                let text = validate(raw).with_context(|| format!("{field} is invalid"))?;
                Ok(Some(text.into_string()))
            }
        }
    }

    fn new(content: &str, max_length: usize) -> Result<Self> {
        let trimmed = content.trim();

        if trimmed.is_empty() {
            bail!("content cannot be empty");
        }

        if trimmed.chars().count() > max_length {
            bail!("content exceeds maximum length of {} characters", max_length);
        }

        if !trimmed.validate_non_control_character() {
            bail!("content contains control characters");
        }

        if is_html(trimmed) {
            bail!("content cannot contain HTML");
        }

        Ok(Self {
            text_content: trimmed.nfkc().collect::<String>(),
        })
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
