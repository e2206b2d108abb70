//! Constants used throughout the validation system

/// Maximum length of an email address
pub const MAX_EMAIL_LENGTH: usize = 254;
/// Maximum length for long free text such as a diagnosis
pub const MAX_CONTENT_LENGTH: usize = 2_000;
/// Maximum length for short free text such as a name or a specialty
pub const MAX_SHORT_CONTENT_LENGTH: usize = 250;
