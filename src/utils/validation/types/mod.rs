//! Type definitions for the validation system

mod email_input;
mod text_input;

pub use email_input::EmailInput;
pub use text_input::TextInput;
