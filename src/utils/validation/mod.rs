//! Root module for the validation system.
//! Exposes the validated input types used by the request handlers.

mod types;
mod constants;

pub use constants::*;
pub use types::{EmailInput, TextInput};
