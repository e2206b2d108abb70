//! Utilitaires partagés: messages d'erreur HTTP et validation des entrées.
pub mod error_messages;
pub mod validation;
