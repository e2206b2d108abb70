//! Module principal pour le backend HTTP de l'application.
//! Contient les handlers des routes, les structures échangées avec l'API
//! et le routeur.
pub mod handlers_staff;
pub mod handlers_ward;
mod models;
pub mod router;
