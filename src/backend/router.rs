//! Configuration des routes pour l'application.
//! Définit les routes du personnel et du service, et configure les middlewares.

use axum::{
    routing::{delete, get, post},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::backend::handlers_staff::{delete_user, list_users, login, register};
use crate::backend::handlers_ward::{
    admit_patient, discharge, get_patient, latest_vital, list_beds, list_patients, record_vital,
};
use crate::services::WardService;

/// Initialisation du routeur principal et des middlewares
pub fn get_router(ward: WardService) -> Router {
    let router = Router::new()
        .merge(staff_routes())
        .merge(ward_routes())
        .layer(Extension(ward));

    // CORS ouvert à toutes les origines (en mode debug uniquement)
    if cfg!(debug_assertions) {
        let cors = CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(Any);
        router.layer(cors)
    } else {
        router
    }
}

/// Routes des comptes du personnel
fn staff_routes() -> Router {
    Router::new()
        .route("/login", post(login)) // Connexion
        .route("/users/register", post(register)) // Inscription
        .route("/users", get(list_users)) // Liste des comptes
        .route("/users/:id", delete(delete_user)) // Suppression d'un compte
}

/// Routes du service: lits, patients, constantes
fn ward_routes() -> Router {
    Router::new()
        .route("/beds", get(list_beds)) // Lits triés par chambre et numéro
        .route("/beds/discharge", post(discharge)) // Sortie d'un patient
        .route("/patients", get(list_patients).post(admit_patient)) // Liste et admission
        .route("/patients/:id", get(get_patient)) // Patient et dernières constantes
        .route("/vitals", post(record_vital)) // Relevé d'un moniteur
        .route("/vitals/latest/:bed_id", get(latest_vital)) // Dernier relevé d'un lit
}
