//! Gestion des routes des comptes du personnel: connexion, inscription,
//! liste et suppression.

use axum::{
    extract::{Json, Path},
    Extension,
};
use log::info;
use serde_json::{json, Value};

use crate::backend::models::{parse_registration, AccountView};
use crate::services::WardService;
use crate::utils::error_messages::{AppError, REGISTRATION_ERROR};

/// Connexion par email et mot de passe. Aucune session n'est créée: le client
/// conserve le compte renvoyé.
pub async fn login(
    Extension(ward): Extension<WardService>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let email = payload
        .get("email")
        .and_then(Value::as_str)
        .ok_or(AppError::Unauthorized)?;
    let password = payload
        .get("password")
        .and_then(Value::as_str)
        .ok_or(AppError::Unauthorized)?;

    let account = ward.authenticate(email, password).await?;
    info!("Login succeeded for {}", account.email);

    Ok(Json(json!({
        "success": true,
        "user": AccountView::from(account),
    })))
}

/// Inscription d'un compte. Toute erreur, y compris un email déjà utilisé,
/// est une erreur client.
pub async fn register(
    Extension(ward): Extension<WardService>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let new_account = parse_registration(&payload)?;

    let account = ward
        .register(new_account)
        .await
        .map_err(|e| AppError::invalid(REGISTRATION_ERROR, e))?;

    Ok(Json(json!({
        "success": true,
        "message": "User created",
        "user": AccountView::from(account),
    })))
}

/// Liste de tous les comptes
pub async fn list_users(Extension(ward): Extension<WardService>) -> Json<Value> {
    let accounts: Vec<AccountView> = ward
        .list_accounts()
        .await
        .into_iter()
        .map(AccountView::from)
        .collect();

    Json(json!({ "success": true, "data": accounts }))
}

/// Suppression d'un compte, sans vérifier qu'il existe
pub async fn delete_user(
    Extension(ward): Extension<WardService>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ward.delete_account(&id).await?;
    Ok(Json(json!({ "success": true })))
}
