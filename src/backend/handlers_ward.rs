//! Gestion des routes du service: lits, patients, constantes vitales et sorties.

use axum::{
    extract::{Json, Path},
    Extension,
};
use serde_json::{json, Value};

use crate::backend::models::{
    parse_admission, parse_discharge, parse_vital, LatestVital, PatientDetail,
};
use crate::models::BedId;
use crate::services::WardService;
use crate::utils::error_messages::AppError;

/// Tous les lits, triés par chambre puis par numéro
pub async fn list_beds(Extension(ward): Extension<WardService>) -> Json<Value> {
    Json(json!({ "success": true, "data": ward.list_beds().await }))
}

pub async fn list_patients(Extension(ward): Extension<WardService>) -> Json<Value> {
    Json(json!({ "success": true, "data": ward.list_patients().await }))
}

/// Admission d'un patient, avec occupation de son lit si `bedId` est fourni.
/// Un échec de la transaction est une erreur serveur.
pub async fn admit_patient(
    Extension(ward): Extension<WardService>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let new_patient = parse_admission(payload)?;

    let patient = ward
        .admit(new_patient)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({ "success": true, "data": patient })))
}

/// Un patient et le dernier relevé de son lit (`vitals: {}` s'il n'y en a pas)
pub async fn get_patient(
    Extension(ward): Extension<WardService>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let (patient, vitals) = ward.patient_with_vitals(&id).await?;

    let detail = PatientDetail {
        patient,
        vitals: LatestVital(vitals),
    };
    Ok(Json(json!({ "success": true, "data": detail })))
}

/// Dernier relevé d'un lit, renvoyé tel quel (`{}` s'il n'y en a pas)
pub async fn latest_vital(
    Extension(ward): Extension<WardService>,
    Path(bed_id): Path<String>,
) -> Json<LatestVital> {
    Json(LatestVital(ward.latest_vital(&BedId::new(bed_id)).await))
}

/// Enregistrement d'un relevé transmis par un moniteur
pub async fn record_vital(
    Extension(ward): Extension<WardService>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let new_vital = parse_vital(payload)?;
    let reading = ward.record_vital(new_vital).await?;
    Ok(Json(json!({ "success": true, "data": reading })))
}

/// Sortie du patient d'un lit. Réussit même si le lit n'existe pas ou est vide.
pub async fn discharge(
    Extension(ward): Extension<WardService>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let bed_id = parse_discharge(&payload)?;
    ward.discharge(&bed_id).await?;
    Ok(Json(json!({ "success": true, "message": "Patient discharged" })))
}
