//! Définitions des structures pour les interactions avec l'API.
//! Lecture et validation des corps de requête, mise en forme des réponses.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use serde_json::Value;
use strum::IntoEnumIterator;

use crate::models::{Account, AccountId, BedId, Patient, PatientStatus, Role, VitalReading};
use crate::services::{NewAccount, NewPatient, NewVital};
use crate::utils::error_messages::{
    AppError, ADMISSION_ERROR, DISCHARGE_ERROR, REGISTRATION_ERROR, VITAL_ERROR,
};
use crate::utils::validation::{EmailInput, TextInput};

/// Un compte tel que renvoyé au client, sans son mot de passe
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    #[serde(rename = "_id")]
    pub id: AccountId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            role: account.role,
            specialty: account.specialty,
        }
    }
}

/// Le dernier relevé d'un lit; `{}` s'il n'y en a aucun.
#[derive(Debug)]
pub struct LatestVital(pub Option<VitalReading>);

impl Serialize for LatestVital {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Some(reading) => reading.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

/// Un patient accompagné du dernier relevé de son lit
#[derive(Debug, Serialize)]
pub struct PatientDetail {
    #[serde(flatten)]
    pub patient: Patient,
    pub vitals: LatestVital,
}

fn str_field<'a>(payload: &'a Value, name: &str) -> Option<&'a str> {
    payload.get(name).and_then(Value::as_str)
}

/// Champ texte non vide, sans les espaces autour
fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Lecture du corps de `POST /users/register`
pub fn parse_registration(payload: &Value) -> Result<NewAccount, AppError> {
    let invalid = |detail: String| AppError::invalid(REGISTRATION_ERROR, detail);

    let email = EmailInput::new(str_field(payload, "email").unwrap_or_default())
        .map_err(|e| invalid(format!("{e:#}")))?;

    let password = str_field(payload, "password")
        .filter(|p| !p.is_empty())
        .ok_or_else(|| invalid("password is required".to_string()))?;

    let role = match non_blank(str_field(payload, "role")) {
        None => Role::default(),
        Some(raw) => Role::from_str(raw).map_err(|_| {
            let allowed: Vec<String> = Role::iter().map(|r| r.to_string()).collect();
            invalid(format!(
                "{raw:?} is not a valid role (expected one of {})",
                allowed.join(", ")
            ))
        })?,
    };

    let name = TextInput::optional_short_form("name", str_field(payload, "name"))
        .map_err(|e| invalid(format!("{e:#}")))?;
    let specialty = TextInput::optional_short_form("specialty", str_field(payload, "specialty"))
        .map_err(|e| invalid(format!("{e:#}")))?;

    Ok(NewAccount {
        name,
        email,
        password: password.to_string(),
        role,
        specialty,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdmissionPayload {
    name: Option<String>,
    age: Option<u32>,
    gender: Option<String>,
    diagnosis: Option<String>,
    status: Option<PatientStatus>,
    admission_date: Option<DateTime<Utc>>,
    assigned_doctor_id: Option<String>,
    bed_id: Option<String>,
}

/// Lecture du corps de `POST /patients`
pub fn parse_admission(payload: Value) -> Result<NewPatient, AppError> {
    let raw: AdmissionPayload =
        serde_json::from_value(payload).map_err(|e| AppError::invalid(ADMISSION_ERROR, e))?;

    let status = raw.status.unwrap_or_default();
    if status == PatientStatus::Discharged {
        return Err(AppError::invalid(
            ADMISSION_ERROR,
            "a patient cannot be admitted as Discharged",
        ));
    }

    let assigned_doctor_id = non_blank(raw.assigned_doctor_id.as_deref())
        .map(AccountId::from_str)
        .transpose()
        .map_err(|e| AppError::invalid(ADMISSION_ERROR, format!("assignedDoctorId: {e}")))?;

    let text = |field: &str, value: Option<&str>| {
        TextInput::optional_short_form(field, value)
            .map_err(|e| AppError::invalid(ADMISSION_ERROR, format!("{e:#}")))
    };

    Ok(NewPatient {
        name: text("name", raw.name.as_deref())?,
        age: raw.age,
        gender: text("gender", raw.gender.as_deref())?,
        diagnosis: TextInput::optional_long_form("diagnosis", raw.diagnosis.as_deref())
            .map_err(|e| AppError::invalid(ADMISSION_ERROR, format!("{e:#}")))?,
        status,
        admission_date: raw.admission_date,
        bed_id: non_blank(raw.bed_id.as_deref()).map(BedId::new),
        assigned_doctor_id,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VitalPayload {
    bed_id: Option<String>,
    heart_rate: Option<f64>,
    spo2: Option<f64>,
    temperature: Option<f64>,
    respiration: Option<f64>,
    timestamp: Option<DateTime<Utc>>,
}

/// Lecture du corps de `POST /vitals`
pub fn parse_vital(payload: Value) -> Result<NewVital, AppError> {
    let raw: VitalPayload =
        serde_json::from_value(payload).map_err(|e| AppError::invalid(VITAL_ERROR, e))?;

    let bed_id = non_blank(raw.bed_id.as_deref())
        .map(BedId::new)
        .ok_or_else(|| AppError::invalid(VITAL_ERROR, "bedId is required"))?;

    Ok(NewVital {
        bed_id,
        heart_rate: raw.heart_rate,
        spo2: raw.spo2,
        temperature: raw.temperature,
        respiration: raw.respiration,
        timestamp: raw.timestamp,
    })
}

/// Lecture du corps de `POST /beds/discharge`
pub fn parse_discharge(payload: &Value) -> Result<BedId, AppError> {
    non_blank(str_field(payload, "bedId"))
        .map(BedId::new)
        .ok_or_else(|| AppError::invalid(DISCHARGE_ERROR, "bedId is required"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PatientId, VitalId};
    use crate::utils::validation::MAX_SHORT_CONTENT_LENGTH;
    use serde_json::json;

    fn bad_request_detail(err: AppError) -> String {
        match err {
            AppError::BadRequest(detail) => detail,
            other => panic!("expected a bad request, got {other:?}"),
        }
    }

    #[test]
    fn test_registration_defaults_to_nurse() {
        let account = parse_registration(&json!({
            "name": "Joy",
            "email": "Joy@Ward.test",
            "password": "pokemon",
        }))
        .unwrap();

        assert_eq!(account.role, Role::Nurse);
        assert_eq!(account.email.as_str(), "joy@ward.test");
        assert_eq!(account.name.as_deref(), Some("Joy"));
        assert_eq!(account.specialty, None);
    }

    #[test]
    fn test_registration_required_fields() {
        let detail = bad_request_detail(parse_registration(&json!({ "password": "x" })).unwrap_err());
        assert_eq!(detail, "Account validation failed: email is required");

        let detail =
            bad_request_detail(parse_registration(&json!({ "email": "a@ward.test" })).unwrap_err());
        assert_eq!(detail, "Account validation failed: password is required");
    }

    #[test]
    fn test_registration_rejects_unknown_role() {
        let detail = bad_request_detail(
            parse_registration(&json!({
                "email": "a@ward.test",
                "password": "x",
                "role": "SURGEON",
            }))
            .unwrap_err(),
        );
        assert!(detail.contains("ADMIN, DOCTOR, NURSE"), "{detail}");
    }

    #[test]
    fn test_admission_fields() {
        let doctor = AccountId::new();
        let patient = parse_admission(json!({
            "name": "John Doe",
            "age": 67,
            "gender": "M",
            "diagnosis": "COPD exacerbation",
            "status": "Critical",
            "assignedDoctorId": doctor.to_string(),
            "bedId": "R10-B4",
            "assignedBedId": "ignored",
        }))
        .unwrap();

        assert_eq!(patient.status, PatientStatus::Critical);
        assert_eq!(patient.bed_id, Some(BedId::new("R10-B4")));
        assert_eq!(patient.assigned_doctor_id, Some(doctor));
        assert_eq!(patient.age, Some(67));
        assert!(patient.admission_date.is_none());
    }

    #[test]
    fn test_admission_blank_references() {
        let patient = parse_admission(json!({ "bedId": " ", "assignedDoctorId": "" })).unwrap();
        assert_eq!(patient.bed_id, None);
        assert_eq!(patient.assigned_doctor_id, None);
        assert_eq!(patient.status, PatientStatus::Stable);
    }

    #[test]
    fn test_admission_rejects_invalid_payloads() {
        assert!(parse_admission(json!({ "age": -3 })).is_err());
        assert!(parse_admission(json!({ "status": "Discharged" })).is_err());
        assert!(parse_admission(json!({ "status": "Dead" })).is_err());
        assert!(parse_admission(json!({ "assignedDoctorId": "dr-house" })).is_err());
        assert!(parse_admission(json!({ "name": "<img src=x>" })).is_err());
    }

    #[test]
    fn test_text_errors_explain_the_cause() {
        let detail = bad_request_detail(parse_admission(json!({ "name": "<b>John</b>" })).unwrap_err());
        assert!(detail.starts_with("Patient validation failed: name is invalid"), "{detail}");
        assert!(detail.ends_with("content cannot contain HTML"), "{detail}");

        let detail = bad_request_detail(
            parse_registration(&json!({
                "email": "joy@ward.test",
                "password": "pokemon",
                "specialty": "a".repeat(MAX_SHORT_CONTENT_LENGTH + 1),
            }))
            .unwrap_err(),
        );
        assert!(detail.contains("specialty is invalid"), "{detail}");
        assert!(detail.contains("exceeds maximum length"), "{detail}");
    }

    #[test]
    fn test_vital_requires_bed() {
        assert!(parse_vital(json!({ "heartRate": 80 })).is_err());

        let vital = parse_vital(json!({ "bedId": "R209-B2", "heartRate": 80, "spo2": 98.5 })).unwrap();
        assert_eq!(vital.bed_id, BedId::new("R209-B2"));
        assert_eq!(vital.heart_rate, Some(80.0));
        assert_eq!(vital.temperature, None);
    }

    #[test]
    fn test_discharge_requires_bed() {
        assert!(parse_discharge(&json!({})).is_err());
        assert!(parse_discharge(&json!({ "bedId": "" })).is_err());
        assert_eq!(parse_discharge(&json!({ "bedId": "R10-B1" })).unwrap(), BedId::new("R10-B1"));
    }

    #[test]
    fn test_latest_vital_serialization() {
        assert_eq!(serde_json::to_value(LatestVital(None)).unwrap(), json!({}));

        let reading = VitalReading {
            id: VitalId::new(),
            bed_id: BedId::new("R10-B1"),
            heart_rate: Some(72.0),
            spo2: None,
            temperature: Some(37.2),
            respiration: None,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(LatestVital(Some(reading))).unwrap();
        assert_eq!(json["bedId"], "R10-B1");
        assert_eq!(json["heartRate"], 72.0);
        assert!(json.get("spo2").is_none());
    }

    #[test]
    fn test_patient_detail_is_flat() {
        let detail = PatientDetail {
            patient: Patient {
                id: PatientId::new(),
                name: Some("Jane".into()),
                age: None,
                gender: None,
                diagnosis: None,
                status: PatientStatus::Stable,
                admission_date: Utc::now(),
                assigned_bed_id: None,
                assigned_doctor_id: None,
            },
            vitals: LatestVital(None),
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["name"], "Jane");
        assert_eq!(json["status"], "Stable");
        assert_eq!(json["vitals"], json!({}));
        assert!(json["assignedBedId"].is_null());
    }

    #[test]
    fn test_account_view_hides_password() {
        let view = AccountView::from(Account {
            id: AccountId::new(),
            name: None,
            email: "a@ward.test".into(),
            password: "hunter2".into(),
            role: Role::Admin,
            specialty: None,
        });
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "ADMIN");
    }
}
