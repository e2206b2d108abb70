//! Modèle de données du service: comptes du personnel, patients, lits et
//! relevés de constantes vitales.
//!
//! Les références entre documents (lit d'un patient, médecin assigné, patient
//! d'un lit) sont de simples identifiants typés, sans contrainte d'intégrité
//! côté stockage.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum_macros::{EnumIter, EnumString};
use uuid::Uuid;

/// Rôle d'un compte: Admin, Médecin ou Infirmier
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, EnumString, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Role {
    #[display("ADMIN")]
    Admin,
    #[display("DOCTOR")]
    Doctor,
    #[default]
    #[display("NURSE")]
    Nurse,
}

/// État clinique d'un patient. `Discharged` est terminal.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum PatientStatus {
    #[default]
    Stable,
    Critical,
    Discharged,
}

/// Un identifiant unique de compte.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Display,
)]
pub struct AccountId(Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Un identifiant unique de patient.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Display,
)]
pub struct PatientId(Uuid);

impl PatientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FromStr for PatientId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Un identifiant unique de relevé de constantes.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Display,
)]
pub struct VitalId(Uuid);

impl VitalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Identifiant stable d'un lit, de la forme `R{chambre}-B{numéro}`.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Display)]
pub struct BedId(String);

impl BedId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn for_slot(room: &str, number: u32) -> Self {
        Self(format!("R{room}-B{number}"))
    }
}

/// Un compte du personnel.
///
/// Le mot de passe est conservé tel quel: aucune dérivation n'est faite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: AccountId,
    pub name: Option<String>,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub specialty: Option<String>,
}

/// Un patient admis dans le service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(rename = "_id")]
    pub id: PatientId,
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub diagnosis: Option<String>,
    pub status: PatientStatus,
    pub admission_date: DateTime<Utc>,
    pub assigned_bed_id: Option<BedId>,
    pub assigned_doctor_id: Option<AccountId>,
}

impl Patient {
    /// Passe le patient à l'état `Discharged` et le détache de son lit.
    pub fn discharge(&mut self) {
        self.status = PatientStatus::Discharged;
        self.assigned_bed_id = None;
    }
}

/// Un lit d'une chambre du service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bed {
    pub bed_id: BedId,
    pub room_number: String,
    pub bed_number: u32,
    pub is_occupied: bool,
    pub current_patient_id: Option<PatientId>,
}

impl Bed {
    pub fn vacant(room: &str, number: u32) -> Self {
        Self {
            bed_id: BedId::for_slot(room, number),
            room_number: room.to_string(),
            bed_number: number,
            is_occupied: false,
            current_patient_id: None,
        }
    }

    /// Occupation et référence patient vont toujours de pair.
    pub fn occupy(&mut self, patient: PatientId) {
        self.is_occupied = true;
        self.current_patient_id = Some(patient);
    }

    pub fn release(&mut self) {
        self.is_occupied = false;
        self.current_patient_id = None;
    }
}

/// Un relevé de constantes vitales pour un lit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VitalReading {
    #[serde(rename = "_id")]
    pub id: VitalId,
    pub bed_id: BedId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spo2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respiration: Option<f64>,
    pub timestamp: DateTime<Utc>,
}
