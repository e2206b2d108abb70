//! Logique métier du service: comptes du personnel, admissions, sorties et
//! lectures enrichies. Point d'entrée unique des handlers HTTP vers le
//! stockage.

use chrono::{DateTime, Utc};
use log::{info, warn};
use thiserror::Error;

use crate::database::{Store, StoreError};
use crate::models::{
    Account, AccountId, Bed, BedId, Patient, PatientId, PatientStatus, Role, VitalId, VitalReading,
};
use crate::utils::validation::EmailInput;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Bed {0} is already occupied")]
    BedOccupied(BedId),
}

/// Un compte à créer, avec des champs déjà validés
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: Option<String>,
    pub email: EmailInput,
    pub password: String,
    pub role: Role,
    pub specialty: Option<String>,
}

/// Un patient à admettre, éventuellement dans un lit
#[derive(Debug, Clone, Default)]
pub struct NewPatient {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub diagnosis: Option<String>,
    pub status: PatientStatus,
    pub admission_date: Option<DateTime<Utc>>,
    pub bed_id: Option<BedId>,
    pub assigned_doctor_id: Option<AccountId>,
}

/// Un relevé transmis par un moniteur de chevet
#[derive(Debug, Clone)]
pub struct NewVital {
    pub bed_id: BedId,
    pub heart_rate: Option<f64>,
    pub spo2: Option<f64>,
    pub temperature: Option<f64>,
    pub respiration: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct WardService {
    store: Store,
}

impl WardService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Cherche le compte correspondant exactement à l'email et au mot de passe.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Account, ServiceError> {
        let email = EmailInput::new(email).map_err(|_| ServiceError::InvalidCredentials)?;

        self.store
            .read()
            .await
            .find_account_by_credentials(email.as_str(), password)
            .cloned()
            .ok_or(ServiceError::InvalidCredentials)
    }

    /// Enregistre un nouveau compte. L'unicité de l'email est garantie par le stockage.
    pub async fn register(&self, new: NewAccount) -> Result<Account, ServiceError> {
        let account = Account {
            id: AccountId::new(),
            name: new.name,
            email: new.email.into_string(),
            password: new.password,
            role: new.role,
            specialty: new.specialty,
        };

        let created = self
            .store
            .write(|db| db.insert_account(account).cloned())
            .await?;

        info!("Account {} created for {} ({})", created.id, created.email, created.role);
        Ok(created)
    }

    pub async fn list_accounts(&self) -> Vec<Account> {
        self.store.read().await.accounts().to_vec()
    }

    /// Supprime un compte. Un identifiant inconnu ou mal formé ne supprime rien
    /// et n'est pas une erreur.
    pub async fn delete_account(&self, id: &str) -> Result<(), ServiceError> {
        let Ok(id) = id.parse::<AccountId>() else {
            return Ok(());
        };

        let removed = self.store.write(|db| Ok(db.delete_account(id))).await?;
        if removed > 0 {
            info!("Account {} deleted", id);
        }
        Ok(())
    }

    pub async fn list_beds(&self) -> Vec<Bed> {
        self.store
            .read()
            .await
            .beds_sorted()
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn list_patients(&self) -> Vec<Patient> {
        self.store.read().await.patients().to_vec()
    }

    /// Le patient et le dernier relevé de son lit, s'il en a un.
    pub async fn patient_with_vitals(
        &self,
        id: &str,
    ) -> Result<(Patient, Option<VitalReading>), ServiceError> {
        let id: PatientId = id.parse().map_err(|_| ServiceError::PatientNotFound)?;

        let db = self.store.read().await;
        let patient = db.find_patient(id).cloned().ok_or(ServiceError::PatientNotFound)?;
        let vitals = patient
            .assigned_bed_id
            .as_ref()
            .and_then(|bed| db.latest_vital(bed))
            .cloned();

        Ok((patient, vitals))
    }

    /// Admission: crée le patient et occupe son lit dans une même transaction.
    ///
    /// Un lit déjà occupé fait échouer l'admission. Un lit inexistant n'est
    /// pas une erreur: le patient garde sa référence et aucun lit ne change.
    pub async fn admit(&self, new: NewPatient) -> Result<Patient, ServiceError> {
        let patient = Patient {
            id: PatientId::new(),
            name: new.name,
            age: new.age,
            gender: new.gender,
            diagnosis: new.diagnosis,
            status: new.status,
            admission_date: new.admission_date.unwrap_or_else(Utc::now),
            assigned_bed_id: new.bed_id,
            assigned_doctor_id: new.assigned_doctor_id,
        };

        let mut tx = self.store.begin().await;

        if let Some(bed_id) = &patient.assigned_bed_id {
            if tx.find_bed(bed_id).is_some_and(|bed| bed.is_occupied) {
                warn!("Admission aborted: bed {} is already occupied", bed_id);
                return Err(ServiceError::BedOccupied(bed_id.clone()));
            }
        }

        let patient = tx.insert_patient(patient).clone();

        if let Some(bed_id) = &patient.assigned_bed_id {
            if tx.update_bed(bed_id, |bed| bed.occupy(patient.id)) == 0 {
                warn!(
                    "Bed {} does not exist, patient {} keeps a dangling bed reference",
                    bed_id, patient.id
                );
            }
        }

        if let Err(e) = tx.commit().await {
            warn!("Admission of patient {} aborted: {}", patient.id, e);
            return Err(e.into());
        }

        info!(
            "Patient {} admitted ({})",
            patient.id,
            patient
                .assigned_bed_id
                .as_ref()
                .map_or("no bed".to_string(), |bed| format!("bed {bed}"))
        );
        Ok(patient)
    }

    pub async fn latest_vital(&self, bed: &BedId) -> Option<VitalReading> {
        self.store.read().await.latest_vital(bed).cloned()
    }

    pub async fn record_vital(&self, new: NewVital) -> Result<VitalReading, ServiceError> {
        let reading = VitalReading {
            id: VitalId::new(),
            bed_id: new.bed_id,
            heart_rate: new.heart_rate,
            spo2: new.spo2,
            temperature: new.temperature,
            respiration: new.respiration,
            timestamp: new.timestamp.unwrap_or_else(Utc::now),
        };

        Ok(self
            .store
            .write(|db| Ok(db.insert_vital(reading).clone()))
            .await?)
    }

    /// Sortie: libère le lit et passe son patient à `Discharged`, dans une
    /// même transaction. Retourne le patient sorti, s'il y en avait un.
    pub async fn discharge(&self, bed: &BedId) -> Result<Option<PatientId>, ServiceError> {
        let mut tx = self.store.begin().await;

        let current = tx.find_bed(bed).and_then(|b| b.current_patient_id);
        if let Some(patient) = current {
            tx.update_patient(patient, Patient::discharge);
        }
        let freed = tx.update_bed(bed, Bed::release);

        tx.commit().await?;

        match (freed, current) {
            (0, _) => info!("Discharge requested for unknown bed {}", bed),
            (_, Some(patient)) => info!("Patient {} discharged from bed {}", patient, bed),
            (_, None) => info!("Bed {} released, no patient was assigned", bed),
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap;
    use chrono::Duration;

    async fn seeded_ward() -> WardService {
        let store = Store::in_memory();
        bootstrap::seed_beds(&store).await.unwrap();
        WardService::new(store)
    }

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            name: Some("Nurse Joy".into()),
            email: EmailInput::new(email).unwrap(),
            password: "pokemon".into(),
            role: Role::Nurse,
            specialty: None,
        }
    }

    fn admission(bed: Option<&str>) -> NewPatient {
        NewPatient {
            name: Some("John Doe".into()),
            age: Some(42),
            diagnosis: Some("Pneumonia".into()),
            bed_id: bed.map(BedId::new),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_login_matches_email_and_password() {
        let ward = seeded_ward().await;
        ward.register(new_account("joy@ward.test")).await.unwrap();

        assert!(ward.authenticate("joy@ward.test", "pokemon").await.is_ok());
        assert!(ward.authenticate(" JOY@ward.test", "pokemon").await.is_ok());
        assert!(matches!(
            ward.authenticate("joy@ward.test", "wrong").await,
            Err(ServiceError::InvalidCredentials)
        ));
        assert!(matches!(
            ward.authenticate("", "").await,
            Err(ServiceError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_admission_occupies_bed() {
        let ward = seeded_ward().await;
        let patient = ward.admit(admission(Some("R209-B3"))).await.unwrap();

        assert_eq!(patient.status, PatientStatus::Stable);
        assert_eq!(patient.assigned_bed_id, Some(BedId::new("R209-B3")));

        let db = ward.store.read().await;
        let bed = db.find_bed(&BedId::new("R209-B3")).unwrap();
        assert!(bed.is_occupied);
        assert_eq!(bed.current_patient_id, Some(patient.id));
    }

    #[tokio::test]
    async fn test_admission_into_unknown_bed_keeps_reference() {
        let ward = seeded_ward().await;
        let before = ward.list_beds().await;

        let patient = ward.admit(admission(Some("R999-B1"))).await.unwrap();

        assert_eq!(patient.assigned_bed_id, Some(BedId::new("R999-B1")));
        assert_eq!(ward.list_beds().await, before);
        assert_eq!(ward.list_patients().await.len(), 1);
    }

    #[tokio::test]
    async fn test_admission_into_occupied_bed_is_rolled_back() {
        let ward = seeded_ward().await;
        let first = ward.admit(admission(Some("R10-B1"))).await.unwrap();

        let err = ward.admit(admission(Some("R10-B1"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::BedOccupied(_)));

        let patients = ward.list_patients().await;
        assert_eq!(patients.len(), 1);
        let db = ward.store.read().await;
        let bed = db.find_bed(&BedId::new("R10-B1")).unwrap();
        assert_eq!(bed.current_patient_id, Some(first.id));
    }

    #[tokio::test]
    async fn test_admission_aborted_when_save_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ward.yaml");
        let store = Store::open(&path).await.unwrap();
        bootstrap::seed_beds(&store).await.unwrap();
        let ward = WardService::new(store);

        // Le fichier temporaire de sauvegarde ne peut plus être créé
        std::fs::create_dir(path.with_extension("tmp")).unwrap();

        let err = ward.admit(admission(Some("R209-B4"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::Io(_))));

        assert!(ward.list_patients().await.is_empty());
        let db = ward.store.read().await;
        let bed = db.find_bed(&BedId::new("R209-B4")).unwrap();
        assert!(!bed.is_occupied);
        assert_eq!(bed.current_patient_id, None);
    }

    #[tokio::test]
    async fn test_concurrent_admissions_to_same_bed() {
        let ward = seeded_ward().await;

        let attempts: Vec<_> = (0..8)
            .map(|_| {
                let ward = ward.clone();
                tokio::spawn(async move { ward.admit(admission(Some("R304-B10"))).await })
            })
            .collect();

        let mut admitted = Vec::new();
        for attempt in attempts {
            if let Ok(patient) = attempt.await.unwrap() {
                admitted.push(patient);
            }
        }

        assert_eq!(admitted.len(), 1);
        let db = ward.store.read().await;
        let bed = db.find_bed(&BedId::new("R304-B10")).unwrap();
        assert_eq!(bed.current_patient_id, Some(admitted[0].id));
    }

    #[tokio::test]
    async fn test_discharge_releases_bed_and_patient() {
        let ward = seeded_ward().await;
        let patient = ward.admit(admission(Some("R10-B5"))).await.unwrap();

        let discharged = ward.discharge(&BedId::new("R10-B5")).await.unwrap();
        assert_eq!(discharged, Some(patient.id));

        let db = ward.store.read().await;
        let stored = db.find_patient(patient.id).unwrap();
        assert_eq!(stored.status, PatientStatus::Discharged);
        assert_eq!(stored.assigned_bed_id, None);

        let bed = db.find_bed(&BedId::new("R10-B5")).unwrap();
        assert!(!bed.is_occupied);
        assert_eq!(bed.current_patient_id, None);
    }

    #[tokio::test]
    async fn test_discharge_of_empty_or_unknown_bed() {
        let ward = seeded_ward().await;
        let bystander = ward.admit(admission(Some("R10-B2"))).await.unwrap();

        assert_eq!(ward.discharge(&BedId::new("R10-B1")).await.unwrap(), None);
        assert_eq!(ward.discharge(&BedId::new("R0-B0")).await.unwrap(), None);

        let patients = ward.list_patients().await;
        assert_eq!(patients, vec![bystander]);
    }

    #[tokio::test]
    async fn test_patient_vitals_follow_assigned_bed() {
        let ward = seeded_ward().await;
        let patient = ward.admit(admission(Some("R209-B1"))).await.unwrap();

        let (_, vitals) = ward.patient_with_vitals(&patient.id.to_string()).await.unwrap();
        assert!(vitals.is_none());

        for (minutes_ago, heart_rate) in [(10, 80.0), (1, 95.0), (20, 60.0)] {
            ward.record_vital(NewVital {
                bed_id: BedId::new("R209-B1"),
                heart_rate: Some(heart_rate),
                spo2: Some(97.0),
                temperature: None,
                respiration: None,
                timestamp: Some(Utc::now() - Duration::minutes(minutes_ago)),
            })
            .await
            .unwrap();
        }

        let (_, vitals) = ward.patient_with_vitals(&patient.id.to_string()).await.unwrap();
        assert_eq!(vitals.unwrap().heart_rate, Some(95.0));
    }

    #[tokio::test]
    async fn test_unknown_patient() {
        let ward = seeded_ward().await;
        assert!(matches!(
            ward.patient_with_vitals(&PatientId::new().to_string()).await,
            Err(ServiceError::PatientNotFound)
        ));
        assert!(matches!(
            ward.patient_with_vitals("42").await,
            Err(ServiceError::PatientNotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_account_is_idempotent() {
        let ward = seeded_ward().await;
        let account = ward.register(new_account("joy@ward.test")).await.unwrap();

        ward.delete_account(&account.id.to_string()).await.unwrap();
        ward.delete_account(&account.id.to_string()).await.unwrap();
        ward.delete_account("garbage").await.unwrap();

        assert!(ward.list_accounts().await.is_empty());
    }
}
