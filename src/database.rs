//! Stockage documentaire du service: comptes, patients, lits et constantes.
//!
//! Les collections sont gardées en mémoire derrière un verrou et sauvegardées
//! en YAML après chaque écriture validée. Toute écriture passe par une
//! [`Transaction`]: les modifications sont appliquées en place et notées dans
//! un journal d'annulation. Une transaction abandonnée (non validée, ou dont
//! la sauvegarde échoue) est défaite à partir de ce journal et ne laisse
//! aucune trace.

use std::{
    collections::HashMap,
    io::ErrorKind::NotFound,
    ops::{Deref, DerefMut},
    path::{Path, PathBuf},
    sync::Arc,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{
    fs,
    sync::{OwnedRwLockWriteGuard, RwLock, RwLockReadGuard},
};

use crate::models::{Account, Bed, BedId, Patient, VitalReading};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate key in {collection}: {field} {value:?} already exists")]
    DuplicateKey {
        collection: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("Failed to persist the store: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize the store: {0}")]
    Serialization(#[from] serde_yaml::Error),
}

/// Une modification à défaire si la transaction est abandonnée.
enum Undo {
    AccountInserted,
    AccountRemoved(usize, Account),
    BedsInserted(usize),
    BedUpdated(usize, Bed),
    PatientInserted,
    PatientUpdated(usize, Patient),
    VitalInserted {
        bed: BedId,
        previous_latest: Option<usize>,
    },
}

/// Le contenu complet du stockage.
#[derive(Default, Serialize, Deserialize)]
pub struct Collections {
    #[serde(default)]
    accounts: Vec<Account>,
    #[serde(default)]
    patients: Vec<Patient>,
    #[serde(default)]
    beds: Vec<Bed>,
    #[serde(default)]
    vitals: Vec<VitalReading>,

    /// Position du relevé le plus récent de chaque lit dans `vitals`
    #[serde(skip)]
    latest_vitals: HashMap<BedId, usize>,
    #[serde(skip)]
    journal: Vec<Undo>,
}

impl Collections {
    /// Défait les modifications du journal, de la plus récente à la plus ancienne.
    fn rollback(&mut self) {
        while let Some(undo) = self.journal.pop() {
            match undo {
                Undo::AccountInserted => {
                    self.accounts.pop();
                }
                Undo::AccountRemoved(index, account) => self.accounts.insert(index, account),
                Undo::BedsInserted(count) => {
                    self.beds.truncate(self.beds.len() - count);
                }
                Undo::BedUpdated(index, bed) => self.beds[index] = bed,
                Undo::PatientInserted => {
                    self.patients.pop();
                }
                Undo::PatientUpdated(index, patient) => self.patients[index] = patient,
                Undo::VitalInserted {
                    bed,
                    previous_latest,
                } => {
                    self.vitals.pop();
                    match previous_latest {
                        Some(index) => self.latest_vitals.insert(bed, index),
                        None => self.latest_vitals.remove(&bed),
                    };
                }
            }
        }
    }
}

/// Poignée partagée sur le stockage.
#[derive(Clone)]
pub struct Store {
    state: Arc<RwLock<Collections>>,
    path: Option<Arc<PathBuf>>,
}

impl Store {
    /// Stockage volatil, sans fichier de sauvegarde
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(RwLock::new(Collections::default())),
            path: None,
        }
    }

    /// Ouvre le stockage sauvegardé dans `path`, ou le crée s'il n'existe pas.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut collections: Collections = match fs::read_to_string(&path).await {
            Ok(snapshot) => serde_yaml::from_str(&snapshot)?,

            // Fichier non existant, on part d'un stockage vide
            Err(not_found) if not_found.kind() == NotFound => {
                info!("Store snapshot {} not found, creating an empty store", path.display());
                let empty = Collections::default();
                save(&empty, &path).await?;
                empty
            }

            Err(other) => return Err(other.into()),
        };
        collections.index_vitals();

        Ok(Self {
            state: Arc::new(RwLock::new(collections)),
            path: Some(Arc::new(path)),
        })
    }

    /// Accès en lecture. Les écritures en cours ne sont jamais visibles.
    pub async fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.state.read().await
    }

    /// Démarre une transaction. Les écrivains sont sérialisés, et les
    /// lecteurs attendent, jusqu'au `commit` ou à l'abandon de la transaction.
    pub async fn begin(&self) -> Transaction {
        Transaction {
            guard: self.state.clone().write_owned().await,
            path: self.path.clone(),
        }
    }

    /// Écriture simple: une transaction d'une seule opération.
    pub async fn write<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Collections) -> Result<T, StoreError>,
    {
        let mut tx = self.begin().await;
        let out = op(&mut *tx)?;
        tx.commit().await?;
        Ok(out)
    }

    /// Réécrit la sauvegarde avec l'état courant.
    pub async fn flush(&self) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            let state = self.state.read().await;
            save(&state, path).await?;
        }
        Ok(())
    }
}

/// Une transaction ouverte sur le stockage.
///
/// Se manipule comme des [`Collections`]. Sans appel réussi à
/// [`Transaction::commit`], ses modifications sont défaites quand elle est
/// libérée.
pub struct Transaction {
    guard: OwnedRwLockWriteGuard<Collections>,
    path: Option<Arc<PathBuf>>,
}

impl Transaction {
    /// Valide les modifications. La sauvegarde est écrite d'abord: en cas
    /// d'échec, la transaction est abandonnée.
    pub async fn commit(mut self) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            save(&self.guard, path).await?;
        }
        self.guard.journal.clear();
        debug!("Transaction committed");
        Ok(())
    }
}

impl Deref for Transaction {
    type Target = Collections;

    fn deref(&self) -> &Collections {
        &self.guard
    }
}

impl DerefMut for Transaction {
    fn deref_mut(&mut self) -> &mut Collections {
        &mut self.guard
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.guard.journal.is_empty() {
            debug!(
                "Transaction aborted, undoing {} change(s)",
                self.guard.journal.len()
            );
            self.guard.rollback();
        }
    }
}

// Gestion des comptes
pub mod account {
    use super::*;
    use crate::models::{AccountId, Role};

    impl Collections {
        /// L'email est une clé unique.
        pub fn insert_account(&mut self, account: Account) -> Result<&Account, StoreError> {
            if self.accounts.iter().any(|a| a.email == account.email) {
                return Err(StoreError::DuplicateKey {
                    collection: "accounts",
                    field: "email",
                    value: account.email,
                });
            }

            self.accounts.push(account);
            self.journal.push(Undo::AccountInserted);
            Ok(&self.accounts[self.accounts.len() - 1])
        }

        pub fn accounts(&self) -> &[Account] {
            &self.accounts
        }

        pub fn find_account_by_credentials(&self, email: &str, password: &str) -> Option<&Account> {
            self.accounts
                .iter()
                .find(|a| a.email == email && a.password == password)
        }

        pub fn has_role(&self, role: Role) -> bool {
            self.accounts.iter().any(|a| a.role == role)
        }

        /// Retourne le nombre de comptes supprimés.
        pub fn delete_account(&mut self, id: AccountId) -> usize {
            let Some(index) = self.accounts.iter().position(|a| a.id == id) else {
                return 0;
            };

            let removed = self.accounts.remove(index);
            self.journal.push(Undo::AccountRemoved(index, removed));
            1
        }
    }
}

// Gestion des lits
pub mod bed {
    use super::*;
    use std::collections::HashSet;

    impl Collections {
        pub fn bed_count(&self) -> usize {
            self.beds.len()
        }

        /// Insertion groupée. L'identifiant de lit est une clé unique, y
        /// compris au sein du lot.
        pub fn insert_beds(&mut self, beds: Vec<Bed>) -> Result<usize, StoreError> {
            let mut seen: HashSet<&BedId> = self.beds.iter().map(|b| &b.bed_id).collect();
            for bed in &beds {
                if !seen.insert(&bed.bed_id) {
                    return Err(StoreError::DuplicateKey {
                        collection: "beds",
                        field: "bedId",
                        value: bed.bed_id.to_string(),
                    });
                }
            }

            let inserted = beds.len();
            self.beds.extend(beds);
            self.journal.push(Undo::BedsInserted(inserted));
            Ok(inserted)
        }

        /// Tous les lits, triés par chambre puis par numéro de lit.
        pub fn beds_sorted(&self) -> Vec<&Bed> {
            let mut beds: Vec<&Bed> = self.beds.iter().collect();
            beds.sort_by(|a, b| {
                a.room_number
                    .cmp(&b.room_number)
                    .then(a.bed_number.cmp(&b.bed_number))
            });
            beds
        }

        pub fn find_bed(&self, id: &BedId) -> Option<&Bed> {
            self.beds.iter().find(|b| &b.bed_id == id)
        }

        /// Applique `update` au lit `id`. Retourne le nombre de lits modifiés
        /// (0 si aucun lit ne correspond).
        pub fn update_bed(&mut self, id: &BedId, update: impl FnOnce(&mut Bed)) -> usize {
            let Some(index) = self.beds.iter().position(|b| &b.bed_id == id) else {
                return 0;
            };

            self.journal.push(Undo::BedUpdated(index, self.beds[index].clone()));
            update(&mut self.beds[index]);
            1
        }
    }
}

// Gestion des patients
pub mod patient {
    use super::*;
    use crate::models::PatientId;

    impl Collections {
        pub fn patients(&self) -> &[Patient] {
            &self.patients
        }

        pub fn find_patient(&self, id: PatientId) -> Option<&Patient> {
            self.patients.iter().find(|p| p.id == id)
        }

        pub fn insert_patient(&mut self, patient: Patient) -> &Patient {
            self.patients.push(patient);
            self.journal.push(Undo::PatientInserted);
            &self.patients[self.patients.len() - 1]
        }

        pub fn update_patient(&mut self, id: PatientId, update: impl FnOnce(&mut Patient)) -> usize {
            let Some(index) = self.patients.iter().position(|p| p.id == id) else {
                return 0;
            };

            self.journal
                .push(Undo::PatientUpdated(index, self.patients[index].clone()));
            update(&mut self.patients[index]);
            1
        }
    }
}

// Gestion des relevés de constantes
pub mod vital {
    use super::*;

    /// Le relevé remplace-t-il le plus récent connu pour son lit ? À
    /// horodatage égal, le dernier inséré l'emporte.
    fn supersedes(
        vitals: &[VitalReading],
        latest: &HashMap<BedId, usize>,
        reading: &VitalReading,
    ) -> bool {
        latest
            .get(&reading.bed_id)
            .map_or(true, |&current| reading.timestamp >= vitals[current].timestamp)
    }

    impl Collections {
        pub fn insert_vital(&mut self, reading: VitalReading) -> &VitalReading {
            let index = self.vitals.len();
            let previous_latest = self.latest_vitals.get(&reading.bed_id).copied();

            if supersedes(&self.vitals, &self.latest_vitals, &reading) {
                self.latest_vitals.insert(reading.bed_id.clone(), index);
            }
            self.journal.push(Undo::VitalInserted {
                bed: reading.bed_id.clone(),
                previous_latest,
            });

            self.vitals.push(reading);
            &self.vitals[index]
        }

        /// Le relevé le plus récent pour ce lit.
        pub fn latest_vital(&self, bed: &BedId) -> Option<&VitalReading> {
            self.latest_vitals.get(bed).map(|&index| &self.vitals[index])
        }

        /// Reconstruit l'index des derniers relevés (après chargement).
        pub(super) fn index_vitals(&mut self) {
            let mut latest = HashMap::new();
            for (index, reading) in self.vitals.iter().enumerate() {
                if supersedes(&self.vitals, &latest, reading) {
                    latest.insert(reading.bed_id.clone(), index);
                }
            }
            self.latest_vitals = latest;
        }
    }
}

/// Sauvegarde YAML, via un fichier temporaire renommé ensuite
async fn save(db: &Collections, path: &Path) -> Result<(), StoreError> {
    let snapshot = serde_yaml::to_string(db)?;

    // Crée le dossier parent s'il n'existe pas
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() {
            fs::create_dir_all(parent_dir).await?;
        }
    }

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, snapshot).await?;
    fs::rename(&tmp_path, path).await?;
    Ok(())
}
