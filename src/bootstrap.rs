//! Initialisation au démarrage: inventaire des lits et présence d'un admin.
//!
//! Chaque étape est indépendante et ne fait jamais échouer le démarrage. Relancer
//! l'initialisation sur un stockage déjà initialisé ne change rien.

use log::{debug, error, info, warn};

use crate::consts::{BEDS_PER_ROOM, WARD_ROOMS};
use crate::database::{Store, StoreError};
use crate::models::{Bed, Role};

pub async fn initialize(store: &Store) {
    match seed_beds(store).await {
        Ok(0) => debug!("Bed inventory already present"),
        Ok(created) => info!("Created {} beds for rooms {}", created, WARD_ROOMS.join(", ")),
        Err(e) => error!("Bed initialization failed: {}", e),
    }

    if !admin_exists(store).await {
        warn!("No admin account found. Create one via POST /users/register");
    }
}

/// L'inventaire fixe: `BEDS_PER_ROOM` lits libres par chambre.
pub fn bed_inventory() -> Vec<Bed> {
    WARD_ROOMS
        .iter()
        .flat_map(|room| (1..=BEDS_PER_ROOM).map(move |number| Bed::vacant(room, number)))
        .collect()
}

/// Crée l'inventaire si aucun lit n'existe. Retourne le nombre de lits créés.
pub async fn seed_beds(store: &Store) -> Result<usize, StoreError> {
    if store.read().await.bed_count() > 0 {
        return Ok(0);
    }

    info!("Initializing beds...");
    store
        .write(|db| {
            // Un autre démarrage a pu passer entre-temps
            if db.bed_count() > 0 {
                return Ok(0);
            }
            db.insert_beds(bed_inventory())
        })
        .await
}

pub async fn admin_exists(store: &Store) -> bool {
    store.read().await.has_role(Role::Admin)
}
