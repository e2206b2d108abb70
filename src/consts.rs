//! Définition des constantes globales pour l'application.

pub const DEFAULT_HTTP_PORT: u16 = 8080; // Port par défaut pour le serveur HTTP.
pub const DEFAULT_DATABASE_URL: &str = "./data/ward.yaml"; // Sauvegarde par défaut du stockage.
pub const MEMORY_DATABASE_URL: &str = "memory:"; // Stockage volatil, sans sauvegarde.
pub const WARD_ROOMS: [&str; 3] = ["10", "209", "304"]; // Chambres du service.
pub const BEDS_PER_ROOM: u32 = 10; // Lits numérotés de 1 à 10 dans chaque chambre.
