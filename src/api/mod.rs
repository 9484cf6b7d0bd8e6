// ============================================================================
// Module : api
// ============================================================================
// Sources de données : l'API HTTP distante et les fixtures JSON locales
// ============================================================================

pub mod client;   // Client HTTP de l'API CAC40
pub mod fixtures; // Fichiers JSON statiques de secours

// Re-export des types principaux
pub use client::ApiClient;
pub use fixtures::Fixtures;
