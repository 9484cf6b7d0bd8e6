// ============================================================================
// CAC40 Sentiment Dashboard - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;        // Client HTTP et fixtures JSON
pub mod app;        // État de l'application
pub mod config;     // Configuration (variables d'environnement, .env)
pub mod filter;     // Recherche, secteur, performance
pub mod indicators; // Jauges de corrélation et de sentiment, teintes
pub mod loader;     // Chargement avec repli sur fixtures et données générées
pub mod models;     // Structures de données
pub mod series;     // Assemblage des séries du graphique
pub mod synthetic;  // Générateurs seedés de données de secours
pub mod ui;         // Interface utilisateur
