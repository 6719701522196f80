// ============================================================================
// CoinScope - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests d'intégration
// ============================================================================

pub mod api;      // Source de données de marché (CoinGecko)
pub mod app;      // État de la session, actions et effets
pub mod config;   // Configuration TOML
pub mod engine;   // Vues dérivées (cache, tri/filtre, séries, plan de sortie)
pub mod error;    // Erreurs de fetch
pub mod models;   // Structures de données
pub mod store;    // Persistance de la watchlist
pub mod ui;       // Interface utilisateur
pub mod worker;   // Exécution asynchrone des requêtes
