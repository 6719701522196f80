// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod compare;    // Écran de comparaison (graphique %)
pub mod dashboard;  // Layout, header, table Markets, footer
pub mod events;     // Gestion des événements clavier
pub mod exit_plan;  // Écran du plan de sortie
pub mod format;     // Formatage des montants et pourcentages

// Re-exports pour simplifier les imports
pub use dashboard::render;
pub use events::{Event, EventHandler};
