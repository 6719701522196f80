// ============================================================================
// Module : engine
// ============================================================================
// Vues dérivées : tout ce qui est affiché est recalculé à partir de l'état
// courant et des snapshots en cache, sans modifier les entrées
// ============================================================================

pub mod cache;       // Cache par segment, fetchs coalescés
pub mod exit_plan;   // Calcul du plan de sortie
pub mod generation;  // Tickets anti-réponses périmées
pub mod series;      // Normalisation et fusion des séries
pub mod view;        // Recherche, filtre watchlist, tri

pub use cache::{SlotStatus, SnapshotCache, Snapshots};
pub use exit_plan::{compute, parse_amount, Allocation, ExitReport, ExitSummary, RowOutcome};
pub use generation::{Generations, RequestClass, Ticket};
pub use series::{change_over_period, merge, normalize, SeriesSummary};
pub use view::{base_for_view, compose, find_coin, union_segments};
