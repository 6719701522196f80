// ============================================================================
// Module : models
// ============================================================================
// Structures de données de l'application : snapshots de marché, séries de
// prix, sélection de comparaison, watchlist et plan de sortie
// ============================================================================

pub mod coin;        // Snapshots, segments, spécification de tri
pub mod comparison;  // Sélection A/B/C
pub mod exit_plan;   // Plan de take-profit (texte brut saisi)
pub mod series;      // Points de prix, points normalisés, lignes fusionnées
pub mod watchlist;   // Ensemble des ids suivis

// Re-export des structures principales pour simplifier les imports
pub use coin::{CoinSnapshot, Segment, SortDirection, SortField, SortSpec};
pub use comparison::{ComparisonSlot, SlotPosition, SlotRejection};
pub use exit_plan::{ExitPlan, RowField, RowId, TakeProfitRow};
pub use series::{ChartRange, MergedRow, NormalizedPoint, PricePoint};
pub use watchlist::WatchlistSet;
