// ============================================================================
// Structure : WatchlistSet
// ============================================================================
// Ensemble des ids de coins suivis par l'utilisateur
//
// CONCEPTS RUST :
// 1. Vec plutôt que HashSet : l'ordre d'ajout est conservé pour la persistance
//    (la clé "watchlistIds" stocke une liste ordonnée)
// 2. Aucun doublon : garanti par toggle() et from_ids()
// ============================================================================

use serde::{Deserialize, Serialize};

/// Watchlist : ids uniques, ordre d'ajout conservé
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistSet {
    ids: Vec<String>,
}

impl WatchlistSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construit depuis une liste persistée (doublons et ids vides ignorés)
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for id in ids {
            let id = id.into();
            if !id.is_empty() && !set.contains(&id) {
                set.ids.push(id);
            }
        }
        set
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|x| x == id)
    }

    /// Ajoute l'id s'il est absent, le retire sinon
    ///
    /// Retourne true si l'id est dans la watchlist après l'appel
    pub fn toggle(&mut self, id: &str) -> bool {
        if let Some(pos) = self.ids.iter().position(|x| x == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id.to_string());
            true
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let mut watchlist = WatchlistSet::new();
        assert!(watchlist.toggle("bitcoin"));
        assert!(watchlist.toggle("solana"));
        assert!(watchlist.contains("bitcoin"));

        assert!(!watchlist.toggle("bitcoin"));
        assert!(!watchlist.contains("bitcoin"));
        assert_eq!(watchlist.ids(), &["solana".to_string()]);
    }

    #[test]
    fn test_from_ids_dedup() {
        let watchlist = WatchlistSet::from_ids(vec!["a", "b", "a", ""]);
        assert_eq!(watchlist.len(), 2);
        assert_eq!(watchlist.ids(), &["a".to_string(), "b".to_string()]);
    }
}
