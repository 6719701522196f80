// ============================================================================
// Stockage clé → liste de chaînes
// ============================================================================
// Persistance de la watchlist : une seule entrée "watchlistIds", lue au
// démarrage et réécrite à chaque modification
//
// Format du fichier JSON : { "watchlistIds": ["bitcoin", "solana"] }
// ============================================================================

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::models::WatchlistSet;

/// Clé de la watchlist dans le stockage
pub const WATCHLIST_KEY: &str = "watchlistIds";

/// Stockage externe clé → liste ordonnée de chaînes
pub trait KeyValueStore: Send {
    /// Lit une entrée (None si absente)
    fn read_list(&self, key: &str) -> Result<Option<Vec<String>>>;

    /// Écrit une entrée (remplace la valeur précédente)
    fn write_list(&mut self, key: &str, values: &[String]) -> Result<()>;
}

// ============================================================================
// Implémentation fichier JSON
// ============================================================================

/// Stockage dans un fichier JSON unique
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lit toutes les entrées
    ///
    /// Fichier absent ou corrompu : vide (un warning est loggé si corrompu)
    fn read_all(&self) -> BTreeMap<String, Vec<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "Corrupt store file, ignoring");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn read_list(&self, key: &str) -> Result<Option<Vec<String>>> {
        Ok(self.read_all().remove(key))
    }

    fn write_list(&mut self, key: &str, values: &[String]) -> Result<()> {
        let mut entries = self.read_all();
        entries.insert(key.to_string(), values.to_vec());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .context("Échec de la création du répertoire de stockage")?;
        }
        let json = serde_json::to_string_pretty(&entries)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Échec de l'écriture de {}", self.path.display()))?;

        debug!(path = %self.path.display(), key, count = values.len(), "Store entry written");
        Ok(())
    }
}

// ============================================================================
// Implémentation mémoire (tests, ou repli si le disque est indisponible)
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read_list(&self, key: &str) -> Result<Option<Vec<String>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write_list(&mut self, key: &str, values: &[String]) -> Result<()> {
        self.entries.insert(key.to_string(), values.to_vec());
        Ok(())
    }
}

// ============================================================================
// Helpers watchlist
// ============================================================================

/// Lit la watchlist persistée (vide si absente ou illisible)
pub fn load_watchlist(store: &dyn KeyValueStore) -> WatchlistSet {
    match store.read_list(WATCHLIST_KEY) {
        Ok(Some(ids)) => WatchlistSet::from_ids(ids),
        Ok(None) => WatchlistSet::new(),
        Err(e) => {
            warn!(error = ?e, "Failed to read watchlist, starting empty");
            WatchlistSet::new()
        }
    }
}

/// Persiste la watchlist
pub fn save_watchlist(store: &mut dyn KeyValueStore, ids: &[String]) -> Result<()> {
    store.write_list(WATCHLIST_KEY, ids)
}

// ============================================================================
// Tests unitaires
// ============================================================================
