// ============================================================================
// Configuration
// ============================================================================
// Paramètres de l'application, chargés depuis un fichier TOML optionnel
//
// Ordre de résolution :
// 1. --config <chemin> (CLI)
// 2. <config_dir>/coinscope/config.toml s'il existe
// 3. Valeurs par défaut
//
// Les flags CLI (--vs-currency, --log-dir) écrasent ensuite le fichier
// ============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::ChartRange;

/// Nom du dossier applicatif (config, données, logs)
pub const APP_DIR: &str = "coinscope";

/// Configuration de l'application
///
/// CONCEPT SERDE : #[serde(default)]
/// - Chaque champ absent du fichier prend la valeur de Config::default()
/// - Un fichier vide est donc une configuration valide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL de base de l'API de marché
    pub api_base_url: String,

    /// Devise de cotation (ex: "usd", "eur")
    pub vs_currency: String,

    /// Nombre de coins par segment
    pub per_page: u32,

    /// Timeout des requêtes HTTP, en secondes
    pub request_timeout_secs: u64,

    /// Période affichée par défaut dans la comparaison
    pub default_chart_range: ChartRange,

    /// Fichier JSON de la watchlist (défaut : <data_dir>/coinscope/store.json)
    pub watchlist_path: Option<PathBuf>,

    /// Répertoire des logs (défaut : <data_dir>/coinscope/logs)
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.coingecko.com/api/v3".to_string(),
            vs_currency: "usd".to_string(),
            per_page: 100,
            request_timeout_secs: 20,
            default_chart_range: ChartRange::Year,
            watchlist_path: None,
            log_dir: None,
        }
    }
}

impl Config {
    /// Charge la configuration
    ///
    /// - `path` fourni : le fichier doit exister et être valide
    /// - sinon : fichier par défaut s'il existe, valeurs par défaut sinon
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Parse un fichier TOML
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire la configuration {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Configuration invalide dans {}", path.display()))?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Chemin effectif du fichier de stockage de la watchlist
    pub fn watchlist_path(&self) -> PathBuf {
        self.watchlist_path
            .clone()
            .unwrap_or_else(|| data_dir().join("store.json"))
    }

    /// Répertoire effectif des logs
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| data_dir().join("logs"))
    }
}

/// Emplacement du fichier de config par défaut
///
/// - Linux : ~/.config/coinscope/config.toml
/// - macOS : ~/Library/Application Support/coinscope/config.toml
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// Répertoire de données (~/.local/share/coinscope sous Linux, ./ en repli)
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file() {
        let config: Config = toml::from_str(
            r#"
            vs_currency = "eur"
            default_chart_range = "month"
            "#,
        )
        .unwrap();
        assert_eq!(config.vs_currency, "eur");
        assert_eq!(config.default_chart_range, ChartRange::Month);
        assert_eq!(config.per_page, 100);
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "per_page = 50").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.per_page, 50);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let result = Config::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_paths_win() {
        let config = Config {
            watchlist_path: Some(PathBuf::from("/tmp/w.json")),
            ..Config::default()
        };
        assert_eq!(config.watchlist_path(), PathBuf::from("/tmp/w.json"));
    }
}
