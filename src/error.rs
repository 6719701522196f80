// ============================================================================
// Erreurs de fetch
// ============================================================================
// Taxonomie des erreurs remontées par la source de données de marché
//
// CONCEPTS RUST :
// 1. thiserror : #[error("...")] génère l'implémentation de Display
// 2. Clone : un fetch coalescé partage le même résultat (Ok ou Err) entre
//    tous les appelants en attente, l'erreur doit donc être clonable
//    (reqwest::Error ne l'est pas, on garde son message)
// ============================================================================

use std::time::Duration;

use thiserror::Error;

/// Délai suggéré quand l'API ne fournit pas d'en-tête Retry-After
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Échec réseau générique (tout ce qui n'est pas un succès HTTP)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkFailure {
    /// HTTP 401 : requête bloquée par le fournisseur
    #[error("Requête refusée par le fournisseur (401).")]
    Unauthorized,

    /// Autre statut HTTP hors 2xx
    #[error("Le fournisseur a retourné une erreur : HTTP {0}")]
    Status(u16),

    /// Erreur de transport (DNS, TLS, timeout, connexion coupée...)
    #[error("Échec de la requête HTTP : {0}")]
    Transport(String),

    /// Corps de réponse illisible
    #[error("Réponse illisible : {0}")]
    Decode(String),
}

/// Erreur d'un fetch (snapshot de segment ou série de prix)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// HTTP 429, avec un délai de nouvelle tentative indicatif
    #[error("Limite de requêtes atteinte (429). Réessayez dans ~{} secondes.", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// Toute autre erreur réseau ou HTTP
    #[error(transparent)]
    Network(#[from] NetworkFailure),

    /// Paramètre manquant, rejeté avant tout appel réseau
    #[error("Paramètre manquant : {0}")]
    MissingInput(&'static str),
}

impl FetchError {
    /// Message destiné à l'utilisateur (affiché en ligne jusqu'au prochain succès)
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Vrai pour les erreurs survenues côté réseau (429 inclus)
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. } | FetchError::Network(_))
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
