// ============================================================================
// API Client : CoinGecko
// ============================================================================
// Récupère les listes de marché (par segment) et les séries de prix
//
// CONCEPTS RUST AVANCÉS :
// 1. async/await : requêtes HTTP non-bloquantes
// 2. Serde : désérialisation JSON vers des structures privées, puis
//    conversion vers nos modèles (CoinSnapshot, PricePoint)
// 3. Erreurs typées : chaque échec est traduit en FetchError
// ============================================================================

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use crate::api::{ChartRequest, MarketDataSource};
use crate::config::Config;
use crate::error::{FetchError, NetworkFailure, DEFAULT_RETRY_AFTER};
use crate::models::{CoinSnapshot, PricePoint, Segment};

// ============================================================================
// Structures pour parser les réponses JSON de CoinGecko
// ============================================================================
// Tous les champs numériques sont optionnels : CoinGecko renvoie parfois null
// pour les petits coins, on les ramène à 0 à la conversion
// ============================================================================

/// Une entrée de /coins/markets
#[derive(Debug, Deserialize)]
struct MarketEntry {
    id: String,
    name: String,
    symbol: Option<String>,
    image: Option<String>,
    current_price: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    market_cap: Option<f64>,
    total_volume: Option<f64>,
    sparkline_in_7d: Option<Sparkline>,
}

#[derive(Debug, Deserialize)]
struct Sparkline {
    #[serde(default)]
    price: Vec<f64>,
}

/// Réponse de /coins/{id}/market_chart
///
/// Les points sont des paires [timestamp_ms, prix], gardées en Value pour
/// ignorer les entrées mal formées au lieu d'échouer
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Option<Vec<serde_json::Value>>,
}

// ============================================================================
// Client
// ============================================================================

/// Client HTTP CoinGecko
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: reqwest::Client,
    base_url: String,
    vs_currency: String,
    per_page: u32,
}

impl CoinGeckoClient {
    /// Crée le client à partir de la configuration
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        debug!(base_url = %config.api_base_url, "Creating HTTP client");
        let http = reqwest::Client::builder()
            .user_agent(concat!("coinscope/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            vs_currency: config.vs_currency.clone(),
            per_page: config.per_page,
        })
    }

    /// GET + vérification du statut + parsing JSON
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!(url = %url, "Sending HTTP request to CoinGecko");
        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP transport error");
                NetworkFailure::Transport(e.to_string())
            })?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        check_status(status.as_u16(), retry_after.as_deref())?;

        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "Failed to parse CoinGecko JSON");
            FetchError::from(NetworkFailure::Decode(e.to_string()))
        })
    }
}

#[async_trait]
impl MarketDataSource for CoinGeckoClient {
    /// Récupère un segment du classement par capitalisation
    #[instrument(skip(self))]
    async fn fetch_markets(&self, segment: Segment) -> Result<Vec<CoinSnapshot>, FetchError> {
        let url = build_markets_url(&self.base_url, &self.vs_currency, self.per_page, segment.page());
        let entries: Vec<MarketEntry> = self.get_json(&url).await?;
        let coins = parse_markets(entries);

        info!(coins = coins.len(), "Successfully fetched market segment");
        Ok(coins)
    }

    /// Récupère la série de prix d'un coin (granularité journalière)
    #[instrument(skip(self, request), fields(coin = %request.coin_id, days = request.range.days()))]
    async fn fetch_market_chart(&self, request: &ChartRequest) -> Result<Vec<PricePoint>, FetchError> {
        // Rejet avant tout appel réseau
        request.validate()?;

        let url = build_chart_url(&self.base_url, request);
        let response: MarketChartResponse = self.get_json(&url).await?;
        let points = parse_chart(response);

        info!(points = points.len(), "Successfully fetched market chart");
        Ok(points)
    }
}

// ============================================================================
// Fonctions utilitaires (pures, testables sans réseau)
// ============================================================================

/// Construit l'URL de /coins/markets pour une page du classement
fn build_markets_url(base: &str, vs_currency: &str, per_page: u32, page: u32) -> String {
    format!(
        "{}/coins/markets?vs_currency={}&order=market_cap_desc&per_page={}&page={}&sparkline=true&price_change_percentage=24h",
        base, vs_currency, per_page, page
    )
}

/// Construit l'URL de /coins/{id}/market_chart
///
/// Toujours en granularité journalière : l'horaire déclenche vite le 429
fn build_chart_url(base: &str, request: &ChartRequest) -> String {
    format!(
        "{}/coins/{}/market_chart?vs_currency={}&days={}&interval=daily",
        base,
        urlencoding::encode(&request.coin_id),
        request.vs_currency,
        request.range.days()
    )
}

/// Traduit un statut HTTP en erreur
///
/// - 2xx : Ok
/// - 429 : RateLimited (Retry-After en secondes si fourni)
/// - 401 : Unauthorized
/// - autre : Status(code)
fn check_status(status: u16, retry_after: Option<&str>) -> Result<(), FetchError> {
    match status {
        200..=299 => Ok(()),
        429 => {
            let retry_after = retry_after
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_RETRY_AFTER);
            warn!(retry_after_secs = retry_after.as_secs(), "CoinGecko rate limit hit");
            Err(FetchError::RateLimited { retry_after })
        }
        401 => {
            error!("CoinGecko rejected the request (401)");
            Err(NetworkFailure::Unauthorized.into())
        }
        other => {
            error!(status = other, "CoinGecko returned error status");
            Err(NetworkFailure::Status(other).into())
        }
    }
}

/// Convertit les entrées markets en snapshots
///
/// Les valeurs manquantes valent 0, le symbole est mis en majuscules
fn parse_markets(entries: Vec<MarketEntry>) -> Vec<CoinSnapshot> {
    entries
        .into_iter()
        .map(|entry| CoinSnapshot {
            id: entry.id,
            name: entry.name,
            symbol: entry.symbol.unwrap_or_default().to_uppercase(),
            image: entry.image,
            price: entry.current_price.unwrap_or(0.0),
            change_24h: entry.price_change_percentage_24h.unwrap_or(0.0),
            market_cap: entry.market_cap.unwrap_or(0.0),
            volume_24h: entry.total_volume.unwrap_or(0.0),
            sparkline: entry.sparkline_in_7d.map(|s| s.price).unwrap_or_default(),
        })
        .collect()
}

/// Convertit les paires [t, v] en série croissante à timestamps uniques
fn parse_chart(response: MarketChartResponse) -> Vec<PricePoint> {
    let raw = response.prices.unwrap_or_default();
    let total = raw.len();

    let mut points: Vec<PricePoint> = raw
        .iter()
        .filter_map(|pair| {
            let pair = pair.as_array()?;
            if pair.len() < 2 {
                return None;
            }
            let t = pair[0].as_f64()?;
            let v = pair[1].as_f64()?;
            Some(PricePoint::new(t as i64, v))
        })
        .collect();

    if points.len() < total {
        warn!(skipped = total - points.len(), total, "Skipped malformed chart points");
    }

    // Tri stable puis fusion des timestamps identiques (le dernier gagne)
    points.sort_by_key(|p| p.t);
    let mut unique: Vec<PricePoint> = Vec::with_capacity(points.len());
    for point in points {
        match unique.last_mut() {
            Some(last) if last.t == point.t => *last = point,
            _ => unique.push(point),
        }
    }
    unique
}

// ============================================================================
// Tests unitaires
// ============================================================================
