// ============================================================================
// Module : api
// ============================================================================
// Source de données de marché : le reste de l'application ne dépend que du
// trait MarketDataSource, l'implémentation CoinGecko est interchangeable
// (les tests utilisent une source simulée)
// ============================================================================

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::{ChartRange, CoinSnapshot, ComparisonSlot, PricePoint, Segment, SlotPosition};

pub mod coingecko; // Client API CoinGecko

pub use coingecko::CoinGeckoClient;

/// Paramètres d'une requête de série de prix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    pub coin_id: String,
    pub range: ChartRange,
    pub vs_currency: String,
}

impl ChartRequest {
    pub fn new(coin_id: &str, range: ChartRange, vs_currency: &str) -> Self {
        Self {
            coin_id: coin_id.trim().to_string(),
            range,
            vs_currency: vs_currency.to_string(),
        }
    }

    /// Rejette la requête avant tout appel réseau si l'id est vide
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.coin_id.trim().is_empty() {
            return Err(FetchError::MissingInput("coin id"));
        }
        Ok(())
    }
}

/// Requêtes de la comparaison (A et B, C optionnel), même période et devise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRequest {
    pub a: ChartRequest,
    pub b: ChartRequest,
    pub c: Option<ChartRequest>,
}

impl ComparisonRequest {
    pub fn from_slots(slots: &ComparisonSlot, range: ChartRange, vs_currency: &str) -> Self {
        let request = |slot| {
            slots
                .get(slot)
                .map(|id| ChartRequest::new(id, range, vs_currency))
        };
        Self {
            a: request(SlotPosition::A).unwrap_or_else(|| ChartRequest::new("", range, vs_currency)),
            b: request(SlotPosition::B).unwrap_or_else(|| ChartRequest::new("", range, vs_currency)),
            c: request(SlotPosition::C),
        }
    }

    /// Requêtes à lancer, dans l'ordre A, B, C
    pub fn requests(&self) -> Vec<&ChartRequest> {
        let mut requests = vec![&self.a, &self.b];
        requests.extend(self.c.as_ref());
        requests
    }
}

/// Séries brutes reçues pour une comparaison
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonSeries {
    pub a: Vec<PricePoint>,
    pub b: Vec<PricePoint>,
    pub c: Option<Vec<PricePoint>>,
}

impl ComparisonSeries {
    pub fn get(&self, slot: SlotPosition) -> Option<&[PricePoint]> {
        match slot {
            SlotPosition::A => Some(&self.a),
            SlotPosition::B => Some(&self.b),
            SlotPosition::C => self.c.as_deref(),
        }
    }
}

/// Contrat de la source de données de marché
///
/// CONCEPT RUST : async_trait
/// - Les méthodes async dans un trait passent par une Future boxée
/// - Send + Sync : la source est partagée entre les tâches du worker
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Liste classée des coins d'un segment
    async fn fetch_markets(&self, segment: Segment) -> Result<Vec<CoinSnapshot>, FetchError>;

    /// Série de prix [timestamp, prix] d'un coin, croissante
    async fn fetch_market_chart(&self, request: &ChartRequest) -> Result<Vec<PricePoint>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_request_validation() {
        let request = ChartRequest::new("  ", ChartRange::Month, "usd");
        assert_eq!(request.validate(), Err(FetchError::MissingInput("coin id")));

        let request = ChartRequest::new("bitcoin", ChartRange::Month, "usd");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_comparison_request_follows_slots() {
        let mut slots = ComparisonSlot::default();
        let request = ComparisonRequest::from_slots(&slots, ChartRange::Week, "eur");
        assert_eq!(request.requests().len(), 2);
        assert_eq!(request.a.coin_id, "bitcoin");
        assert_eq!(request.b.vs_currency, "eur");

        slots.assign(SlotPosition::C, "solana").unwrap();
        let request = ComparisonRequest::from_slots(&slots, ChartRange::Week, "eur");
        let ids: Vec<&str> = request.requests().iter().map(|r| r.coin_id.as_str()).collect();
        assert_eq!(ids, vec!["bitcoin", "ethereum", "solana"]);
    }
}
