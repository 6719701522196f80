// ============================================================================
// Cache des snapshots de marché
// ============================================================================
// Un fetch par segment et par fenêtre de cache-miss, jamais plus
//
// CONCEPT : Machine à états par segment
// - Empty   : jamais chargé (absent de la map)
// - Loading : un fetch est en vol, les appelants suivants s'y joignent
// - Loaded  : données disponibles, retournées sans appel réseau
// - Failed  : le dernier fetch a échoué, pas de données partielles
//
// CONCEPT RUST : futures::future::Shared
// - Une Future "partageable" : chaque clone attend le même résultat
// - Le fetch n'est exécuté qu'une seule fois, quel que soit le nombre
//   d'appelants concurrents
// ============================================================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, instrument, warn};

use crate::api::MarketDataSource;
use crate::error::FetchError;
use crate::models::{CoinSnapshot, Segment};

/// Liste partagée (immuable) des coins d'un segment
pub type Snapshots = Arc<Vec<CoinSnapshot>>;

type SharedFetch = Shared<BoxFuture<'static, Result<Snapshots, FetchError>>>;

/// État d'un segment dans le cache
enum SlotState {
    Loading { ticket: u64, fetch: SharedFetch },
    Loaded(Snapshots),
    Failed(FetchError),
}

/// Vue publique de l'état d'un segment
#[derive(Debug, Clone, PartialEq)]
pub enum SlotStatus {
    Empty,
    Loading,
    Loaded(usize),
    Failed(FetchError),
}

/// Cache des segments de marché
pub struct SnapshotCache {
    source: Arc<dyn MarketDataSource>,
    slots: Mutex<HashMap<Segment, SlotState>>,
    next_ticket: Mutex<u64>,
}

impl SnapshotCache {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            source,
            slots: Mutex::new(HashMap::new()),
            next_ticket: Mutex::new(0),
        }
    }

    /// Verrouille la map (un verrou empoisonné est récupéré tel quel :
    /// aucune section critique ne laisse la map dans un état incohérent)
    fn slots(&self) -> MutexGuard<'_, HashMap<Segment, SlotState>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn issue_ticket(&self) -> u64 {
        let mut next = self.next_ticket.lock().unwrap_or_else(PoisonError::into_inner);
        *next += 1;
        *next
    }

    /// Retourne le segment en cache, ou le charge
    ///
    /// - Loaded : retour immédiat, aucun appel réseau
    /// - Loading : on attend le fetch déjà en vol
    /// - Empty / Failed : un nouveau fetch est lancé
    ///
    /// Le cache ne réessaie jamais de lui-même après un échec
    #[instrument(skip(self))]
    pub async fn get_or_fetch(&self, segment: Segment) -> Result<Snapshots, FetchError> {
        // Le verrou est relâché avant le .await (bloc dédié)
        let (ticket, fetch) = {
            let mut slots = self.slots();
            match slots.get(&segment) {
                Some(SlotState::Loaded(coins)) => {
                    debug!(coins = coins.len(), "Cache hit");
                    return Ok(coins.clone());
                }
                Some(SlotState::Loading { ticket, fetch }) => {
                    debug!("Joining in-flight fetch");
                    (*ticket, fetch.clone())
                }
                _ => {
                    let ticket = self.issue_ticket();
                    let source = self.source.clone();
                    let fetch = async move { source.fetch_markets(segment).await.map(Arc::new) }
                        .boxed()
                        .shared();

                    info!(ticket, "Cache miss, fetching segment");
                    slots.insert(
                        segment,
                        SlotState::Loading {
                            ticket,
                            fetch: fetch.clone(),
                        },
                    );
                    (ticket, fetch)
                }
            }
        };

        let result = fetch.await;
        self.settle(segment, ticket, &result);
        result
    }

    /// Enregistre le résultat d'un fetch
    ///
    /// Seulement si le segment attend toujours CE fetch : un invalidate()
    /// survenu entre-temps l'emporte, et le premier appelant qui règle
    /// l'état suffit pour tous les autres
    fn settle(&self, segment: Segment, ticket: u64, result: &Result<Snapshots, FetchError>) {
        let mut slots = self.slots();
        let still_pending = matches!(
            slots.get(&segment),
            Some(SlotState::Loading { ticket: current, .. }) if *current == ticket
        );
        if !still_pending {
            return;
        }

        match result {
            Ok(coins) => {
                info!(segment = %segment, coins = coins.len(), "Segment cached");
                slots.insert(segment, SlotState::Loaded(coins.clone()));
            }
            Err(e) => {
                warn!(segment = %segment, error = %e, "Segment fetch failed");
                slots.insert(segment, SlotState::Failed(e.clone()));
            }
        }
    }

    /// Oublie un segment : le prochain get_or_fetch refera un appel
    pub fn invalidate(&self, segment: Segment) {
        debug!(segment = %segment, "Invalidating segment");
        self.slots().remove(&segment);
    }

    /// État courant d'un segment
    pub fn status(&self, segment: Segment) -> SlotStatus {
        match self.slots().get(&segment) {
            None => SlotStatus::Empty,
            Some(SlotState::Loading { .. }) => SlotStatus::Loading,
            Some(SlotState::Loaded(coins)) => SlotStatus::Loaded(coins.len()),
            Some(SlotState::Failed(e)) => SlotStatus::Failed(e.clone()),
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ChartRequest;
    use crate::error::NetworkFailure;
    use crate::models::PricePoint;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Source simulée : compte les appels, peut échouer à la demande
    struct CountingSource {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingSource {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataSource for CountingSource {
        async fn fetch_markets(&self, segment: Segment) -> Result<Vec<CoinSnapshot>, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            // Laisse le temps aux autres appelants d'arriver
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail.load(Ordering::SeqCst) {
                return Err(NetworkFailure::Status(500).into());
            }
            // L'id porte le numéro d'appel : "coin-<page>-<appel>"
            Ok(vec![CoinSnapshot::new(
                &format!("coin-{}-{}", segment.page(), call),
                "Coin",
                "CN",
                1.0,
            )])
        }

        async fn fetch_market_chart(&self, _request: &ChartRequest) -> Result<Vec<PricePoint>, FetchError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_second_call_hits_cache() {
        let source = CountingSource::new();
        let cache = SnapshotCache::new(source.clone());

        let first = cache.get_or_fetch(Segment::Top100).await.unwrap();
        let second = cache.get_or_fetch(Segment::Top100).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.status(Segment::Top100), SlotStatus::Loaded(1));
    }

    #[tokio::test]
    async fn test_concurrent_requests_coalesce() {
        let source = CountingSource::new();
        let cache = SnapshotCache::new(source.clone());

        let (a, b, c) = tokio::join!(
            cache.get_or_fetch(Segment::Top200),
            cache.get_or_fetch(Segment::Top200),
            cache.get_or_fetch(Segment::Top200),
        );

        assert_eq!(source.calls(), 1);
        assert_eq!(a.unwrap()[0].id, "coin-2-1");
        assert!(b.is_ok() && c.is_ok());
    }

    #[tokio::test]
    async fn test_segments_are_independent() {
        let source = CountingSource::new();
        let cache = SnapshotCache::new(source.clone());

        cache.get_or_fetch(Segment::Top100).await.unwrap();
        cache.get_or_fetch(Segment::Top300).await.unwrap();

        assert_eq!(source.calls(), 2);
        assert_eq!(cache.status(Segment::Top200), SlotStatus::Empty);
    }

    #[tokio::test]
    async fn test_failure_leaves_no_data_and_no_retry() {
        let source = CountingSource::new();
        source.fail.store(true, Ordering::SeqCst);
        let cache = SnapshotCache::new(source.clone());

        let result = cache.get_or_fetch(Segment::Top100).await;
        assert_eq!(result, Err(NetworkFailure::Status(500).into()));
        assert!(matches!(cache.status(Segment::Top100), SlotStatus::Failed(_)));
        assert_eq!(source.calls(), 1);

        // Nouvelle demande explicite : nouveau fetch
        source.fail.store(false, Ordering::SeqCst);
        assert!(cache.get_or_fetch(Segment::Top100).await.is_ok());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let source = CountingSource::new();
        let cache = SnapshotCache::new(source.clone());

        cache.get_or_fetch(Segment::Top100).await.unwrap();
        cache.invalidate(Segment::Top100);
        assert_eq!(cache.status(Segment::Top100), SlotStatus::Empty);

        cache.get_or_fetch(Segment::Top100).await.unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(cache.status(Segment::Top100), SlotStatus::Loaded(1));
    }

    #[tokio::test]
    async fn test_invalidate_during_fetch_discards_old_result() {
        let source = CountingSource::new();
        let cache = SnapshotCache::new(source.clone());

        // Le premier fetch est encore en vol quand le segment est invalidé
        let (first, second) = tokio::join!(cache.get_or_fetch(Segment::Top100), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            cache.invalidate(Segment::Top100);
            cache.get_or_fetch(Segment::Top100).await
        });

        assert_eq!(source.calls(), 2);
        assert_eq!(first.unwrap()[0].id, "coin-1-1");
        assert_eq!(second.unwrap()[0].id, "coin-1-2");

        // Seul le second résultat est resté en cache
        let cached = cache.get_or_fetch(Segment::Top100).await.unwrap();
        assert_eq!(cached[0].id, "coin-1-2");
        assert_eq!(source.calls(), 2);
    }
}
