// ============================================================================
// Worker : exécution asynchrone des requêtes
// ============================================================================
// Thread séparé avec son propre runtime tokio
// - Reçoit des AppCommand via un channel (command_rx)
// - Lance une tâche par commande : les requêtes tournent en parallèle et
//   n'attendent jamais l'UI
// - Renvoie chaque résultat sous forme d'Action (avec son ticket) via
//   result_tx ; c'est l'UI qui décide s'il est encore d'actualité
// ============================================================================

use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;

use futures::future::try_join_all;
use tracing::{debug, error, info, instrument};

use crate::api::{ComparisonRequest, ComparisonSeries, MarketDataSource};
use crate::app::{Action, Effect};
use crate::engine::{SnapshotCache, Ticket};
use crate::error::FetchError;
use crate::models::Segment;

/// Commandes envoyées au worker
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Charger un segment (via le cache)
    LoadSegment {
        ticket: Ticket,
        segment: Segment,
        force: bool,
    },

    /// Charger les 2 ou 3 séries de la comparaison
    LoadComparison {
        ticket: Ticket,
        request: ComparisonRequest,
    },
}

impl AppCommand {
    /// Commande correspondant à un effet réseau (None pour les autres)
    pub fn from_effect(effect: &Effect) -> Option<AppCommand> {
        match effect {
            Effect::FetchSegment {
                ticket,
                segment,
                force,
            } => Some(AppCommand::LoadSegment {
                ticket: *ticket,
                segment: *segment,
                force: *force,
            }),
            Effect::FetchComparison { ticket, request } => Some(AppCommand::LoadComparison {
                ticket: *ticket,
                request: request.clone(),
            }),
            Effect::PersistWatchlist(_) => None,
        }
    }
}

/// Exécute une commande et retourne l'action de résolution
pub async fn execute(
    command: AppCommand,
    cache: &SnapshotCache,
    source: &dyn MarketDataSource,
) -> Action {
    match command {
        AppCommand::LoadSegment {
            ticket,
            segment,
            force,
        } => {
            if force {
                cache.invalidate(segment);
            }
            debug!(segment = %segment, status = ?cache.status(segment), force, "Loading segment");
            match cache.get_or_fetch(segment).await {
                Ok(coins) => Action::SegmentLoaded {
                    ticket,
                    segment,
                    coins,
                },
                Err(error) => Action::SegmentFailed {
                    ticket,
                    segment,
                    error,
                },
            }
        }
        AppCommand::LoadComparison { ticket, request } => {
            match fetch_comparison(&request, source).await {
                Ok(series) => Action::ComparisonLoaded { ticket, series },
                Err(error) => Action::ComparisonFailed { ticket, error },
            }
        }
    }
}

/// Lance les séries A, B (et C) en parallèle
///
/// Le premier échec l'emporte : pas de comparaison partielle
#[instrument(skip_all, fields(a = %request.a.coin_id, b = %request.b.coin_id))]
async fn fetch_comparison(
    request: &ComparisonRequest,
    source: &dyn MarketDataSource,
) -> Result<ComparisonSeries, FetchError> {
    let fetches = request
        .requests()
        .into_iter()
        .map(|chart| source.fetch_market_chart(chart));
    let mut series = try_join_all(fetches).await?.into_iter();

    let a = series.next().unwrap_or_default();
    let b = series.next().unwrap_or_default();
    let c = request.c.as_ref().map(|_| series.next().unwrap_or_default());

    debug!(a = a.len(), b = b.len(), "Comparison series fetched");
    Ok(ComparisonSeries { a, b, c })
}

/// Démarre le worker
///
/// Le thread s'arrête quand command_rx est fermé (fin de l'UI)
pub fn spawn_worker(
    source: Arc<dyn MarketDataSource>,
    cache: Arc<SnapshotCache>,
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<Action>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = ?e, "Failed to create tokio runtime, worker disabled");
                return;
            }
        };

        // recv() bloque ce thread (pas l'UI) jusqu'à la prochaine commande
        while let Ok(command) = command_rx.recv() {
            info!(?command, "Worker received command");

            let source = source.clone();
            let cache = cache.clone();
            let result_tx = result_tx.clone();
            runtime.spawn(async move {
                let action = execute(command, &cache, source.as_ref()).await;
                if result_tx.send(action).is_err() {
                    debug!("UI gone, dropping result");
                }
            });
        }

        info!("Worker thread exiting (channel closed)");
    })
}

// ============================================================================
// Tests unitaires
// ============================================================================
