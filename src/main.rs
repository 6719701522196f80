// ============================================================================
// CoinScope - Dashboard crypto en terminal
// ============================================================================
// Programme TUI : table des marchés par segment, comparaison de coins,
// simulation de prise de profits
//
// ARCHITECTURE :
// 1. Thread UI : boucle événements → App::apply() → rendu
// 2. Thread worker : runtime tokio, exécute les fetchs en parallèle
// 3. Channels mpsc : commandes vers le worker, Actions vers l'UI
// ============================================================================

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use coinscope::api::{CoinGeckoClient, MarketDataSource};
use coinscope::app::{Action, App, Effect, InputTarget, Screen};
use coinscope::config::{Config, APP_DIR};
use coinscope::engine::SnapshotCache;
use coinscope::models::{SlotPosition, SortField};
use coinscope::store::{self, JsonFileStore, KeyValueStore};
use coinscope::ui::{events, render, Event, EventHandler};
use coinscope::worker::{spawn_worker, AppCommand};

// ============================================================================
// CLI
// ============================================================================

/// Dashboard crypto en terminal
#[derive(Debug, Parser)]
#[command(name = "coinscope", version, about)]
struct Cli {
    /// Fichier de configuration TOML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Devise de cotation (écrase la configuration)
    #[arg(long)]
    vs_currency: Option<String>,

    /// Répertoire des logs (écrase la configuration)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne sont plus visibles une fois le TUI lancé : on logge vers
// un fichier avec rotation quotidienne
// ============================================================================

/// Initialise le logging vers fichier
///
/// Filtre : RUST_LOG si défini, sinon debug pour coinscope et info ailleurs
///
/// ```bash
/// tail -f ~/.local/share/coinscope/logs/coinscope.log
/// RUST_LOG=coinscope=trace coinscope
/// ```
fn init_logging(log_dir: &Path) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    std::fs::create_dir_all(log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, format!("{}.log", APP_DIR));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coinscope=debug,info".into()),
        )
        .try_init()
        .context("Échec de l'initialisation du logging")?;

    info!(log_dir = %log_dir.display(), "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée
// ============================================================================

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(vs_currency) = cli.vs_currency {
        config.vs_currency = vs_currency;
    }
    if let Some(log_dir) = cli.log_dir {
        config.log_dir = Some(log_dir);
    }

    init_logging(&config.log_dir()).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {:#}", e);
        eprintln!("   Continuing without logging...");
    });
    info!(?config, "CoinScope starting up");

    // Source de données + cache partagés avec le worker
    let source: Arc<dyn MarketDataSource> = Arc::new(CoinGeckoClient::new(&config)?);
    let cache = Arc::new(SnapshotCache::new(source.clone()));

    // Watchlist persistée
    let mut watchlist_store = JsonFileStore::new(config.watchlist_path());
    let watchlist = store::load_watchlist(&watchlist_store);
    info!(path = %watchlist_store.path().display(), ids = watchlist.len(), "Watchlist loaded");

    let mut app = App::new(&config.vs_currency, config.default_chart_range, watchlist);

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<Action>();
    info!("Spawning background worker thread");
    let _worker = spawn_worker(source, cache, command_rx, result_tx);

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let startup = app.start();
    dispatch(startup, &command_tx, &mut watchlist_store);

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &EventHandler::new(), &command_tx, &result_rx, &mut watchlist_store);

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }
    result
}

// ============================================================================
// Effets : worker ou stockage
// ============================================================================

fn dispatch(effects: Vec<Effect>, command_tx: &mpsc::Sender<AppCommand>, storage: &mut dyn KeyValueStore) {
    for effect in effects {
        if let Effect::PersistWatchlist(ids) = &effect {
            if let Err(e) = store::save_watchlist(storage, ids) {
                error!(error = ?e, "Failed to persist watchlist");
            }
            continue;
        }
        if let Some(command) = AppCommand::from_effect(&effect) {
            if command_tx.send(command).is_err() {
                error!("Worker thread disconnected!");
            }
        }
    }
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. Résultats du worker → App::apply()
//   1. Rendu
//   2. Événement clavier → Action → App::apply() → effets
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    command_tx: &mpsc::Sender<AppCommand>,
    result_rx: &mpsc::Receiver<Action>,
    storage: &mut dyn KeyValueStore,
) -> Result<()> {
    while app.is_running() {
        // 0. Résultats : on vide le channel sans bloquer
        loop {
            match result_rx.try_recv() {
                Ok(action) => {
                    let effects = app.apply(action);
                    dispatch(effects, command_tx, storage);
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    warn!("Worker thread disconnected");
                    break;
                }
            }
        }

        // 1. Rendu
        terminal.draw(|frame| render(frame, app))?;

        // 2. Entrée
        match events.next() {
            Ok(event) => {
                let effects = handle_event(app, &event);
                dispatch(effects, command_tx, storage);
            }
            Err(e) => warn!(error = ?e, "Failed to read terminal event"),
        }
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Traduit un événement clavier en actions sur l'état
fn handle_event(app: &mut App, event: &Event) -> Vec<Effect> {
    if matches!(event, Event::Tick) {
        return Vec::new();
    }

    // Mode saisie : toutes les touches vont au buffer
    if app.is_in_input_mode() {
        if events::is_escape_event(event) {
            debug!("User cancelled input");
            app.cancel_input();
        } else if events::is_enter_event(event) {
            return app.submit_input();
        } else if events::is_backspace_event(event) {
            app.backspace();
        } else if events::is_input_char_event(event) {
            if let Some(c) = events::get_char_from_event(event) {
                app.append_char(c);
            }
        }
        return Vec::new();
    }

    app.notice = None;

    // Two-step quit
    if events::is_quit_event(event) {
        if app.is_awaiting_quit_confirmation() {
            info!("User confirmed quit");
            app.quit();
        } else {
            info!("User requested quit (awaiting confirmation)");
            app.request_quit();
        }
        return Vec::new();
    }
    app.cancel_quit();

    if events::is_tab_event(event) {
        return app.apply(Action::NextScreen);
    }
    if events::is_up_event(event) {
        return app.apply(Action::NavigateUp);
    }
    if events::is_down_event(event) {
        return app.apply(Action::NavigateDown);
    }

    match app.current_screen {
        Screen::Markets => handle_markets_key(app, event),
        Screen::Compare => handle_compare_key(app, event),
        Screen::ExitPlan => handle_exit_plan_key(app, event),
    }
}

fn handle_markets_key(app: &mut App, event: &Event) -> Vec<Effect> {
    if events::is_escape_event(event) {
        return app.apply(Action::SetSearch(String::new()));
    }

    let Some(c) = events::get_char_from_event(event) else {
        return Vec::new();
    };
    match c {
        '/' => {
            app.start_input(InputTarget::Search);
            Vec::new()
        }
        'n' => app.apply(Action::NextSegment),
        'N' => app.apply(Action::PreviousSegment),
        'p' => app.apply(Action::SortBy(SortField::Price)),
        'c' => app.apply(Action::SortBy(SortField::Change24h)),
        'm' => app.apply(Action::SortBy(SortField::MarketCap)),
        'v' => app.apply(Action::SortBy(SortField::Volume24h)),
        'f' => app.apply(Action::ToggleWatchlistFilter),
        'r' => {
            info!(segment = %app.segment, "User requested refresh");
            app.apply(Action::Refresh)
        }
        'w' => match app.selected_coin() {
            Some(coin) => app.apply(Action::ToggleWatchlist(coin.id)),
            None => Vec::new(),
        },
        'x' => match app.selected_coin() {
            Some(coin) => {
                let mut effects = app.apply(Action::SelectExitCoin(coin.id));
                effects.extend(app.apply(Action::ShowScreen(Screen::ExitPlan)));
                effects
            }
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn handle_compare_key(app: &mut App, event: &Event) -> Vec<Effect> {
    if events::is_next_range_event(event) {
        return app.apply(Action::SetChartRange(app.chart_range.next()));
    }
    if events::is_previous_range_event(event) {
        return app.apply(Action::SetChartRange(app.chart_range.previous()));
    }

    match events::get_char_from_event(event) {
        Some('a') => app.start_input(InputTarget::Comparison(SlotPosition::A)),
        Some('b') => app.start_input(InputTarget::Comparison(SlotPosition::B)),
        Some('c') => app.start_input(InputTarget::Comparison(SlotPosition::C)),
        Some('s') => return app.apply(Action::SwapSlots),
        _ => {}
    }
    Vec::new()
}

fn handle_exit_plan_key(app: &mut App, event: &Event) -> Vec<Effect> {
    let selected = app.selected_row_id();

    match (events::get_char_from_event(event), selected) {
        (Some('e'), _) => app.start_input(InputTarget::EntryPrice),
        (Some('t'), _) => app.start_input(InputTarget::TotalTokens),
        (Some('c'), _) => app.start_input(InputTarget::ExitCoin),
        (Some('p'), Some(id)) => app.start_input(InputTarget::RowPrice(id)),
        (Some('%'), Some(id)) => app.start_input(InputTarget::RowPercent(id)),
        (Some('a'), _) => return app.apply(Action::AddRow),
        (Some('d'), Some(id)) => return app.apply(Action::RemoveRow(id)),
        (Some('s'), _) => return app.apply(Action::AutoSplit),
        (Some('r'), _) => return app.apply(Action::ResetPlan),
        _ => {}
    }
    Vec::new()
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================

/// Raw mode + écran alternatif
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal (appelé même si la boucle a échoué)
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
