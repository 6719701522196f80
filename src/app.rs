// ============================================================================
// Structure : App
// ============================================================================
// État global de la session et fonction de mise à jour unique
//
// PATTERN : Action → apply() → Effects
// - Chaque événement externe (touche, réponse réseau) devient une Action
// - apply() modifie l'état et retourne les effets à exécuter (fetch,
//   persistance), sans jamais faire d'I/O lui-même
// - Les vues (table, comparaison, plan de sortie) sont recalculées à la
//   demande à partir de l'état, jamais stockées
//
// CONCEPT : Réponses périmées
// - Chaque requête emporte un Ticket (voir engine::generation)
// - Une réponse dont le ticket n'est plus le dernier émis est ignorée
// ============================================================================

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::api::{ComparisonRequest, ComparisonSeries};
use crate::engine::{
    self, base_for_view, find_coin, ExitReport, Generations, RequestClass, SeriesSummary,
    Snapshots, Ticket,
};
use crate::error::FetchError;
use crate::models::{
    ChartRange, CoinSnapshot, ComparisonSlot, ExitPlan, MergedRow, RowField, RowId, Segment,
    SlotPosition, SlotRejection, SortField, SortSpec, WatchlistSet,
};

/// Id du coin affiché en tête du dashboard
pub const HEADLINE_COIN: &str = "bitcoin";

// ============================================================================
// Enum : Screen
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Table des coins du segment (ou de la watchlist)
    Markets,

    /// Performance relative de 2 ou 3 coins
    Compare,

    /// Simulation de prise de profits
    ExitPlan,
}

impl Screen {
    pub fn next(&self) -> Screen {
        match self {
            Screen::Markets => Screen::Compare,
            Screen::Compare => Screen::ExitPlan,
            Screen::ExitPlan => Screen::Markets,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Markets => "Markets",
            Screen::Compare => "Compare",
            Screen::ExitPlan => "Exit plan",
        }
    }
}

/// Champ ciblé par la ligne de saisie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTarget {
    Search,
    Comparison(SlotPosition),
    EntryPrice,
    TotalTokens,
    RowPrice(RowId),
    RowPercent(RowId),
    ExitCoin,
}

impl InputTarget {
    /// Prompt affiché devant le buffer
    pub fn prompt(&self) -> String {
        match self {
            InputTarget::Search => "Search: ".to_string(),
            InputTarget::Comparison(slot) => format!("Coin {} (id): ", slot.label()),
            InputTarget::EntryPrice => "Entry price: ".to_string(),
            InputTarget::TotalTokens => "Total tokens: ".to_string(),
            InputTarget::RowPrice(_) => "Target price: ".to_string(),
            InputTarget::RowPercent(_) => "Sell %: ".to_string(),
            InputTarget::ExitCoin => "Coin (id): ".to_string(),
        }
    }
}

/// État d'une zone qui dépend du réseau
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestState {
    /// Une requête est en vol
    pub loading: bool,

    /// Dernière erreur, affichée jusqu'au prochain succès accepté
    pub error: Option<String>,
}

impl RequestState {
    fn start(&mut self) {
        self.loading = true;
    }

    fn succeed(&mut self) {
        self.loading = false;
        self.error = None;
    }

    fn fail(&mut self, error: &FetchError) {
        self.loading = false;
        self.error = Some(error.user_message());
    }
}

// ============================================================================
// Actions et effets
// ============================================================================

/// Tout ce qui peut modifier l'état
#[derive(Debug, Clone)]
pub enum Action {
    ShowScreen(Screen),
    NextScreen,
    NavigateUp,
    NavigateDown,

    // Markets
    SelectSegment(Segment),
    NextSegment,
    PreviousSegment,
    SetSearch(String),
    SortBy(SortField),
    ToggleWatchlistFilter,
    ToggleWatchlist(String),
    Refresh,

    // Comparaison
    AssignSlot(SlotPosition, String),
    SwapSlots,
    SetChartRange(ChartRange),

    // Plan de sortie
    SetEntryPrice(String),
    SetTotalTokens(String),
    AddRow,
    RemoveRow(RowId),
    EditRow(RowId, RowField, String),
    ResetPlan,
    AutoSplit,
    SelectExitCoin(String),

    // Réponses du worker
    SegmentLoaded {
        ticket: Ticket,
        segment: Segment,
        coins: Snapshots,
    },
    SegmentFailed {
        ticket: Ticket,
        segment: Segment,
        error: FetchError,
    },
    ComparisonLoaded {
        ticket: Ticket,
        series: ComparisonSeries,
    },
    ComparisonFailed {
        ticket: Ticket,
        error: FetchError,
    },
}

/// Travail à exécuter hors de l'état (réseau, disque)
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Charger un segment (force : ignorer le cache)
    FetchSegment {
        ticket: Ticket,
        segment: Segment,
        force: bool,
    },

    /// Charger les séries de la comparaison
    FetchComparison {
        ticket: Ticket,
        request: ComparisonRequest,
    },

    /// Réécrire la watchlist dans le stockage
    PersistWatchlist(Vec<String>),
}

// ============================================================================
// Vues dérivées
// ============================================================================

/// Une colonne de la comparaison
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonColumn {
    pub slot: SlotPosition,
    pub coin_id: String,
    /// "Nom (SYM)" si le coin est connu, "Coin A/B/C" sinon
    pub label: String,
    pub summary: SeriesSummary,
}

/// Comparaison prête à afficher
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonView {
    pub range: ChartRange,
    pub columns: Vec<ComparisonColumn>,
    pub rows: Vec<MergedRow>,
}

/// Stat d'en-tête (prix et variation 24h)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlineStat {
    pub price: f64,
    pub change_24h: f64,
}

// ============================================================================
// App
// ============================================================================

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    pub current_screen: Screen,

    /// Devise de cotation des séries
    pub vs_currency: String,

    // --- Markets ---
    pub segment: Segment,
    pub search: String,
    pub sort: SortSpec,
    pub watchlist_active: bool,
    pub watchlist: WatchlistSet,
    /// Segments chargés (réponses acceptées uniquement)
    pub segments: BTreeMap<Segment, Snapshots>,
    pub markets: RequestState,
    /// Index de la ligne sélectionnée dans la table visible
    pub selected_index: usize,

    // --- Comparaison ---
    pub slots: ComparisonSlot,
    pub chart_range: ChartRange,
    pub series: Option<ComparisonSeries>,
    pub comparison: RequestState,

    // --- Plan de sortie ---
    pub exit_plan: ExitPlan,
    /// Index de la ligne sélectionnée dans le plan
    pub selected_row: usize,

    /// Message ponctuel (saisie refusée...), effacé à la touche suivante
    pub notice: Option<String>,

    /// Two-step quit : première pression de 'q' = confirmation demandée
    pub confirm_quit: bool,

    /// Ligne de saisie active (None hors saisie)
    pub input: Option<InputTarget>,
    pub input_buffer: String,

    generations: Generations,
}

impl App {
    pub fn new(vs_currency: &str, chart_range: ChartRange, watchlist: WatchlistSet) -> Self {
        Self {
            running: true,
            current_screen: Screen::Markets,
            vs_currency: vs_currency.to_string(),
            segment: Segment::default(),
            search: String::new(),
            sort: SortSpec::default(),
            watchlist_active: false,
            watchlist,
            segments: BTreeMap::new(),
            markets: RequestState::default(),
            selected_index: 0,
            slots: ComparisonSlot::default(),
            chart_range,
            series: None,
            comparison: RequestState::default(),
            exit_plan: ExitPlan::new(),
            selected_row: 0,
            notice: None,
            confirm_quit: false,
            input: None,
            input_buffer: String::new(),
            generations: Generations::new(),
        }
    }

    /// Effets du démarrage : segment par défaut et comparaison par défaut
    pub fn start(&mut self) -> Vec<Effect> {
        let mut effects = self.load_segment(false);
        effects.extend(self.load_comparison());
        effects
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    // ========================================================================
    // Mise à jour
    // ========================================================================

    /// Applique une action et retourne les effets à exécuter
    pub fn apply(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::ShowScreen(screen) => {
                self.current_screen = screen;
                Vec::new()
            }
            Action::NextScreen => {
                self.current_screen = self.current_screen.next();
                Vec::new()
            }
            Action::NavigateUp => {
                self.navigate_up();
                Vec::new()
            }
            Action::NavigateDown => {
                self.navigate_down();
                Vec::new()
            }

            Action::SelectSegment(segment) => {
                self.segment = segment;
                self.selected_index = 0;
                self.load_segment(false)
            }
            Action::NextSegment => self.apply(Action::SelectSegment(self.segment.next())),
            Action::PreviousSegment => self.apply(Action::SelectSegment(self.segment.previous())),
            Action::SetSearch(text) => {
                self.search = text;
                self.clamp_selection();
                Vec::new()
            }
            Action::SortBy(field) => {
                self.sort = self.sort.toggled(field);
                Vec::new()
            }
            Action::ToggleWatchlistFilter => {
                self.watchlist_active = !self.watchlist_active;
                self.selected_index = 0;
                Vec::new()
            }
            Action::ToggleWatchlist(id) => {
                let added = self.watchlist.toggle(&id);
                info!(coin = %id, added, "Watchlist toggled");
                self.clamp_selection();
                vec![Effect::PersistWatchlist(self.watchlist.ids().to_vec())]
            }
            Action::Refresh => self.load_segment(true),

            Action::AssignSlot(slot, id) => match self.slots.assign(slot, &id) {
                Ok(()) => self.load_comparison(),
                Err(rejection) => {
                    self.notice = Some(rejection_message(&rejection, slot));
                    Vec::new()
                }
            },
            Action::SwapSlots => {
                self.slots.swap_ab();
                self.load_comparison()
            }
            Action::SetChartRange(range) => {
                self.chart_range = range;
                self.load_comparison()
            }

            Action::SetEntryPrice(text) => {
                self.exit_plan.set_entry_price(&text);
                Vec::new()
            }
            Action::SetTotalTokens(text) => {
                self.exit_plan.set_total_tokens(&text);
                Vec::new()
            }
            Action::AddRow => {
                self.exit_plan.add_row();
                self.selected_row = self.exit_plan.rows.len().saturating_sub(1);
                Vec::new()
            }
            Action::RemoveRow(id) => {
                self.exit_plan.remove_row(id);
                self.clamp_row();
                Vec::new()
            }
            Action::EditRow(id, field, text) => {
                self.exit_plan.edit_row(id, field, &text);
                Vec::new()
            }
            Action::ResetPlan => {
                self.exit_plan.reset();
                self.selected_row = 0;
                Vec::new()
            }
            Action::AutoSplit => {
                self.exit_plan.auto_split_three();
                self.clamp_row();
                Vec::new()
            }
            Action::SelectExitCoin(id) => {
                let id = id.trim();
                if !id.is_empty() {
                    let price = find_coin(&self.segments, id).map(|c| c.price).unwrap_or(0.0);
                    self.exit_plan.select_coin(id, price);
                }
                Vec::new()
            }

            Action::SegmentLoaded {
                ticket,
                segment,
                coins,
            } => {
                if !self.generations.is_current(ticket) {
                    debug!(?ticket, segment = %segment, "Dropping stale segment response");
                    return Vec::new();
                }
                info!(segment = %segment, coins = coins.len(), "Segment applied");
                self.segments.insert(segment, coins);
                self.markets.succeed();
                self.clamp_selection();
                Vec::new()
            }
            Action::SegmentFailed {
                ticket,
                segment,
                error,
            } => {
                if !self.generations.is_current(ticket) {
                    debug!(?ticket, segment = %segment, "Dropping stale segment failure");
                    return Vec::new();
                }
                warn!(segment = %segment, error = %error, network = error.is_network(), "Segment load failed");
                self.markets.fail(&error);
                // Pas de données partielles : l'ancien snapshot disparaît aussi
                self.segments.remove(&segment);
                self.clamp_selection();
                Vec::new()
            }
            Action::ComparisonLoaded { ticket, series } => {
                if !self.generations.is_current(ticket) {
                    debug!(?ticket, "Dropping stale comparison response");
                    return Vec::new();
                }
                self.series = Some(series);
                self.comparison.succeed();
                Vec::new()
            }
            Action::ComparisonFailed { ticket, error } => {
                if !self.generations.is_current(ticket) {
                    debug!(?ticket, "Dropping stale comparison failure");
                    return Vec::new();
                }
                warn!(error = %error, network = error.is_network(), "Comparison load failed");
                self.series = None;
                self.comparison.fail(&error);
                Vec::new()
            }
        }
    }

    /// Émet un ticket Markets et, si le segment n'est pas déjà là, un fetch
    ///
    /// Le nouveau ticket rend caduque toute réponse encore en vol
    fn load_segment(&mut self, force: bool) -> Vec<Effect> {
        let ticket = self.generations.issue(RequestClass::Markets);

        if !force && self.segments.contains_key(&self.segment) {
            debug!(segment = %self.segment, "Segment already loaded");
            self.markets.succeed();
            return Vec::new();
        }

        self.markets.start();
        vec![Effect::FetchSegment {
            ticket,
            segment: self.segment,
            force,
        }]
    }

    fn load_comparison(&mut self) -> Vec<Effect> {
        let ticket = self.generations.issue(RequestClass::Comparison);
        self.comparison.start();
        vec![Effect::FetchComparison {
            ticket,
            request: ComparisonRequest::from_slots(&self.slots, self.chart_range, &self.vs_currency),
        }]
    }

    // ========================================================================
    // Vues dérivées
    // ========================================================================

    /// Table affichée : base, recherche, filtre watchlist et tri
    pub fn visible_coins(&self) -> Vec<CoinSnapshot> {
        let base = base_for_view(&self.segments, self.segment, self.watchlist_active);
        engine::compose(&base, &self.search, self.watchlist_active, &self.watchlist, self.sort)
    }

    pub fn selected_coin(&self) -> Option<CoinSnapshot> {
        self.visible_coins().into_iter().nth(self.selected_index)
    }

    /// Comparaison courante (colonnes sans données si rien n'est chargé)
    pub fn comparison_view(&self) -> ComparisonView {
        let empty = ComparisonSeries::default();
        let series = self.series.as_ref().unwrap_or(&empty);

        let columns = self
            .slots
            .occupied()
            .into_iter()
            .map(|(slot, id)| ComparisonColumn {
                slot,
                coin_id: id.to_string(),
                label: find_coin(&self.segments, id)
                    .map(CoinSnapshot::short_label)
                    .unwrap_or_else(|| slot.fallback_label().to_string()),
                summary: SeriesSummary::of(series.get(slot).unwrap_or(&[])),
            })
            .collect();

        ComparisonView {
            range: self.chart_range,
            columns,
            rows: engine::merge(&series.a, &series.b, series.c.as_deref()),
        }
    }

    pub fn exit_report(&self) -> ExitReport {
        engine::compute(&self.exit_plan)
    }

    /// Prix et variation du Bitcoin, si un segment chargé le contient
    pub fn headline(&self) -> Option<HeadlineStat> {
        find_coin(&self.segments, HEADLINE_COIN).map(|coin| HeadlineStat {
            price: coin.price,
            change_24h: coin.change_24h,
        })
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn navigate_up(&mut self) {
        match self.current_screen {
            Screen::ExitPlan => self.selected_row = self.selected_row.saturating_sub(1),
            _ => self.selected_index = self.selected_index.saturating_sub(1),
        }
    }

    pub fn navigate_down(&mut self) {
        match self.current_screen {
            Screen::ExitPlan => {
                let max = self.exit_plan.rows.len().saturating_sub(1);
                self.selected_row = (self.selected_row + 1).min(max);
            }
            _ => {
                let max = self.visible_coins().len().saturating_sub(1);
                self.selected_index = (self.selected_index + 1).min(max);
            }
        }
    }

    fn clamp_selection(&mut self) {
        let max = self.visible_coins().len().saturating_sub(1);
        self.selected_index = self.selected_index.min(max);
    }

    fn clamp_row(&mut self) {
        let max = self.exit_plan.rows.len().saturating_sub(1);
        self.selected_row = self.selected_row.min(max);
    }

    /// Id de la ligne du plan sélectionnée
    pub fn selected_row_id(&self) -> Option<RowId> {
        self.exit_plan.rows.get(self.selected_row).map(|row| row.id)
    }

    // ========================================================================
    // Two-step quit
    // ========================================================================

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    // ========================================================================
    // Ligne de saisie
    // ========================================================================

    /// Ouvre la saisie, pré-remplie avec la valeur courante du champ
    pub fn start_input(&mut self, target: InputTarget) {
        self.input_buffer = self.current_value(target);
        self.input = Some(target);
    }

    fn current_value(&self, target: InputTarget) -> String {
        match target {
            InputTarget::Search => self.search.clone(),
            InputTarget::Comparison(slot) => self.slots.get(slot).unwrap_or_default().to_string(),
            InputTarget::EntryPrice => self.exit_plan.entry_price.clone(),
            InputTarget::TotalTokens => self.exit_plan.total_tokens.clone(),
            InputTarget::RowPrice(id) => self
                .exit_plan
                .row(id)
                .map(|row| row.target_price.clone())
                .unwrap_or_default(),
            InputTarget::RowPercent(id) => self
                .exit_plan
                .row(id)
                .map(|row| row.sell_percent.clone())
                .unwrap_or_default(),
            InputTarget::ExitCoin => self.exit_plan.coin_id.clone().unwrap_or_default(),
        }
    }

    pub fn cancel_input(&mut self) {
        self.input = None;
        self.input_buffer.clear();
    }

    /// Valide la saisie : le buffer devient l'action du champ ciblé
    pub fn submit_input(&mut self) -> Vec<Effect> {
        let Some(target) = self.input.take() else {
            return Vec::new();
        };
        let value = std::mem::take(&mut self.input_buffer);

        let action = match target {
            InputTarget::Search => Action::SetSearch(value),
            InputTarget::Comparison(slot) => Action::AssignSlot(slot, value),
            InputTarget::EntryPrice => Action::SetEntryPrice(value),
            InputTarget::TotalTokens => Action::SetTotalTokens(value),
            InputTarget::RowPrice(id) => Action::EditRow(id, RowField::TargetPrice, value),
            InputTarget::RowPercent(id) => Action::EditRow(id, RowField::SellPercent, value),
            InputTarget::ExitCoin => Action::SelectExitCoin(value),
        };
        self.apply(action)
    }

    pub fn append_char(&mut self, c: char) {
        self.input_buffer.push(c);
        self.sync_live_search();
    }

    pub fn backspace(&mut self) {
        self.input_buffer.pop();
        self.sync_live_search();
    }

    /// La recherche filtre la table à chaque frappe, sans attendre Entrée
    fn sync_live_search(&mut self) {
        if self.input == Some(InputTarget::Search) {
            self.apply(Action::SetSearch(self.input_buffer.clone()));
        }
    }

    pub fn is_in_input_mode(&self) -> bool {
        self.input.is_some()
    }

    pub fn input_prompt(&self) -> String {
        self.input.map(|target| target.prompt()).unwrap_or_default()
    }
}

fn rejection_message(rejection: &SlotRejection, slot: SlotPosition) -> String {
    match rejection {
        SlotRejection::EmptyId => format!("Le coin {} est obligatoire", slot.label()),
        SlotRejection::Duplicate(other) => {
            format!("Ce coin est déjà sélectionné en {}", other.label())
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new("usd", ChartRange::default(), WatchlistSet::new())
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkFailure;
    use crate::models::{PricePoint, SortDirection};
    use std::sync::Arc;

    fn coin(id: &str, symbol: &str, price: f64) -> CoinSnapshot {
        CoinSnapshot::new(id, &id.to_uppercase(), symbol, price)
    }

    fn segment_ticket(effects: &[Effect]) -> Ticket {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::FetchSegment { ticket, .. } => Some(*ticket),
                _ => None,
            })
            .unwrap()
    }

    fn comparison_ticket(effects: &[Effect]) -> Ticket {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::FetchComparison { ticket, .. } => Some(*ticket),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_start_requests_segment_and_comparison() {
        let mut app = App::default();
        let effects = app.start();

        assert_eq!(effects.len(), 2);
        assert!(matches!(
            effects[0],
            Effect::FetchSegment { segment: Segment::Top100, force: false, .. }
        ));
        assert!(app.markets.loading);
        assert!(app.comparison.loading);
    }

    #[test]
    fn test_stale_segment_response_is_dropped() {
        let mut app = App::default();
        let first = segment_ticket(&app.start());
        let second = segment_ticket(&app.apply(Action::SelectSegment(Segment::Top200)));

        // La réponse du segment 1 arrive après le changement : ignorée
        app.apply(Action::SegmentLoaded {
            ticket: first,
            segment: Segment::Top100,
            coins: Arc::new(vec![coin("a", "A", 1.0)]),
        });
        assert!(app.segments.is_empty());
        assert!(app.markets.loading);

        app.apply(Action::SegmentLoaded {
            ticket: second,
            segment: Segment::Top200,
            coins: Arc::new(vec![coin("c", "C", 1.0)]),
        });
        assert_eq!(app.visible_coins().len(), 1);
        assert!(!app.markets.loading);
    }

    #[test]
    fn test_error_persists_until_next_success() {
        let mut app = App::default();
        let ticket = segment_ticket(&app.start());

        app.apply(Action::SegmentFailed {
            ticket,
            segment: Segment::Top100,
            error: FetchError::RateLimited {
                retry_after: std::time::Duration::from_secs(30),
            },
        });
        assert!(!app.markets.loading);
        assert!(app.markets.error.as_deref().unwrap().contains("429"));

        // Changer le tri ne touche pas à l'erreur
        app.apply(Action::SortBy(SortField::Price));
        assert!(app.markets.error.is_some());

        let ticket = segment_ticket(&app.apply(Action::Refresh));
        app.apply(Action::SegmentLoaded {
            ticket,
            segment: Segment::Top100,
            coins: Arc::new(vec![]),
        });
        assert_eq!(app.markets.error, None);
    }

    #[test]
    fn test_loaded_segment_is_not_refetched() {
        let mut app = App::default();
        let ticket = segment_ticket(&app.start());
        app.apply(Action::SegmentLoaded {
            ticket,
            segment: Segment::Top100,
            coins: Arc::new(vec![coin("a", "A", 1.0)]),
        });

        app.apply(Action::SelectSegment(Segment::Top200));
        let effects = app.apply(Action::SelectSegment(Segment::Top100));
        assert!(effects.is_empty());
        assert!(!app.markets.loading);

        let effects = app.apply(Action::Refresh);
        assert!(matches!(effects[0], Effect::FetchSegment { force: true, .. }));
    }

    #[test]
    fn test_cached_segment_clears_other_segment_error() {
        let mut app = App::default();
        let ticket = segment_ticket(&app.start());
        app.apply(Action::SegmentLoaded {
            ticket,
            segment: Segment::Top100,
            coins: Arc::new(vec![coin("a", "A", 1.0)]),
        });

        let ticket = segment_ticket(&app.apply(Action::SelectSegment(Segment::Top200)));
        app.apply(Action::SegmentFailed {
            ticket,
            segment: Segment::Top200,
            error: NetworkFailure::Status(500).into(),
        });
        assert!(app.markets.error.is_some());

        // Retour sur un segment en cache : cycle réussi, l'erreur disparaît
        let effects = app.apply(Action::SelectSegment(Segment::Top100));
        assert!(effects.is_empty());
        assert_eq!(app.visible_coins().len(), 1);
        assert_eq!(app.markets.error, None);
    }

    #[test]
    fn test_failed_refresh_drops_old_snapshot() {
        let mut app = App::default();
        let ticket = segment_ticket(&app.start());
        app.apply(Action::SegmentLoaded {
            ticket,
            segment: Segment::Top100,
            coins: Arc::new(vec![coin("a", "A", 1.0), coin("b", "B", 2.0)]),
        });
        app.apply(Action::NavigateDown);

        let ticket = segment_ticket(&app.apply(Action::Refresh));
        app.apply(Action::SegmentFailed {
            ticket,
            segment: Segment::Top100,
            error: NetworkFailure::Status(500).into(),
        });

        assert!(!app.segments.contains_key(&Segment::Top100));
        assert!(app.visible_coins().is_empty());
        assert_eq!(app.selected_index, 0);

        // Revenir sur le segment relance un fetch
        app.apply(Action::SelectSegment(Segment::Top200));
        let effects = app.apply(Action::SelectSegment(Segment::Top100));
        assert!(matches!(
            effects[0],
            Effect::FetchSegment { segment: Segment::Top100, force: false, .. }
        ));
    }

    #[test]
    fn test_previous_segment_cycles() {
        let mut app = App::default();
        let effects = app.apply(Action::PreviousSegment);
        assert_eq!(app.segment, Segment::Top300);
        assert!(matches!(
            effects[0],
            Effect::FetchSegment { segment: Segment::Top300, .. }
        ));

        app.apply(Action::NextSegment);
        assert_eq!(app.segment, Segment::Top100);
    }

    #[test]
    fn test_search_filters_while_typing() {
        let mut app = App::default();
        let ticket = segment_ticket(&app.start());
        app.apply(Action::SegmentLoaded {
            ticket,
            segment: Segment::Top100,
            coins: Arc::new(vec![coin("a", "AAA", 1.0), coin("b", "BBB", 2.0)]),
        });

        app.start_input(InputTarget::Search);
        app.append_char('b');
        assert_eq!(app.search, "b");
        assert_eq!(app.visible_coins().len(), 1);

        app.backspace();
        assert_eq!(app.search, "");
        assert_eq!(app.visible_coins().len(), 2);

        // Les autres champs attendent Entrée
        app.cancel_input();
        app.start_input(InputTarget::EntryPrice);
        app.append_char('5');
        assert_eq!(app.input_buffer, "15");
        assert_eq!(app.exit_plan.entry_price, "1");
    }

    #[test]
    fn test_watchlist_toggle_persists() {
        let mut app = App::default();
        let effects = app.apply(Action::ToggleWatchlist("solana".to_string()));
        assert_eq!(effects, vec![Effect::PersistWatchlist(vec!["solana".to_string()])]);

        let effects = app.apply(Action::ToggleWatchlist("solana".to_string()));
        assert_eq!(effects, vec![Effect::PersistWatchlist(vec![])]);
    }

    #[test]
    fn test_sort_toggle_and_search() {
        let mut app = App::default();
        let ticket = segment_ticket(&app.start());
        app.apply(Action::SegmentLoaded {
            ticket,
            segment: Segment::Top100,
            coins: Arc::new(vec![coin("a", "AAA", 1.0), coin("b", "BBB", 2.0)]),
        });

        app.apply(Action::SortBy(SortField::Price));
        assert_eq!(app.sort, SortSpec::new(SortField::Price, SortDirection::Desc));
        assert_eq!(app.visible_coins()[0].id, "b");

        app.apply(Action::SortBy(SortField::Price));
        assert_eq!(app.visible_coins()[0].id, "a");

        app.apply(Action::SetSearch("bb".to_string()));
        assert_eq!(app.visible_coins().len(), 1);
    }

    #[test]
    fn test_comparison_flow() {
        let mut app = App::default();
        let effects = app.start();
        let stale = comparison_ticket(&effects);

        let effects = app.apply(Action::AssignSlot(SlotPosition::C, "solana".to_string()));
        let ticket = comparison_ticket(&effects);

        app.apply(Action::ComparisonLoaded {
            ticket: stale,
            series: ComparisonSeries::default(),
        });
        assert!(app.series.is_none());

        app.apply(Action::ComparisonLoaded {
            ticket,
            series: ComparisonSeries {
                a: vec![PricePoint::new(1, 10.0), PricePoint::new(2, 20.0)],
                b: vec![PricePoint::new(1, 5.0)],
                c: Some(vec![PricePoint::new(2, 1.0)]),
            },
        });
        let view = app.comparison_view();
        assert_eq!(view.columns.len(), 3);
        assert_eq!(view.columns[0].label, "Coin A");
        assert_eq!(view.columns[0].summary.change, Some(100.0));
        assert_eq!(view.rows.len(), 2);
        assert!(!app.comparison.loading);
    }

    #[test]
    fn test_duplicate_slot_rejected_without_fetch() {
        let mut app = App::default();
        let effects = app.apply(Action::AssignSlot(SlotPosition::B, "bitcoin".to_string()));

        assert!(effects.is_empty());
        assert!(app.notice.is_some());
        assert_eq!(app.slots.get(SlotPosition::B), Some("ethereum"));
    }

    #[test]
    fn test_comparison_labels_from_loaded_snapshots() {
        let mut app = App::default();
        let ticket = segment_ticket(&app.start());
        app.apply(Action::SegmentLoaded {
            ticket,
            segment: Segment::Top100,
            coins: Arc::new(vec![CoinSnapshot::new("bitcoin", "Bitcoin", "btc", 60000.0)]),
        });

        let view = app.comparison_view();
        assert_eq!(view.columns[0].label, "Bitcoin (BTC)");
        assert_eq!(view.columns[1].label, "Coin B");
        assert_eq!(app.headline().map(|h| h.price), Some(60000.0));
    }

    #[test]
    fn test_comparison_failure_clears_series() {
        let mut app = App::default();
        let ticket = comparison_ticket(&app.start());
        app.apply(Action::ComparisonFailed {
            ticket,
            error: NetworkFailure::Status(500).into(),
        });

        assert!(app.series.is_none());
        assert_eq!(
            app.comparison.error.as_deref(),
            Some("Le fournisseur a retourné une erreur : HTTP 500")
        );
    }

    #[test]
    fn test_input_submits_to_target() {
        let mut app = App::default();
        let row = app.exit_plan.rows[0].id;

        app.start_input(InputTarget::RowPercent(row));
        assert_eq!(app.input_buffer, "30");
        app.backspace();
        app.backspace();
        app.append_char('5');
        app.append_char('0');
        app.submit_input();

        assert!(!app.is_in_input_mode());
        assert_eq!(app.exit_plan.row(row).unwrap().sell_percent, "50");
    }

    #[test]
    fn test_exit_coin_autofills_entry() {
        let mut app = App::default();
        let ticket = segment_ticket(&app.start());
        app.apply(Action::SegmentLoaded {
            ticket,
            segment: Segment::Top100,
            coins: Arc::new(vec![coin("pepe", "PEPE", 0.0000123)]),
        });

        app.apply(Action::SelectExitCoin("pepe".to_string()));
        assert_eq!(app.exit_plan.entry_price, "0.000012");
    }

    #[test]
    fn test_navigation_clamped() {
        let mut app = App::default();
        app.navigate_down();
        assert_eq!(app.selected_index, 0);

        app.apply(Action::ShowScreen(Screen::ExitPlan));
        app.navigate_down();
        app.navigate_down();
        app.navigate_down();
        assert_eq!(app.selected_row, 2);
        app.apply(Action::RemoveRow(app.selected_row_id().unwrap()));
        assert_eq!(app.selected_row, 1);
    }
}
