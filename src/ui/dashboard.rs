// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Header (onglets + stat BTC), écran courant, footer (raccourcis, erreur
// en ligne ou ligne de saisie)
//
// Le rendu ne calcule rien : il lit les vues dérivées exposées par App
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Tabs},
    Frame,
};

use crate::app::{App, Screen};
use crate::ui::format::{format_compact_usd, format_money, format_percent, NO_DATA};
use crate::ui::{compare, exit_plan};

/// Dessine l'interface complète
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, app, chunks[0]);

    match app.current_screen {
        Screen::Markets => render_markets(frame, app, chunks[1]),
        Screen::Compare => compare::render_compare(frame, app, chunks[1]),
        Screen::ExitPlan => exit_plan::render_exit_plan(frame, app, chunks[1]),
    }

    if app.is_in_input_mode() {
        render_input_footer(frame, app, chunks[2]);
    } else {
        render_footer(frame, app, chunks[2]);
    }
}

/// Header / contenu / footer
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(4),
        ])
        .split(area)
        .to_vec()
}

/// Style d'une variation (vert si >= 0, rouge sinon)
pub fn change_style(value: f64) -> Style {
    if value >= 0.0 {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Red)
    }
}

// ============================================================================
// Header : onglets et stat BTC
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(34)])
        .split(area);

    let screens = [Screen::Markets, Screen::Compare, Screen::ExitPlan];
    let selected = screens
        .iter()
        .position(|s| *s == app.current_screen)
        .unwrap_or(0);

    let tabs = Tabs::new(screens.iter().map(|s| s.title()).collect::<Vec<_>>())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" CoinScope "),
        )
        .select(selected)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, chunks[0]);

    let stat = match app.headline() {
        Some(btc) => Line::from(vec![
            Span::styled("BTC ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format_money(btc.price)),
            Span::raw("  "),
            Span::styled(format_percent(btc.change_24h), change_style(btc.change_24h)),
        ]),
        None => Line::from(Span::styled(format!("BTC {}", NO_DATA), Style::default().fg(Color::Gray))),
    };
    let paragraph = Paragraph::new(stat)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, chunks[1]);
}

// ============================================================================
// Écran Markets : table des coins
// ============================================================================

fn render_markets(frame: &mut Frame, app: &App, area: Rect) {
    let coins = app.visible_coins();

    let scope = if app.watchlist_active {
        format!("Watchlist ({})", app.watchlist.len())
    } else {
        app.segment.label().to_string()
    };
    let mut title = format!(
        " {} · tri : {} {} ",
        scope,
        app.sort.field.label(),
        app.sort.direction.arrow()
    );
    if !app.search.trim().is_empty() {
        title.push_str(&format!("· recherche : \"{}\" ", app.search.trim()));
    }
    if app.markets.loading {
        title.push_str("· chargement... ");
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    if coins.is_empty() {
        let message = if app.markets.loading {
            "Chargement des données..."
        } else if app.watchlist_active {
            "Aucun coin suivi dans les segments chargés"
        } else {
            "Aucun coin à afficher"
        };
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(message, Style::default().fg(Color::Gray))),
        ])
        .block(block)
        .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(["", "Coin", "Prix", "24h", "Market cap", "Volume 24h"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = coins
        .iter()
        .map(|coin| {
            let star = if app.watchlist.contains(&coin.id) { "★" } else { " " };
            Row::new(vec![
                Cell::from(star).style(Style::default().fg(Color::Yellow)),
                Cell::from(coin.short_label()),
                Cell::from(format_money(coin.price)),
                Cell::from(format_percent(coin.change_24h)).style(change_style(coin.change_24h)),
                Cell::from(format_compact_usd(coin.market_cap)),
                Cell::from(format_compact_usd(coin.volume_24h)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Min(20),
        Constraint::Length(16),
        Constraint::Length(10),
        Constraint::Length(12),
        Constraint::Length(12),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));

    let mut state = TableState::default();
    state.select(Some(app.selected_index));
    frame.render_stateful_widget(table, area, &mut state);
}

// ============================================================================
// Footer : raccourcis, erreurs en ligne
// ============================================================================

fn key(label: &'static str) -> Span<'static> {
    Span::styled(label, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
}

fn shortcuts(screen: Screen) -> Line<'static> {
    let pairs: &[(&'static str, &'static str)] = match screen {
        Screen::Markets => &[
            ("[/]", " Search  "),
            ("[n N]", " Segment  "),
            ("[p c m v]", " Sort  "),
            ("[w]", " Watch  "),
            ("[f]", " Watchlist  "),
            ("[r]", " Refresh  "),
            ("[x]", " Exit plan  "),
        ],
        Screen::Compare => &[
            ("[a b c]", " Set coin  "),
            ("[s]", " Swap A/B  "),
            ("[h l]", " Range  "),
        ],
        Screen::ExitPlan => &[
            ("[e]", " Entry  "),
            ("[t]", " Tokens  "),
            ("[p %]", " Row price/%  "),
            ("[a d]", " Add/Del row  "),
            ("[s]", " Split 30/30/40  "),
            ("[c]", " Coin  "),
            ("[r]", " Reset  "),
        ],
    };

    let mut spans = vec![key("[Tab]"), Span::raw(" Screen  "), key("[q]"), Span::raw(" Quit  ")];
    for &(k, label) in pairs {
        spans.push(key(k));
        spans.push(Span::raw(label));
    }
    Line::from(spans)
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let status = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled("⚠  Appuyez sur ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        let error = match app.current_screen {
            Screen::Markets => app.markets.error.as_deref(),
            Screen::Compare => app.comparison.error.as_deref(),
            Screen::ExitPlan => None,
        };
        match (error, app.notice.as_deref()) {
            (Some(error), _) => Line::from(Span::styled(
                format!("⚠ {}", error),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            (None, Some(notice)) => Line::from(Span::styled(notice.to_string(), Style::default().fg(Color::Yellow))),
            (None, None) => Line::from(""),
        }
    };

    let paragraph = Paragraph::new(vec![shortcuts(app.current_screen), status])
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Footer en mode saisie : prompt, buffer et curseur
fn render_input_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let input_line = Line::from(vec![
        Span::styled(
            app.input_prompt(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.input_buffer.as_str(), Style::default().fg(Color::White)),
        Span::styled("█", Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK)),
    ]);

    let help_line = Line::from(vec![
        Span::styled("[Enter]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw(" Confirm  "),
        Span::styled("[Esc]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw(" Cancel"),
    ]);

    let paragraph = Paragraph::new(vec![input_line, help_line]).block(block);
    frame.render_widget(paragraph, area);
}
