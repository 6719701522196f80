// ============================================================================
// Exit plan - Simulation de prise de profits
// ============================================================================
// Paramètres saisis, tableau ligne par ligne, totaux et note de répartition
// ============================================================================

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::engine::ExitReport;
use crate::ui::dashboard::change_style;
use crate::ui::format::{format_money, format_percent, format_tokens, NO_DATA};

pub fn render_exit_plan(frame: &mut Frame, app: &App, area: Rect) {
    let report = app.exit_report();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(5),
            Constraint::Length(6),
        ])
        .split(area);

    render_inputs(frame, app, &report, chunks[0]);
    render_rows(frame, app, &report, chunks[1]);
    render_totals(frame, &report, chunks[2]);
}

fn label(text: &'static str) -> Span<'static> {
    Span::styled(text, Style::default().fg(Color::Gray))
}

/// Le texte saisi est réaffiché tel quel (même non numérique)
fn raw_or_dash(text: &str) -> String {
    if text.trim().is_empty() {
        NO_DATA.to_string()
    } else {
        text.to_string()
    }
}

fn render_inputs(frame: &mut Frame, app: &App, report: &ExitReport, area: Rect) {
    let plan = &app.exit_plan;
    let coin = plan.coin_id.as_deref().unwrap_or(NO_DATA);

    let lines = vec![
        Line::from(vec![
            label("Coin : "),
            Span::styled(coin.to_string(), Style::default().add_modifier(Modifier::BOLD)),
            label("    Entrée : "),
            Span::raw(raw_or_dash(&plan.entry_price)),
            label("    Tokens : "),
            Span::raw(raw_or_dash(&plan.total_tokens)),
        ]),
        Line::from(vec![
            label("Investi : "),
            Span::styled(format_money(report.invested), Style::default().fg(Color::Cyan)),
        ]),
    ];

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Plan de sortie "),
    );
    frame.render_widget(paragraph, area);
}

fn render_rows(frame: &mut Frame, app: &App, report: &ExitReport, area: Rect) {
    let header = Row::new(["Prix cible", "Vente %", "Tokens", "Produit", "Profit", "Profit %"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = report
        .rows
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(raw_or_dash(&row.target_price_text)),
                Cell::from(raw_or_dash(&row.sell_percent_text)),
                Cell::from(format_tokens(row.tokens_sold)),
                Cell::from(format_money(row.proceeds)),
                Cell::from(format_money(row.profit)).style(change_style(row.profit)),
                Cell::from(format_percent(row.profit_percent)).style(change_style(row.profit_percent)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(14),
        Constraint::Length(10),
        Constraint::Length(14),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Take-profits "),
        )
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));

    let mut state = TableState::default();
    if !report.rows.is_empty() {
        state.select(Some(app.selected_row));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_totals(frame: &mut Frame, report: &ExitReport, area: Rect) {
    let summary = &report.summary;

    let mut lines = vec![
        Line::from(vec![
            label("Vendu : "),
            Span::raw(format!(
                "{} ({})",
                format_tokens(summary.sold_tokens),
                format_percent(summary.total_sell_percent).trim_start_matches('+')
            )),
            label("    Restant : "),
            Span::raw(format_tokens(summary.remaining_tokens)),
            label("    Prix moyen : "),
            Span::raw(format_money(summary.average_exit_price)),
        ]),
        Line::from(vec![
            label("Produit : "),
            Span::raw(format_money(summary.total_proceeds)),
            label("    Coût : "),
            Span::raw(format_money(summary.total_cost_basis)),
            label("    Profit : "),
            Span::styled(
                format!(
                    "{} ({})",
                    format_money(summary.total_profit),
                    format_percent(summary.total_profit_percent)
                ),
                change_style(summary.total_profit),
            ),
        ]),
    ];

    if let Some(message) = report.allocation.message() {
        let color = if report.allocation.is_warning() {
            Color::Red
        } else {
            Color::Yellow
        };
        lines.push(Line::from(Span::styled(message, Style::default().fg(color))));
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Totaux "),
    );
    frame.render_widget(paragraph, area);
}
