// ============================================================================
// Compare - Performance relative de 2 ou 3 coins
// ============================================================================
// Un graphique ligne par coin, en % depuis le début de la période, sur des
// timestamps communs (lignes fusionnées). Au-dessus : dernier prix et
// variation de chaque coin.
//
// CONCEPTS RATATUI :
// 1. Chart widget avec plusieurs Dataset
// 2. Axe X en timestamps (ms), labels formatés avec chrono
// ============================================================================

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::{App, ComparisonView};
use crate::models::SlotPosition;
use crate::ui::dashboard::change_style;
use crate::ui::format::{format_optional_money, format_optional_percent};

/// Couleur d'une série
fn slot_color(slot: SlotPosition) -> Color {
    match slot {
        SlotPosition::A => Color::Yellow,
        SlotPosition::B => Color::Cyan,
        SlotPosition::C => Color::Magenta,
    }
}

/// Dessine l'écran de comparaison
pub fn render_compare(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.comparison_view();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_summary(frame, &view, chunks[0]);

    if view.rows.is_empty() {
        let message = if app.comparison.loading {
            "Chargement des séries..."
        } else {
            "Pas de données pour cette comparaison"
        };
        render_no_data(frame, chunks[1], message);
        return;
    }

    render_chart(frame, &view, chunks[1]);
}

/// Une colonne par coin : label, dernier prix, variation sur la période
fn render_summary(frame: &mut Frame, view: &ComparisonView, area: Rect) {
    let mut spans = Vec::new();
    for column in &view.columns {
        let change = column.summary.change;
        spans.push(Span::styled(
            format!("{} {} ", column.slot.label(), column.label),
            Style::default()
                .fg(slot_color(column.slot))
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format_optional_money(column.summary.last_price)));
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format_optional_percent(change),
            change.map(change_style).unwrap_or_default(),
        ));
        spans.push(Span::raw("    "));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(format!(" Comparaison · {} ", view.range.label())),
        )
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Points (t, %) d'un slot, uniquement aux timestamps où il est présent
fn slot_points(view: &ComparisonView, slot: SlotPosition) -> Vec<(f64, f64)> {
    view.rows
        .iter()
        .filter_map(|row| row.get(slot).map(|(pct, _)| (row.t as f64, pct)))
        .collect()
}

fn axis_label(t: f64, format: &str) -> Span<'static> {
    let text = DateTime::<Utc>::from_timestamp_millis(t as i64)
        .map(|dt| dt.format(format).to_string())
        .unwrap_or_default();
    Span::raw(text)
}

fn render_chart(frame: &mut Frame, view: &ComparisonView, area: Rect) {
    let series: Vec<(SlotPosition, String, Vec<(f64, f64)>)> = view
        .columns
        .iter()
        .map(|column| (column.slot, column.label.clone(), slot_points(view, column.slot)))
        .collect();

    // Bornes communes à toutes les séries
    let (x_min, x_max, y_min, y_max) = series.iter().flat_map(|(_, _, points)| points.iter()).fold(
        (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
        |(x0, x1, y0, y1), &(x, y)| (x0.min(x), x1.max(x), y0.min(y), y1.max(y)),
    );

    // Marge de 5% (au moins 1 point de %) pour que le graphique respire
    let margin = ((y_max - y_min) * 0.05).max(1.0);
    let (y_min, y_max) = (y_min - margin, y_max + margin);

    let datasets: Vec<Dataset> = series
        .iter()
        .map(|(slot, label, points)| {
            Dataset::default()
                .name(label.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(slot_color(*slot)))
                .data(points)
        })
        .collect();

    let format = view.range.axis_format();
    let x_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([x_min, x_max])
        .labels(vec![
            axis_label(x_min, format),
            axis_label((x_min + x_max) / 2.0, format),
            axis_label(x_max, format),
        ]);

    let y_axis = Axis::default()
        .title("%")
        .style(Style::default().fg(Color::Gray))
        .bounds([y_min, y_max])
        .labels(vec![
            Span::raw(format!("{:+.0}%", y_min)),
            Span::raw(format!("{:+.0}%", (y_min + y_max) / 2.0)),
            Span::raw(format!("{:+.0}%", y_max)),
        ]);

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Performance (%) "),
        )
        .x_axis(x_axis)
        .y_axis(y_axis);

    frame.render_widget(chart, area);
}

/// Message quand il n'y a rien à tracer
fn render_no_data(frame: &mut Frame, area: Rect, message: &str) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(Color::Gray))),
        Line::from(""),
        Line::from(Span::styled(
            "[a b c] Choisir un coin   [h l] Période",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White)),
        )
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}
