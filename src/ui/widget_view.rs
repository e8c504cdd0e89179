// ============================================================================
// Vue de détail d'un widget
// ============================================================================
// Affiche le dernier résultat normalisé du widget sélectionné :
// - KeyValue  : tableau label / valeur
// - Records   : tableau de lignes (colonnes en union)
// - Chart     : graphique ligne
// - Json      : JSON indenté
//
// Sous le contenu : la ligne d'état (fetch en cours / erreur transitoire)
// et le pied "Every Ns · updated ...".
//
// CONCEPTS RATATUI :
// 1. Table widget : lignes, colonnes, header
// 2. Chart widget : Dataset + Axis
// 3. Paragraph avec Wrap pour le JSON
// ============================================================================

use chrono::Utc;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, List, ListItem, Paragraph, Row, Table, Wrap},
    Frame,
};
use serde_json::{Map, Value};

use crate::cycle::{CyclePhase, CycleStatus};
use crate::models::{NormalizedData, Widget};
use crate::ui::format::{
    chart_series, choose_view, column_union, every_label, format_age, format_cell, friendly_label,
    series_bounds, DetailView,
};
use crate::ui::theme::Palette;

/// Dessine le détail d'un widget
pub fn render_widget_detail(
    frame: &mut Frame,
    widget: &Widget,
    status: Option<&CycleStatus>,
    palette: &Palette,
    area: Rect,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title(format!(" {} · {} ", widget.config.name, widget.config.layout.label()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Contenu
            Constraint::Length(1), // État du cycle
            Constraint::Length(1), // Pied
        ])
        .split(inner)
        .to_vec();

    let data = widget.last_data.as_ref();
    match (choose_view(widget.config.layout, data), data) {
        (DetailView::KeyValue, Some(NormalizedData::KeyValue(map))) => {
            render_key_values(frame, map, palette, chunks[0])
        }
        (DetailView::Records, Some(data)) => render_records(frame, &rows_of(data), palette, chunks[0]),
        (DetailView::Chart, Some(data)) => render_series_chart(frame, widget, data, palette, chunks[0]),
        (DetailView::Json, Some(data)) => render_json(frame, data, palette, chunks[0]),
        _ => render_no_data(frame, palette, chunks[0], status),
    }

    render_status_line(frame, status, palette, chunks[1]);

    let footer = Line::from(vec![
        Span::styled(every_label(widget.config.interval), Style::default().fg(palette.muted)),
        Span::raw("  ·  "),
        Span::styled(
            format!("updated {}", format_age(widget.last_updated, Utc::now())),
            Style::default().fg(palette.muted),
        ),
    ]);
    frame.render_widget(Paragraph::new(footer).alignment(Alignment::Right), chunks[2]);
}

/// Lignes JSON d'une donnée normalisée (vue tableau)
fn rows_of(data: &NormalizedData) -> Vec<Value> {
    match data {
        NormalizedData::RecordArray(rows) => rows.clone(),
        NormalizedData::TimeSeries(points) => points.iter().map(|p| p.to_json()).collect(),
        NormalizedData::KeyValue(map) => vec![Value::Object(map.clone())],
    }
}

// ============================================================================
// Tableau label / valeur
// ============================================================================

fn render_key_values(frame: &mut Frame, map: &Map<String, Value>, palette: &Palette, area: Rect) {
    if map.is_empty() {
        render_message(frame, palette, area, "Empty response");
        return;
    }

    let rows: Vec<Row> = map
        .iter()
        .map(|(key, value)| {
            Row::new(vec![
                Cell::from(friendly_label(key).to_string()).style(Style::default().fg(palette.muted)),
                Cell::from(format_cell(Some(value)))
                    .style(Style::default().fg(palette.text).add_modifier(Modifier::BOLD)),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Percentage(40), Constraint::Percentage(60)]);
    frame.render_widget(table, area);
}

// ============================================================================
// Tableau de lignes
// ============================================================================

/// Colonnes en union ; une ligne sans colonnes (valeur simple) est
/// affichée dans la première colonne. Sans aucune colonne : simple liste.
fn render_records(frame: &mut Frame, rows: &[Value], palette: &Palette, area: Rect) {
    if rows.is_empty() {
        render_message(frame, palette, area, "Empty response");
        return;
    }

    let columns = column_union(rows);
    if columns.is_empty() {
        let items: Vec<ListItem> = rows
            .iter()
            .map(|row| ListItem::new(format!(" • {}", format_cell(Some(row)))))
            .collect();
        frame.render_widget(List::new(items).style(Style::default().fg(palette.text)), area);
        return;
    }

    let header = Row::new(columns.iter().map(|c| Cell::from(friendly_label(c).to_string())))
        .style(Style::default().fg(palette.accent).add_modifier(Modifier::BOLD));

    let body: Vec<Row> = rows
        .iter()
        .map(|row| {
            let cells: Vec<Cell> = match row.as_object() {
                Some(fields) => columns
                    .iter()
                    .map(|c| Cell::from(format_cell(fields.get(c))))
                    .collect(),
                None => vec![Cell::from(format_cell(Some(row)))],
            };
            // Ligne d'erreur du fan-out : mise en évidence
            let style = if row.get("error").is_some_and(|e| !e.is_null()) {
                Style::default().fg(palette.negative)
            } else {
                Style::default().fg(palette.text)
            };
            Row::new(cells).style(style)
        })
        .collect();

    let widths = vec![Constraint::Ratio(1, columns.len() as u32); columns.len()];
    let table = Table::new(body, widths).header(header);
    frame.render_widget(table, area);
}

// ============================================================================
// Graphique ligne
// ============================================================================

fn render_series_chart(
    frame: &mut Frame,
    widget: &Widget,
    data: &NormalizedData,
    palette: &Palette,
    area: Rect,
) {
    let series = chart_series(&rows_of(data));
    if series.is_empty() {
        render_message(frame, palette, area, "No numeric series to chart");
        return;
    }

    let points: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .map(|(i, (_, y))| (i as f64, *y))
        .collect();
    let values: Vec<f64> = series.iter().map(|(_, y)| *y).collect();
    let (y_min, y_max) = series_bounds(&values);

    let first_label = series.first().map(|(x, _)| x.clone()).unwrap_or_default();
    let last_label = series.last().map(|(x, _)| x.clone()).unwrap_or_default();

    // Couleur selon la tendance du premier au dernier point
    let rising = values.last() >= values.first();
    let color = if rising { palette.positive } else { palette.negative };

    let datasets = vec![Dataset::default()
        .name(widget.config.effective_chart_field().to_string())
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points)];

    let x_axis = Axis::default()
        .style(Style::default().fg(palette.muted))
        .bounds([0.0, (points.len().saturating_sub(1)).max(1) as f64])
        .labels(vec![Span::raw(first_label), Span::raw(last_label)]);

    let y_axis = Axis::default()
        .style(Style::default().fg(palette.muted))
        .bounds([y_min, y_max])
        .labels(vec![
            Span::raw(format!("{:.2}", y_min)),
            Span::raw(format!("{:.2}", (y_min + y_max) / 2.0)),
            Span::raw(format!("{:.2}", y_max)),
        ]);

    let chart = Chart::new(datasets).x_axis(x_axis).y_axis(y_axis);
    frame.render_widget(chart, area);
}

// ============================================================================
// JSON
// ============================================================================

fn render_json(frame: &mut Frame, data: &NormalizedData, palette: &Palette, area: Rect) {
    let json = data.to_json();
    let text = serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string());

    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(palette.text))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

// ============================================================================
// État et messages
// ============================================================================

/// Ligne d'état : fetch en cours ou erreur transitoire
fn render_status_line(frame: &mut Frame, status: Option<&CycleStatus>, palette: &Palette, area: Rect) {
    let line = match status {
        Some(status) if status.phase == CyclePhase::Fetching => {
            Line::from(Span::styled("⟳ Fetching...", Style::default().fg(palette.warning)))
        }
        Some(CycleStatus { error: Some(error), .. }) => Line::from(Span::styled(
            format!("⚠ {}", error),
            Style::default().fg(palette.negative).add_modifier(Modifier::BOLD),
        )),
        _ => Line::from(""),
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Pas encore de données
fn render_no_data(frame: &mut Frame, palette: &Palette, area: Rect, status: Option<&CycleStatus>) {
    let message = match status {
        Some(CycleStatus { error: Some(_), .. }) => "No data yet",
        _ => "Loading...",
    };
    render_message(frame, palette, area, message);
}

fn render_message(frame: &mut Frame, palette: &Palette, area: Rect, message: &str) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(palette.muted))),
    ];
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), area);
}
