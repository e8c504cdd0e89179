// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine l'interface TUI :
//
//   ┌ header ──────────────────────────────────────┐
//   │ liste des widgets   │ détail du widget choisi │
//   └ footer (raccourcis / confirmations) ─────────┘
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Layout : découpage de l'espace en zones
// 3. Widgets : Block, Paragraph, List
// ============================================================================

use chrono::Utc;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::{App, Screen};
use crate::cycle::CyclePhase;
use crate::ui::form::render_form;
use crate::ui::format::format_age;
use crate::ui::theme::{palette, Palette};
use crate::ui::widget_view::render_widget_detail;

/// Dessine l'interface complète
pub fn render(frame: &mut Frame, app: &App) {
    let palette = palette(app.theme);

    let size = frame.size();
    frame.render_widget(Block::default().style(Style::default().bg(palette.background)), size);

    let chunks = create_layout(size);
    render_header(frame, app, &palette, chunks[0]);
    render_main_content(frame, app, &palette, chunks[1]);
    render_footer(frame, app, &palette, chunks[2]);

    if app.current_screen == Screen::Form {
        if let Some(form) = &app.form {
            render_form(frame, form, &palette, size);
        }
    }
}

/// Crée le layout principal (header, content, footer)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area)
        .to_vec()
}

fn render_header(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title(" Finboard ")
        .title_alignment(Alignment::Center);

    let fetching = app
        .statuses
        .values()
        .filter(|s| s.phase == CyclePhase::Fetching)
        .count();

    let text = Line::from(vec![
        Span::styled(
            format!("{} widgets", app.widgets.len()),
            Style::default().fg(palette.positive).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  ·  {} fetching", fetching), Style::default().fg(palette.muted)),
        Span::styled(format!("  ·  theme {}", app.theme.label()), Style::default().fg(palette.muted)),
    ]);

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Liste à gauche, détail à droite
fn render_main_content(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area)
        .to_vec();

    render_widget_list(frame, app, palette, columns[0]);

    match app.selected_widget() {
        Some(widget) => {
            render_widget_detail(frame, widget, app.status_of(&widget.id), palette, columns[1])
        }
        None => render_empty_board(frame, palette, columns[1]),
    }
}

/// Liste des widgets : nom, layout, intervalle, âge, marqueur d'erreur
fn render_widget_list(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title(" Widgets ");

    if app.widgets.is_empty() {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled("Aucun widget", Style::default().fg(palette.muted))),
        ];
        frame.render_widget(Paragraph::new(text).block(block).alignment(Alignment::Center), area);
        return;
    }

    let now = Utc::now();
    let items: Vec<ListItem> = app
        .widgets
        .iter()
        .enumerate()
        .map(|(index, widget)| {
            let status = app.status_of(&widget.id);
            let marker = match status {
                Some(s) if s.phase == CyclePhase::Fetching => "⟳",
                Some(s) if s.error.is_some() => "⚠",
                _ => " ",
            };
            let style = if status.is_some_and(|s| s.error.is_some()) {
                Style::default().fg(palette.negative)
            } else {
                Style::default().fg(palette.text)
            };

            let line = format!(
                " {} {:<20} {:<6} {:>5}s  {}",
                marker,
                widget.config.name,
                widget.config.layout.label(),
                widget.config.interval,
                format_age(widget.last_updated, now),
            );

            let item = ListItem::new(line).style(style);
            if index == app.selected_index {
                item.style(style.add_modifier(Modifier::BOLD).add_modifier(Modifier::REVERSED))
            } else {
                item
            }
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn render_empty_board(frame: &mut Frame, palette: &Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent));

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Appuyez sur [a] pour ajouter un widget",
            Style::default().fg(palette.muted),
        )),
    ];
    frame.render_widget(Paragraph::new(text).block(block).alignment(Alignment::Center), area);
}

// ============================================================================
// Footer : Instructions
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent));

    let warning = Style::default().fg(palette.warning).add_modifier(Modifier::BOLD);
    let blinking = Style::default()
        .fg(palette.negative)
        .add_modifier(Modifier::BOLD)
        .add_modifier(Modifier::SLOW_BLINK);
    let key = Style::default().fg(palette.warning).add_modifier(Modifier::BOLD);

    let shortcuts = if app.is_awaiting_delete_confirmation() {
        let name = app
            .selected_widget()
            .map(|w| w.config.name.as_str())
            .unwrap_or("?");
        Line::from(vec![
            Span::styled("⚠  Appuyez sur ", warning),
            Span::styled("[d]", blinking),
            Span::styled(
                format!(" à nouveau pour supprimer {} ou autre touche pour annuler ⚠", name),
                warning,
            ),
        ])
    } else if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled("⚠  Appuyez sur ", warning),
            Span::styled("[q]", blinking),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                warning,
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled("[q]", key),
            Span::raw(" Quit  "),
            Span::styled("[↑↓ j k]", key),
            Span::raw(" Navigate  "),
            Span::styled("[J K]", key),
            Span::raw(" Move  "),
            Span::styled("[a]", Style::default().fg(palette.positive).add_modifier(Modifier::BOLD)),
            Span::raw(" Add  "),
            Span::styled("[e]", key),
            Span::raw(" Edit  "),
            Span::styled("[d]", Style::default().fg(palette.negative).add_modifier(Modifier::BOLD)),
            Span::raw(" Delete  "),
            Span::styled("[r/R]", key),
            Span::raw(" Refresh/Force  "),
            Span::styled("[t]", key),
            Span::raw(" Theme"),
        ])
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WidgetConfig;
    use crate::store::WidgetStore;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_render_empty_board() {
        let app = App::new(WidgetStore::in_memory());
        let screen = draw(&app);
        assert!(screen.contains("Finboard"));
        assert!(screen.contains("Aucun widget"));
    }

    #[test]
    fn test_render_widget_and_form() {
        let store = WidgetStore::in_memory();
        store.add(WidgetConfig::new("Apple quote", "https://api.test/quote", 30));
        let mut app = App::new(store);

        let screen = draw(&app);
        assert!(screen.contains("Apple quote"));
        assert!(screen.contains("Every 30s"));

        app.open_add_form();
        let screen = draw(&app);
        assert!(screen.contains("Add widget"));
    }
}
