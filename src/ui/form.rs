// ============================================================================
// Formulaire d'ajout / édition (modal)
// ============================================================================
// Dessiné par-dessus le dashboard, centré. Un champ par ligne ; le champ
// courant est mis en évidence, les champs à choix affichent ◀ ▶.
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{FormField, WidgetForm};
use crate::ui::theme::Palette;

/// Largeur de la colonne des labels
const LABEL_WIDTH: usize = 14;

/// Dessine le formulaire
pub fn render_form(frame: &mut Frame, form: &WidgetForm, palette: &Palette, area: Rect) {
    let modal = centered_rect(70, 60, area);
    frame.render_widget(Clear, modal);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.positive))
        .title(form.title())
        .title_alignment(Alignment::Center);

    let mut lines: Vec<Line> = FormField::ALL
        .iter()
        .map(|field| field_line(form, *field, palette))
        .collect();

    lines.push(Line::from(""));
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            format!("⚠ {}", error),
            Style::default().fg(palette.negative).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(help_line(palette));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(palette.background));
    frame.render_widget(paragraph, modal);
}

fn field_line<'a>(form: &WidgetForm, field: FormField, palette: &Palette) -> Line<'a> {
    let focused = form.focus == field;
    let value = form.value(field);

    let label_style = if focused {
        Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(palette.muted)
    };

    let value_text = match (field.is_choice(), focused) {
        (true, true) => format!("◀ {} ▶", value),
        (false, true) => format!("{}█", value),
        _ => value,
    };

    Line::from(vec![
        Span::styled(format!(" {:<width$}", field.label(), width = LABEL_WIDTH), label_style),
        Span::styled(value_text, Style::default().fg(palette.text)),
    ])
}

fn help_line<'a>(palette: &Palette) -> Line<'a> {
    let key = Style::default().fg(palette.warning).add_modifier(Modifier::BOLD);
    Line::from(vec![
        Span::styled(" [Tab/↑↓]", key),
        Span::raw(" Field  "),
        Span::styled("[←→]", key),
        Span::raw(" Choice  "),
        Span::styled("[Enter]", key),
        Span::raw(" Save  "),
        Span::styled("[ESC]", key),
        Span::raw(" Cancel"),
    ])
}

/// Rectangle centré, en pourcentage de la zone
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_stays_inside() {
        let area = Rect::new(0, 0, 100, 50);
        let modal = centered_rect(70, 60, area);
        assert!(modal.x >= 15 && modal.right() <= 85);
        assert!(modal.y >= 10 && modal.bottom() <= 40);
    }
}
