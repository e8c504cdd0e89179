// ============================================================================
// Palette de couleurs
// ============================================================================
// Le thème est un choix de session (touche 't'), jamais persisté.
// ============================================================================

use ratatui::style::Color;

use crate::app::Theme;

/// Couleurs utilisées par le rendu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: Color,
    pub text: Color,
    pub muted: Color,
    pub positive: Color,
    pub negative: Color,
    pub warning: Color,
    pub background: Color,
}

/// Palette d'un thème
pub fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            accent: Color::Cyan,
            text: Color::White,
            muted: Color::Gray,
            positive: Color::Green,
            negative: Color::Red,
            warning: Color::Yellow,
            background: Color::Reset,
        },
        Theme::Light => Palette {
            accent: Color::Blue,
            text: Color::Black,
            muted: Color::DarkGray,
            positive: Color::Green,
            negative: Color::Red,
            warning: Color::Magenta,
            background: Color::White,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palettes_differ() {
        assert_ne!(palette(Theme::Dark), palette(Theme::Light));
        assert_eq!(palette(Theme::Light).text, Color::Black);
    }
}
