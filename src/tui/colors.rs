//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::db::Theme;
use crate::fields::Priority;

pub const CRITICAL_RED: Color = Color::Rgb(230, 57, 70);
pub const HIGH_ORANGE: Color = Color::Rgb(244, 162, 97);
pub const MEDIUM_BLUE: Color = Color::Rgb(58, 134, 255);
pub const LOW_GREEN: Color = Color::Rgb(46, 204, 113);

/// Accent used for a card's priority badge and its selected border.
pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Critical => CRITICAL_RED,
        Priority::High => HIGH_ORANGE,
        Priority::Medium => MEDIUM_BLUE,
        Priority::Low => LOW_GREEN,
    }
}

/// Background and foreground of an unselected card.
pub fn card_colors(theme: Theme) -> (Color, Color) {
    match theme {
        Theme::Light => (Color::Rgb(233, 236, 239), Color::Black),
        Theme::Dark => (Color::DarkGray, Color::White),
    }
}

/// Background of popups and the status bar.
pub fn panel_color(theme: Theme) -> Color {
    match theme {
        Theme::Light => Color::White,
        Theme::Dark => Color::Black,
    }
}

/// Parse a `#rrggbb` category colour.
pub fn hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_color_parses_category_colors() {
        assert_eq!(hex_color("#3a86ff"), Some(Color::Rgb(0x3a, 0x86, 0xff)));
        assert_eq!(hex_color("3a86ff"), None);
        assert_eq!(hex_color("#fff"), None);
        assert_eq!(hex_color("#zzzzzz"), None);
    }
}
