use std::io::{self, Write};

use crossterm::{
    execute,
    style::{Color as TermColor, SetBackgroundColor, SetForegroundColor},
};
use log::debug;
use ratatui::style::Color;

// Color palette structure
#[allow(dead_code)]
#[derive(Clone, Debug, PartialEq)]
pub struct Base16Palette {
    pub base_00: Color, // Background
    pub base_01: Color, // Lighter background
    pub base_02: Color, // Selection background
    pub base_03: Color, // Comments, invisibles
    pub base_04: Color, // Dark foreground
    pub base_05: Color, // Default foreground
    pub base_06: Color, // Light foreground
    pub base_07: Color, // Light background
    pub base_08: Color, // Red
    pub base_09: Color, // Orange
    pub base_0a: Color, // Yellow
    pub base_0b: Color, // Green
    pub base_0c: Color, // Cyan
    pub base_0d: Color, // Blue
    pub base_0e: Color, // Purple
    pub base_0f: Color, // Brown
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

/// The theme is a plain value passed down to every draw call.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn from_dark_mode(dark_mode: bool) -> Self {
        if dark_mode { Theme::Dark } else { Theme::Light }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
        }
    }

    pub fn palette(&self) -> &'static Base16Palette {
        match self {
            Theme::Light => &PAPER_PALETTE,
            Theme::Dark => &NIGHT_PALETTE,
        }
    }
}

// Paper: warm light page, dark ink
static PAPER_PALETTE: Base16Palette = Base16Palette {
    base_00: rgb(0xF7F3EB),
    base_01: rgb(0xEDE7DA),
    base_02: rgb(0xD9D1C0),
    base_03: rgb(0x9A9182),
    base_04: rgb(0x6B6356),
    base_05: rgb(0x3B362E),
    base_06: rgb(0x27231D),
    base_07: rgb(0x111111),
    base_08: rgb(0xC0392B),
    base_09: rgb(0xD35400),
    base_0a: rgb(0xB7950B),
    base_0b: rgb(0x2E8B57),
    base_0c: rgb(0x16A085),
    base_0d: rgb(0x2F6FB2),
    base_0e: rgb(0x8E44AD),
    base_0f: rgb(0x8B5A2B),
};

// Night: mapped from the Oceanic Next scheme
static NIGHT_PALETTE: Base16Palette = Base16Palette {
    base_00: rgb(0x1B2B34),
    base_01: rgb(0x343D46),
    base_02: rgb(0x4F5B66),
    base_03: rgb(0x65737E),
    base_04: rgb(0xA7ADBA),
    base_05: rgb(0xC0C5CE),
    base_06: rgb(0xCDD3DE),
    base_07: rgb(0xF0F4F8),
    base_08: rgb(0xEC5F67),
    base_09: rgb(0xF99157),
    base_0a: rgb(0xFAC863),
    base_0b: rgb(0x99C794),
    base_0c: rgb(0x5FB3B3),
    base_0d: rgb(0x6699CC),
    base_0e: rgb(0xC594C5),
    base_0f: rgb(0xAB7967),
};

impl Base16Palette {
    /// (text, border, background) for the reading surface
    pub fn page_colors(&self) -> (Color, Color, Color) {
        (self.base_06, self.base_03, self.base_00)
    }

    // Buttons in the footer: enabled vs. greyed out at the ends of the book
    pub fn control_colors(&self, enabled: bool) -> (Color, Color) {
        if enabled {
            (self.base_00, self.base_0d)
        } else {
            (self.base_03, self.base_01)
        }
    }
}

/// The one place where the theme leaves the render tree and touches shared
/// state outside it (the terminal's default colours).
pub trait ThemeSurface {
    fn reflect(&mut self, theme: Theme);
}

/// Writes the palette's default colours to the terminal.
pub struct TerminalSurface;

impl ThemeSurface for TerminalSurface {
    fn reflect(&mut self, theme: Theme) {
        let palette = theme.palette();
        let result = execute!(
            io::stdout(),
            SetBackgroundColor(to_term_color(palette.base_00)),
            SetForegroundColor(to_term_color(palette.base_06))
        )
        .and_then(|_| io::stdout().flush());
        if let Err(e) = result {
            debug!("Failed to apply {} theme to terminal: {e}", theme.name());
        }
    }
}

fn to_term_color(color: Color) -> TermColor {
    match color {
        Color::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
        _ => TermColor::Reset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_mode_maps_to_theme() {
        assert_eq!(Theme::from_dark_mode(true), Theme::Dark);
        assert_eq!(Theme::from_dark_mode(false), Theme::Light);
        assert_eq!(Theme::default(), Theme::Light);
    }

    #[test]
    fn themes_have_distinct_backgrounds() {
        assert_ne!(
            Theme::Light.palette().base_00,
            Theme::Dark.palette().base_00
        );
    }

    #[test]
    fn rgb_splits_channels() {
        assert_eq!(rgb(0x1B2B34), Color::Rgb(0x1B, 0x2B, 0x34));
    }

    #[test]
    fn disabled_controls_are_dimmed() {
        let palette = Theme::Dark.palette();
        assert_ne!(palette.control_colors(true), palette.control_colors(false));
    }
}
