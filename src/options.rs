use crate::theme::Theme;

/// Display toggles. Independent of each other; live only as long as the
/// reader is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewOptions {
    pub dark_mode: bool,
    pub show_diacritics: bool,
}

impl ViewOptions {
    pub fn theme(&self) -> Theme {
        Theme::from_dark_mode(self.dark_mode)
    }

    pub fn toggle_dark_mode(&mut self) -> Theme {
        self.dark_mode = !self.dark_mode;
        self.theme()
    }

    pub fn toggle_diacritics(&mut self) -> bool {
        self.show_diacritics = !self.show_diacritics;
        self.show_diacritics
    }

    /// Label for the diacritics button, naming what pressing it will do.
    pub fn diacritics_label(&self) -> &'static str {
        if self.show_diacritics {
            "Without marks"
        } else {
            "With marks"
        }
    }
}
