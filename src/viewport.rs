/// Terminals narrower than this get the compact layout and a hint to widen.
pub const DEFAULT_NARROW_COLUMNS: u16 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Density {
    Comfortable,
    Compact,
}

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    narrow_columns: u16,
    is_narrow: bool,
}

impl Viewport {
    pub fn new(narrow_columns: u16, width: u16) -> Self {
        Self {
            narrow_columns,
            is_narrow: width < narrow_columns,
        }
    }

    /// Recompute from the current width. Returns true when the signal flipped.
    pub fn resize(&mut self, width: u16) -> bool {
        let narrow = width < self.narrow_columns;
        let changed = narrow != self.is_narrow;
        self.is_narrow = narrow;
        changed
    }

    pub fn is_narrow(&self) -> bool {
        self.is_narrow
    }

    pub fn density(&self) -> Density {
        if self.is_narrow {
            Density::Compact
        } else {
            Density::Comfortable
        }
    }
}
