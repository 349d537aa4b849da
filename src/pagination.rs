use log::debug;

use crate::error::ReaderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// Animation class for a page change, computed from where we came from and
/// where we landed rather than from the key that was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStyle {
    TurnNext,
    TurnPrev,
}

impl TurnStyle {
    pub fn class_name(&self) -> &'static str {
        match self {
            TurnStyle::TurnNext => "page-turn-next",
            TurnStyle::TurnPrev => "page-turn-prev",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChange {
    pub from: usize,
    pub to: usize,
}

/// Next content index for a directional step. Clamped to `[0, total - 1]`.
pub fn step(index: usize, total: usize, direction: Direction) -> usize {
    let last = total.saturating_sub(1);
    match direction {
        Direction::Forward => (index + 1).min(last),
        Direction::Backward => index.saturating_sub(1),
    }
}

pub fn turn_between(from: usize, to: usize) -> Option<TurnStyle> {
    match to.cmp(&from) {
        std::cmp::Ordering::Greater => Some(TurnStyle::TurnNext),
        std::cmp::Ordering::Less => Some(TurnStyle::TurnPrev),
        std::cmp::Ordering::Equal => None,
    }
}

/// Current position in a book of `total` pages.
#[derive(Debug, Clone)]
pub struct Paginator {
    current: usize,
    direction: Direction,
    total: usize,
}

impl Paginator {
    pub fn new(total: usize) -> Self {
        debug_assert!(total >= 1, "a book has at least one page");
        Self {
            current: 0,
            direction: Direction::Forward,
            total: total.max(1),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current == self.total - 1
    }

    pub fn next(&mut self) -> Option<PageChange> {
        if self.is_last() {
            return None;
        }
        self.direction = Direction::Forward;
        self.move_to(step(self.current, self.total, Direction::Forward))
    }

    pub fn previous(&mut self) -> Option<PageChange> {
        if self.is_first() {
            return None;
        }
        self.direction = Direction::Backward;
        self.move_to(step(self.current, self.total, Direction::Backward))
    }

    /// Jump to a 1-based page number. Direction is left untouched.
    pub fn jump_to(&mut self, page_number: usize) -> Result<Option<PageChange>, ReaderError> {
        if page_number < 1 || page_number > self.total {
            return Err(ReaderError::InvalidPageNumber {
                input: page_number.to_string(),
                total: self.total,
            });
        }
        Ok(self.move_to(page_number - 1))
    }

    /// Jump using raw text typed into the page form.
    pub fn jump_to_input(&mut self, input: &str) -> Result<Option<PageChange>, ReaderError> {
        let trimmed = input.trim();
        match trimmed.parse::<usize>() {
            Ok(page_number) => self.jump_to(page_number).map_err(|_| {
                ReaderError::InvalidPageNumber {
                    input: trimmed.to_string(),
                    total: self.total,
                }
            }),
            Err(_) => Err(ReaderError::InvalidPageNumber {
                input: trimmed.to_string(),
                total: self.total,
            }),
        }
    }

    pub fn progress_label(&self) -> String {
        format!("Page {} of {}", self.current + 1, self.total)
    }

    fn move_to(&mut self, index: usize) -> Option<PageChange> {
        if index == self.current {
            return None;
        }
        let change = PageChange {
            from: self.current,
            to: index,
        };
        debug!("Page {} -> {}", change.from + 1, change.to + 1);
        self.current = index;
        Some(change)
    }
}

/// Fires once per arrival at the last page. Observing the same index again
/// (a redraw, a repeated event) does nothing until the reader leaves and
/// comes back.
#[derive(Debug, Default)]
pub struct CompletionGate {
    last_observed: Option<usize>,
}

impl CompletionGate {
    /// Seed the gate with the index shown at mount so that mounting on the
    /// last page does not count as a completed read.
    pub fn starting_at(index: usize) -> Self {
        Self {
            last_observed: Some(index),
        }
    }

    pub fn observe(&mut self, index: usize, total: usize) -> bool {
        let previous = self.last_observed.replace(index);
        let last = total.saturating_sub(1);
        index == last && previous != Some(last)
    }
}
