use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::centered_rect;
use crate::theme::Base16Palette;

const MAX_DIGITS: usize = 6;

pub enum PageInputAction {
    Submit(String),
    Cancel,
}

/// The "go to page" form. Accepts digits only.
#[derive(Default)]
pub struct PageInput {
    buffer: String,
}

impl PageInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.buffer
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<PageInputAction> {
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if self.buffer.len() < MAX_DIGITS {
                    self.buffer.push(c);
                }
                None
            }
            KeyCode::Backspace => {
                self.buffer.pop();
                None
            }
            KeyCode::Enter => Some(PageInputAction::Submit(std::mem::take(&mut self.buffer))),
            KeyCode::Esc => Some(PageInputAction::Cancel),
            _ => None,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, palette: &Base16Palette, total: usize) {
        let popup_area = centered_rect(32, 3, area);
        f.render_widget(Clear, popup_area);

        let line = Line::from(vec![
            Span::styled(
                format!(" Page (1-{total}): "),
                Style::default().fg(palette.base_05),
            ),
            Span::styled(
                format!("{}_", self.buffer),
                Style::default()
                    .fg(palette.base_07)
                    .add_modifier(Modifier::BOLD),
            ),
        ]);

        let paragraph = Paragraph::new(line).block(
            Block::default()
                .title(" Go to page ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.base_0d))
                .style(Style::default().bg(palette.base_00)),
        );
        f.render_widget(paragraph, popup_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn only_digits_are_accepted() {
        let mut input = PageInput::new();
        for c in ['1', 'x', '2', '-'] {
            input.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(input.value(), "12");
        input.handle_key(key(KeyCode::Backspace));
        assert_eq!(input.value(), "1");
    }

    #[test]
    fn enter_submits_and_clears() {
        let mut input = PageInput::new();
        input.handle_key(key(KeyCode::Char('4')));
        match input.handle_key(key(KeyCode::Enter)) {
            Some(PageInputAction::Submit(value)) => assert_eq!(value, "4"),
            _ => panic!("expected submit"),
        }
        assert_eq!(input.value(), "");
    }

    #[test]
    fn input_length_is_capped() {
        let mut input = PageInput::new();
        for _ in 0..20 {
            input.handle_key(key(KeyCode::Char('9')));
        }
        assert_eq!(input.value().len(), MAX_DIGITS);
    }
}
