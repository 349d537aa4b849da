use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::centered_rect;
use crate::theme::Base16Palette;

pub enum InfoPopupAction {
    Close,
}

pub struct InfoPopup {
    content: &'static str,
    scroll_offset: usize,
}

impl Default for InfoPopup {
    fn default() -> Self {
        Self::new()
    }
}

impl InfoPopup {
    pub fn new() -> Self {
        InfoPopup {
            content: include_str!("../../assets/info.txt"),
            scroll_offset: 0,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let max_content_width = self
            .content
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(60);

        // 2 chars margin each side plus borders
        let width = (max_content_width + 6) as u16;
        let height = area.height.saturating_sub(4).max(5);
        let popup_area = centered_rect(width, height, area);

        f.render_widget(Clear, popup_area);

        let lines: Vec<Line> = self
            .content
            .lines()
            .skip(self.scroll_offset)
            .map(|line| {
                Line::from(Span::styled(
                    format!("  {line}"),
                    Style::default().fg(palette.base_05),
                ))
            })
            .collect();

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(" About - press i or Esc to close ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.base_0a))
                    .style(Style::default().bg(palette.base_00)),
            )
            .wrap(Wrap { trim: false });

        f.render_widget(paragraph, popup_area);
    }

    pub fn scroll_down(&mut self) {
        let max_lines = self.content.lines().count();
        if self.scroll_offset < max_lines.saturating_sub(1) {
            self.scroll_offset += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<InfoPopupAction> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll_down();
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll_up();
                None
            }
            KeyCode::Esc | KeyCode::Char('i') | KeyCode::Char('q') => Some(InfoPopupAction::Close),
            _ => None,
        }
    }
}
