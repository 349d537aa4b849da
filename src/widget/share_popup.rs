use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::centered_rect;
use crate::share::{ShareInfo, ShareTarget, share_targets};
use crate::theme::Base16Palette;

const COPIED_FEEDBACK: Duration = Duration::from_secs(2);
const AUTHOR_LINES: [&str; 2] = ["Author: the pagebook team", "Contact: pagebook@example.org"];

pub enum SharePopupAction {
    Open(String),
    Copy(String),
    Close,
}

pub struct SharePopup {
    info: ShareInfo,
    targets: Vec<ShareTarget>,
    // index into targets; targets.len() is the "copy link" row
    selected: usize,
    copied_until: Option<Instant>,
}

impl SharePopup {
    pub fn new(info: ShareInfo) -> Self {
        let targets = share_targets(&info);
        Self {
            info,
            targets,
            selected: 0,
            copied_until: None,
        }
    }

    pub fn info(&self) -> &ShareInfo {
        &self.info
    }

    pub fn mark_copied(&mut self) {
        self.copied_until = Some(Instant::now() + COPIED_FEEDBACK);
    }

    fn shows_copied(&self) -> bool {
        self.copied_until.is_some_and(|until| Instant::now() < until)
    }

    fn row_count(&self) -> usize {
        self.targets.len() + 1
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<SharePopupAction> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => {
                self.selected = (self.selected + 1) % self.row_count();
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = (self.selected + self.row_count() - 1) % self.row_count();
                None
            }
            KeyCode::Char('c') => Some(SharePopupAction::Copy(self.info.url.clone())),
            KeyCode::Enter => match self.targets.get(self.selected) {
                Some(target) => Some(SharePopupAction::Open(target.url.clone())),
                None => Some(SharePopupAction::Copy(self.info.url.clone())),
            },
            KeyCode::Esc | KeyCode::Char('s') | KeyCode::Char('q') => {
                Some(SharePopupAction::Close)
            }
            _ => None,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let height = (self.row_count() + AUTHOR_LINES.len() + 6) as u16;
        let popup_area = centered_rect(52, height, area);
        f.render_widget(Clear, popup_area);

        let normal = Style::default().fg(palette.base_05);
        let selected = Style::default()
            .fg(palette.base_07)
            .bg(palette.base_02)
            .add_modifier(Modifier::BOLD);
        let row_style = |i: usize| if i == self.selected { selected } else { normal };

        let mut lines = vec![
            Line::from(Span::styled(
                format!(" {} (page {})", self.info.url, self.info.page_number),
                Style::default().fg(palette.base_04),
            )),
            Line::default(),
        ];
        for (i, target) in self.targets.iter().enumerate() {
            lines.push(Line::from(Span::styled(
                format!(" > {}", target.name),
                row_style(i),
            )));
        }
        let copy_label = if self.shows_copied() {
            " Link copied!"
        } else {
            " Copy link"
        };
        lines.push(Line::from(Span::styled(
            copy_label,
            row_style(self.targets.len()),
        )));
        lines.push(Line::default());
        for author_line in AUTHOR_LINES {
            lines.push(Line::from(Span::styled(
                format!(" {author_line}"),
                Style::default().fg(palette.base_03),
            )));
        }

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .title(" Share the book ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.base_0b))
                .style(Style::default().bg(palette.base_00)),
        );
        f.render_widget(paragraph, popup_area);
    }
}
