use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use serde::{Deserialize, Serialize};

use super::centered_rect;
use crate::theme::Base16Palette;

pub const USER_INFO_KEY: &str = "userInfo";
const MAX_FIELD_LEN: usize = 64;

/// What the welcome form captures. Stored as JSON under [`USER_INFO_KEY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Email,
}

pub enum WelcomeAction {
    Submit(UserProfile),
    Skip,
}

pub struct WelcomePopup {
    name: String,
    email: String,
    focus: Field,
    show_name_required: bool,
}

impl Default for WelcomePopup {
    fn default() -> Self {
        Self::new()
    }
}

impl WelcomePopup {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            focus: Field::Name,
            show_name_required: false,
        }
    }

    fn focused_field(&mut self) -> &mut String {
        match self.focus {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<WelcomeAction> {
        match key.code {
            KeyCode::Tab | KeyCode::Down | KeyCode::Up | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Field::Name => Field::Email,
                    Field::Email => Field::Name,
                };
                None
            }
            KeyCode::Char(c) => {
                let field = self.focused_field();
                if field.chars().count() < MAX_FIELD_LEN {
                    field.push(c);
                }
                None
            }
            KeyCode::Backspace => {
                self.focused_field().pop();
                None
            }
            KeyCode::Enter => {
                let name = self.name.trim();
                if name.is_empty() {
                    self.show_name_required = true;
                    self.focus = Field::Name;
                    return None;
                }
                Some(WelcomeAction::Submit(UserProfile {
                    name: name.to_string(),
                    email: self.email.trim().to_string(),
                    captured_at: Utc::now(),
                }))
            }
            KeyCode::Esc => Some(WelcomeAction::Skip),
            _ => None,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let popup_area = centered_rect(50, 10, area);
        f.render_widget(Clear, popup_area);

        let label = Style::default().fg(palette.base_05);
        let field_style = |field: Field| {
            if field == self.focus {
                Style::default()
                    .fg(palette.base_07)
                    .bg(palette.base_02)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(palette.base_06)
            }
        };
        let cursor = |field: Field| if field == self.focus { "_" } else { "" };

        let mut lines = vec![
            Line::from(Span::styled(
                " Welcome! Tell us who is reading.",
                Style::default().fg(palette.base_0d),
            )),
            Line::default(),
            Line::from(vec![
                Span::styled(" Name:            ", label),
                Span::styled(
                    format!("{}{}", self.name, cursor(Field::Name)),
                    field_style(Field::Name),
                ),
            ]),
            Line::from(vec![
                Span::styled(" Email (optional): ", label),
                Span::styled(
                    format!("{}{}", self.email, cursor(Field::Email)),
                    field_style(Field::Email),
                ),
            ]),
            Line::default(),
        ];
        if self.show_name_required {
            lines.push(Line::from(Span::styled(
                " Please enter your name",
                Style::default().fg(palette.base_08),
            )));
        }
        lines.push(Line::from(Span::styled(
            " Enter: start reading  Tab: next field  Esc: skip",
            Style::default().fg(palette.base_03),
        )));

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .title(" Welcome ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.base_0e))
                .style(Style::default().bg(palette.base_00)),
        );
        f.render_widget(paragraph, popup_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn type_text(popup: &mut WelcomePopup, text: &str) {
        for c in text.chars() {
            popup.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
    }

    fn press(popup: &mut WelcomePopup, code: KeyCode) -> Option<WelcomeAction> {
        popup.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn name_is_required() {
        let mut popup = WelcomePopup::new();
        assert!(press(&mut popup, KeyCode::Enter).is_none());
        assert!(popup.show_name_required);
    }

    #[test]
    fn submit_captures_both_fields() {
        let mut popup = WelcomePopup::new();
        type_text(&mut popup, "Dana ");
        press(&mut popup, KeyCode::Tab);
        type_text(&mut popup, "dana@example.org");

        match press(&mut popup, KeyCode::Enter) {
            Some(WelcomeAction::Submit(profile)) => {
                assert_eq!(profile.name, "Dana");
                assert_eq!(profile.email, "dana@example.org");
            }
            _ => panic!("expected submit"),
        }
    }

    #[test]
    fn profile_serializes_without_empty_email() {
        let profile = UserProfile {
            name: "Dana".to_string(),
            email: String::new(),
            captured_at: Utc::now(),
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("email"));
        let back: UserProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }
}
