use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyEventKind, KeyModifiers};
use log::{debug, error, info, warn};
use ratatui::{
    Frame, Terminal,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::content::BookContent;
use crate::counters::{UsageCounters, UsageCounts};
use crate::event_source::{Event, EventSource, KeyCode, KeyEvent};
use crate::narration::{NarrationEngine, NarrationOutcome, Narrator};
use crate::notification::{NotificationLevel, NotificationManager};
use crate::options::ViewOptions;
use crate::pagination::{CompletionGate, PageChange, Paginator, turn_between};
use crate::render::{PageView, layout_lines, narration_text, render};
use crate::settings::Settings;
use crate::share::{ShareActions, ShareInfo};
use crate::storage::KeyValueStore;
use crate::theme::{Base16Palette, Theme, ThemeSurface};
use crate::transition::{TransitionController, slide_offset};
use crate::viewport::{DEFAULT_NARROW_COLUMNS, Viewport};
use crate::widget::info_popup::{InfoPopup, InfoPopupAction};
use crate::widget::page_input::{PageInput, PageInputAction};
use crate::widget::share_popup::{SharePopup, SharePopupAction};
use crate::widget::welcome_popup::{USER_INFO_KEY, WelcomeAction, WelcomePopup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

/// Who asked for a page change. Only the reader's own navigation has to
/// silence the narrator first; narration advances after its utterance ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOrigin {
    User,
    Narration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PageRequest {
    Next,
    Previous,
    Jump(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupKind {
    Welcome,
    Share,
    Info,
    PageInput,
}

enum ActivePopup {
    Welcome(WelcomePopup),
    Share(SharePopup),
    Info(InfoPopup),
    PageInput(PageInput),
}

impl ActivePopup {
    fn kind(&self) -> PopupKind {
        match self {
            ActivePopup::Welcome(_) => PopupKind::Welcome,
            ActivePopup::Share(_) => PopupKind::Share,
            ActivePopup::Info(_) => PopupKind::Info,
            ActivePopup::PageInput(_) => PopupKind::PageInput,
        }
    }
}

/// Everything outside the reader that it talks to.
pub struct Collaborators {
    pub store: Box<dyn KeyValueStore>,
    pub narration: Option<Box<dyn NarrationEngine>>,
    pub surface: Box<dyn ThemeSurface>,
    pub share_actions: Box<dyn ShareActions>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub narration_voice: String,
    pub transition_duration: Duration,
    pub narrow_columns: u16,
    /// Replaces the share URL that comes with the book.
    pub share_url: Option<String>,
    pub show_welcome: bool,
    pub initial_width: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl AppConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            narration_voice: settings.narration_voice.clone(),
            transition_duration: settings.transition_duration(),
            narrow_columns: settings.narrow_columns,
            share_url: settings.share_url.clone(),
            show_welcome: true,
            initial_width: DEFAULT_NARROW_COLUMNS,
        }
    }
}

pub struct App {
    book: BookContent,
    paginator: Paginator,
    completion: CompletionGate,
    transition: TransitionController,
    options: ViewOptions,
    surface: Box<dyn ThemeSurface>,
    store: Box<dyn KeyValueStore>,
    counters: UsageCounters,
    narrator: Narrator,
    narration_notice: Option<String>,
    share_actions: Box<dyn ShareActions>,
    share_url: Option<String>,
    viewport: Viewport,
    popup: Option<ActivePopup>,
    page_scroll: u16,
    pub notifications: NotificationManager,
}

impl App {
    /// Mount the reader: count the view, paint the initial theme, probe the
    /// narration engine and decide whether to greet the reader.
    pub fn new(book: BookContent, collaborators: Collaborators, config: AppConfig) -> Self {
        let Collaborators {
            mut store,
            narration,
            mut surface,
            share_actions,
        } = collaborators;

        let counters = UsageCounters::mount(store.as_mut());
        let counts = counters.counts();
        info!(
            "Opened {:?}: {} pages, view #{}, {} completed reads",
            book.title(),
            book.len(),
            counts.views,
            counts.reads
        );

        let options = ViewOptions::default();
        surface.reflect(options.theme());

        let mut narrator = Narrator::new(narration, config.narration_voice);
        let narration_notice = narrator.initialize().err().map(|e| e.to_string());

        let popup = if config.show_welcome && store.get(USER_INFO_KEY).is_none() {
            Some(ActivePopup::Welcome(WelcomePopup::new()))
        } else {
            None
        };

        let share_url = config
            .share_url
            .or_else(|| book.share_url().map(str::to_string));
        let paginator = Paginator::new(book.len());
        let start = paginator.current();

        Self {
            paginator,
            completion: CompletionGate::starting_at(start),
            transition: TransitionController::new(start, config.transition_duration),
            options,
            surface,
            store,
            counters,
            narrator,
            narration_notice,
            share_actions,
            share_url,
            viewport: Viewport::new(config.narrow_columns, config.initial_width),
            popup,
            page_scroll: 0,
            notifications: NotificationManager::new(),
            book,
        }
    }

    pub fn book(&self) -> &BookContent {
        &self.book
    }

    pub fn current_page(&self) -> usize {
        self.paginator.current()
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn options(&self) -> ViewOptions {
        self.options
    }

    pub fn theme(&self) -> Theme {
        self.options.theme()
    }

    pub fn counts(&self) -> UsageCounts {
        self.counters.counts()
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn is_reading(&self) -> bool {
        self.narrator.is_reading()
    }

    /// Persistent message shown while narration is unavailable.
    pub fn narration_notice(&self) -> Option<&str> {
        self.narration_notice.as_deref()
    }

    pub fn active_popup(&self) -> Option<PopupKind> {
        self.popup.as_ref().map(ActivePopup::kind)
    }

    pub fn transition(&self) -> &TransitionController {
        &self.transition
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn current_view(&self) -> Option<PageView> {
        render(self.paginator.current(), &self.book, &self.options)
    }

    pub fn next_page(&mut self) {
        self.change_page(PageRequest::Next, NavigationOrigin::User);
    }

    pub fn previous_page(&mut self) {
        self.change_page(PageRequest::Previous, NavigationOrigin::User);
    }

    /// Jump to what the reader typed into the page form (1-based).
    pub fn jump_to_input(&mut self, input: &str) {
        self.change_page(
            PageRequest::Jump(input.to_string()),
            NavigationOrigin::User,
        );
    }

    // The request is tried on a copy first so nothing changes when it is
    // invalid or a no-op. Narration is silenced before the index moves.
    fn change_page(&mut self, request: PageRequest, origin: NavigationOrigin) {
        let mut target = self.paginator.clone();
        let result = match &request {
            PageRequest::Next => Ok(target.next()),
            PageRequest::Previous => Ok(target.previous()),
            PageRequest::Jump(input) => target.jump_to_input(input),
        };

        let change = match result {
            Ok(Some(change)) => change,
            Ok(None) => {
                debug!("{request:?} leaves the reader on page {}", self.current_page() + 1);
                return;
            }
            Err(e) => {
                warn!("{e}");
                self.notifications.error(e.to_string());
                return;
            }
        };

        if origin == NavigationOrigin::User && self.narrator.is_reading() {
            self.narrator.cancel_in_flight();
        }

        self.paginator = target;
        self.after_page_change(change);
    }

    fn after_page_change(&mut self, change: PageChange) {
        self.page_scroll = 0;
        if let Some(style) = turn_between(change.from, change.to) {
            self.transition
                .begin(change.from, change.to, style, Instant::now());
        }

        if self.completion.observe(change.to, self.book.len()) {
            let reads = self.counters.record_completed_read(self.store.as_mut());
            info!("Reached the last page, completed reads: {reads}");
        }

        if self.narrator.is_reading() {
            self.speak_current_page();
        }
    }

    fn speak_current_page(&mut self) {
        let Some(view) = self.current_view() else {
            return;
        };
        let text = narration_text(&view);
        if let Err(e) = self.narrator.speak_page(view.index, &text) {
            self.notifications.error(e.to_string());
        }
    }

    pub fn toggle_dark_mode(&mut self) {
        let theme = self.options.toggle_dark_mode();
        debug!("Theme is now {}", theme.name());
        self.surface.reflect(theme);
    }

    pub fn toggle_diacritics(&mut self) {
        let shown = self.options.toggle_diacritics();
        debug!("Diacritics shown: {shown}");
    }

    pub fn toggle_narration(&mut self) {
        if !self.narrator.is_available() {
            let message = self
                .narration_notice
                .clone()
                .unwrap_or_else(|| "Narration is unavailable".to_string());
            self.notifications.warn(message);
            return;
        }
        let Some(view) = self.current_view() else {
            return;
        };
        match self.narrator.toggle(view.index, &narration_text(&view)) {
            Ok(true) => self.notifications.info("Reading aloud"),
            Ok(false) => self.notifications.info("Stopped reading"),
            Err(e) => self.notifications.error(e.to_string()),
        }
    }

    pub fn open_share(&mut self) {
        match &self.share_url {
            Some(url) => {
                let info = ShareInfo {
                    url: url.clone(),
                    page_number: self.current_page() + 1,
                };
                self.popup = Some(ActivePopup::Share(SharePopup::new(info)));
            }
            None => self.notifications.warn("This book has no share link"),
        }
    }

    /// Recompute the narrow-viewport signal from the terminal width.
    pub fn handle_resize(&mut self, width: u16) {
        if self.viewport.resize(width) {
            debug!(
                "Viewport is now {}",
                if self.viewport.is_narrow() { "narrow" } else { "wide" }
            );
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(AppAction::Quit);
        }
        if self.popup.is_some() {
            self.handle_popup_key(key);
            return None;
        }

        match key.code {
            KeyCode::Left | KeyCode::Char(' ') | KeyCode::PageDown | KeyCode::Char('j') => {
                self.next_page()
            }
            KeyCode::Right | KeyCode::Backspace | KeyCode::PageUp | KeyCode::Char('k') => {
                self.previous_page()
            }
            KeyCode::Down => self.page_scroll = self.page_scroll.saturating_add(1),
            KeyCode::Up => self.page_scroll = self.page_scroll.saturating_sub(1),
            KeyCode::Char('d') => self.toggle_dark_mode(),
            KeyCode::Char('n') => self.toggle_diacritics(),
            KeyCode::Char('r') => self.toggle_narration(),
            KeyCode::Char('s') => self.open_share(),
            KeyCode::Char('i') => self.popup = Some(ActivePopup::Info(InfoPopup::new())),
            KeyCode::Char('g') => self.popup = Some(ActivePopup::PageInput(PageInput::new())),
            KeyCode::Char('q') => return Some(AppAction::Quit),
            KeyCode::Esc => {
                if !self.notifications.dismiss_current() {
                    return Some(AppAction::Quit);
                }
            }
            _ => {}
        }
        None
    }

    fn handle_popup_key(&mut self, key: KeyEvent) {
        let Some(popup) = self.popup.as_mut() else {
            return;
        };
        match popup {
            ActivePopup::Welcome(welcome) => match welcome.handle_key(key) {
                Some(WelcomeAction::Submit(profile)) => {
                    self.popup = None;
                    match serde_json::to_string(&profile) {
                        Ok(json) => match self.store.set(USER_INFO_KEY, &json) {
                            Ok(()) => {
                                info!("Saved reader profile for {:?}", profile.name);
                                self.notifications
                                    .info(format!("Welcome, {}!", profile.name));
                            }
                            Err(e) => {
                                error!("Failed to save reader profile: {e}");
                                self.notifications.error("Could not save your details");
                            }
                        },
                        Err(e) => error!("Failed to encode reader profile: {e}"),
                    }
                }
                Some(WelcomeAction::Skip) => {
                    debug!("Welcome form skipped");
                    self.popup = None;
                }
                None => {}
            },
            ActivePopup::Share(share) => match share.handle_key(key) {
                Some(SharePopupAction::Open(url)) => {
                    if let Err(e) = self.share_actions.open_url(&url) {
                        self.notifications.error(format!("Could not open link: {e}"));
                    }
                }
                Some(SharePopupAction::Copy(url)) => {
                    match self.share_actions.copy_to_clipboard(&url) {
                        Ok(()) => share.mark_copied(),
                        Err(e) => self.notifications.error(format!("Could not copy link: {e}")),
                    }
                }
                Some(SharePopupAction::Close) => self.popup = None,
                None => {}
            },
            ActivePopup::Info(info) => {
                if let Some(InfoPopupAction::Close) = info.handle_key(key) {
                    self.popup = None;
                }
            }
            ActivePopup::PageInput(input) => match input.handle_key(key) {
                Some(PageInputAction::Submit(value)) => {
                    self.popup = None;
                    self.jump_to_input(&value);
                }
                Some(PageInputAction::Cancel) => self.popup = None,
                None => {}
            },
        }
    }

    /// Advance time: settle transitions, expire notifications and act on
    /// narration events. Returns true when a redraw is needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = self.transition.tick(now);
        changed |= self.notifications.update();
        if matches!(self.popup, Some(ActivePopup::Share(_))) {
            changed = true;
        }
        for outcome in self.narrator.poll() {
            changed = true;
            self.handle_narration_outcome(outcome);
        }
        changed
    }

    fn handle_narration_outcome(&mut self, outcome: NarrationOutcome) {
        match outcome {
            NarrationOutcome::PageFinished { page } => {
                if page != self.current_page() {
                    debug!("Ignoring narration end for page {}", page + 1);
                    return;
                }
                if self.paginator.is_last() {
                    self.narrator.stop();
                    self.notifications.info("Finished reading the book");
                } else {
                    self.change_page(PageRequest::Next, NavigationOrigin::Narration);
                }
            }
            NarrationOutcome::Stopped(e) => self.notifications.error(e.to_string()),
        }
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let area = f.area();
        self.handle_resize(area.width);
        let palette = self.options.theme().palette();

        let background = Block::default().style(Style::default().bg(palette.base_00));
        f.render_widget(background, area);

        let notice_height = u16::from(self.narration_notice.is_some());
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(notice_height),
                Constraint::Length(2),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_header(f, chunks[0], palette);
        self.render_page(f, chunks[1], palette);
        if let Some(notice) = &self.narration_notice {
            let line = Line::from(Span::styled(
                format!(" Read aloud is off: {notice}"),
                Style::default().fg(palette.base_0a),
            ));
            f.render_widget(Paragraph::new(line), chunks[2]);
        }
        self.render_footer(f, chunks[3], palette);
        self.render_help_bar(f, chunks[4], palette);

        match &self.popup {
            Some(ActivePopup::Welcome(popup)) => popup.render(f, area, palette),
            Some(ActivePopup::Share(popup)) => popup.render(f, area, palette),
            Some(ActivePopup::Info(popup)) => popup.render(f, area, palette),
            Some(ActivePopup::PageInput(popup)) => {
                popup.render(f, area, palette, self.book.len())
            }
            None => {}
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let compact = self.viewport.is_narrow();
        let button = |key: char, label: &str, enabled: bool| {
            let (fg, bg) = palette.control_colors(enabled);
            let text = if compact {
                format!(" {key} ")
            } else {
                format!(" {key} {label} ")
            };
            [Span::styled(text, Style::default().fg(fg).bg(bg)), Span::raw(" ")]
        };

        let theme_label = if self.options.dark_mode {
            "Light mode"
        } else {
            "Dark mode"
        };
        let narration_label = if self.narrator.is_reading() {
            "Stop reading"
        } else {
            "Read aloud"
        };

        let mut spans = Vec::new();
        spans.extend(button('d', theme_label, true));
        spans.extend(button('n', self.options.diacritics_label(), true));
        spans.extend(button('r', narration_label, self.narrator.is_available()));
        spans.extend(button('s', "Share", self.share_url.is_some()));
        spans.extend(button('i', "Info", true));
        spans.extend(button('g', "Go to page", true));

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(spans_width(&spans))])
            .split(area);

        let title = Paragraph::new(Line::from(Span::styled(
            format!(" {}", self.book.title()),
            Style::default()
                .fg(palette.base_07)
                .add_modifier(Modifier::BOLD),
        )));
        f.render_widget(title, columns[0]);
        f.render_widget(Paragraph::new(Line::from(spans)), columns[1]);
    }

    fn render_page(&mut self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let (text_color, border_color, bg_color) = palette.page_colors();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .style(Style::default().fg(text_color).bg(bg_color));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let Some(view) = self.current_view() else {
            return;
        };
        let width = usize::from(inner.width.saturating_sub(2));
        let density = self.viewport.density();
        let lines = layout_lines(&view, palette, density, width);

        let max_scroll = u16::try_from(lines.len())
            .unwrap_or(u16::MAX)
            .saturating_sub(inner.height);
        self.page_scroll = self.page_scroll.min(max_scroll);

        let slot = self.transition.current();
        let offset = match slot.style {
            Some(style) if self.transition.is_animating() => slide_offset(
                style,
                self.transition.progress(Instant::now()),
                inner.width / 3,
            ),
            _ => 0,
        };
        let page_area = shifted(inner, offset);

        // the page being left fills the strip the new page has not covered yet
        if let Some(exiting) = self.transition.exiting().filter(|_| offset != 0) {
            if let Some(exiting_view) = render(exiting.index, &self.book, &self.options) {
                let exiting_lines = layout_lines(&exiting_view, palette, density, width);
                let paragraph = Paragraph::new(exiting_lines)
                    .style(Style::default().add_modifier(Modifier::DIM));
                f.render_widget(paragraph, vacated(inner, page_area));
            }
        }

        let paragraph = Paragraph::new(lines).scroll((self.page_scroll, 0));
        f.render_widget(paragraph, page_area);
    }

    fn render_footer(&self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(40),
                Constraint::Percentage(30),
            ])
            .split(rows[0]);

        let control = |label: &str, enabled: bool| {
            let (fg, bg) = palette.control_colors(enabled);
            Span::styled(format!(" {label} "), Style::default().fg(fg).bg(bg))
        };

        // Right-to-left book: "next" sits on the left
        let next = Paragraph::new(Line::from(control("< Next", !self.paginator.is_last())))
            .alignment(Alignment::Left);
        let progress = Paragraph::new(Line::from(Span::styled(
            self.paginator.progress_label(),
            Style::default().fg(palette.base_05),
        )))
        .alignment(Alignment::Center);
        let previous = Paragraph::new(Line::from(control(
            "Previous >",
            !self.paginator.is_first(),
        )))
        .alignment(Alignment::Right);

        f.render_widget(next, columns[0]);
        f.render_widget(progress, columns[1]);
        f.render_widget(previous, columns[2]);

        let counts = self.counters.counts();
        let counts_line = Paragraph::new(Line::from(Span::styled(
            format!("Views: {} | Completed reads: {}", counts.views, counts.reads),
            Style::default().fg(palette.base_03),
        )))
        .alignment(Alignment::Center);
        f.render_widget(counts_line, rows[1]);
    }

    fn render_help_bar(&self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let (text, color) = if let Some(notification) = self.notifications.current() {
            let color = match notification.level {
                NotificationLevel::Info => palette.base_0b,
                NotificationLevel::Warning => palette.base_0a,
                NotificationLevel::Error => palette.base_08,
            };
            (format!("{} | Esc: Dismiss", notification.message), color)
        } else if self.viewport.is_narrow() {
            (
                "Widen the terminal for the full page layout".to_string(),
                palette.base_04,
            )
        } else {
            (
                "Left/Space: Next | Right/Backspace: Previous | Up/Down: Scroll | q: Quit"
                    .to_string(),
                palette.base_03,
            )
        };
        let help = Paragraph::new(Line::from(Span::styled(text, Style::default().fg(color))))
            .alignment(Alignment::Center);
        f.render_widget(help, area);
    }
}

fn spans_width(spans: &[Span]) -> u16 {
    let width: usize = spans.iter().map(Span::width).sum();
    u16::try_from(width).unwrap_or(u16::MAX)
}

/// `area` moved `offset` columns sideways, clipped to where it started.
fn shifted(area: Rect, offset: i32) -> Rect {
    let shift = u16::try_from(offset.unsigned_abs())
        .unwrap_or(u16::MAX)
        .min(area.width);
    if offset >= 0 {
        Rect {
            x: area.x + shift,
            width: area.width - shift,
            ..area
        }
    } else {
        Rect {
            width: area.width - shift,
            ..area
        }
    }
}

/// The part of `area` left uncovered by `covered`, a horizontal slice of it.
fn vacated(area: Rect, covered: Rect) -> Rect {
    if covered.x > area.x {
        Rect {
            width: covered.x - area.x,
            ..area
        }
    } else {
        Rect {
            x: covered.x + covered.width,
            width: area.width - covered.width,
            ..area
        }
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();
    let mut first_render = true;

    loop {
        let mut events_processed = 0;
        let mut should_quit = false;

        while event_source.poll(Duration::from_millis(0))? && events_processed < 50 {
            let event = event_source.read()?;
            events_processed += 1;
            match event {
                Event::Key(key) => {
                    if app.handle_key_event(key) == Some(AppAction::Quit) {
                        should_quit = true;
                    }
                }
                Event::Resize(cols, _rows) => app.handle_resize(cols),
                _ => {}
            }
            if should_quit {
                break;
            }
        }

        let mut needs_redraw = events_processed > 0 || first_render;
        first_render = false;

        if last_tick.elapsed() >= tick_rate {
            needs_redraw |= app.tick(Instant::now());
            last_tick = Instant::now();
        }

        if needs_redraw {
            terminal.draw(|f| app.draw(f))?;
        }

        if should_quit {
            info!("Closing the reader on page {}", app.current_page() + 1);
            return Ok(());
        }

        if events_processed == 0 {
            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));
            let _ = event_source.poll(timeout);
        }
    }
}
