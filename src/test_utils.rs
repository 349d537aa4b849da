pub mod test_helpers {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use anyhow::Result;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::app::{App, AppConfig, Collaborators};
    use crate::content::BookContent;
    use crate::event_source::{Event, KeyCode, SimulatedEventSource};
    use crate::narration::{NarrationEngine, NarrationEvent, UtteranceId, Voice};
    use crate::share::ShareActions;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::theme::{Theme, ThemeSurface};

    /// Builder for creating test scenarios with simulated user input
    #[derive(Default)]
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn press_key(mut self, code: KeyCode) -> Self {
            self.events.push(SimulatedEventSource::key(code));
            self
        }

        pub fn press_char(self, c: char) -> Self {
            self.press_key(KeyCode::Char(c))
        }

        pub fn press_enter(self) -> Self {
            self.press_key(KeyCode::Enter)
        }

        pub fn press_esc(self) -> Self {
            self.press_key(KeyCode::Esc)
        }

        pub fn type_text(mut self, text: &str) -> Self {
            for c in text.chars() {
                self.events.push(SimulatedEventSource::char_key(c));
            }
            self
        }

        /// Turn forward `times` pages (Left arrow in a right-to-left book)
        pub fn next_page(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::key(KeyCode::Left));
            }
            self
        }

        /// Turn back `times` pages (Right arrow)
        pub fn previous_page(mut self, times: usize) -> Self {
            for _ in 0..times {
                self.events.push(SimulatedEventSource::key(KeyCode::Right));
            }
            self
        }

        /// Open the page form, type `page` and submit it
        pub fn go_to_page(self, page: &str) -> Self {
            self.press_char('g').type_text(page).press_enter()
        }

        pub fn resize(mut self, width: u16, height: u16) -> Self {
            self.events.push(SimulatedEventSource::resize(width, height));
            self
        }

        pub fn quit(self) -> Self {
            self.press_char('q')
        }

        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }

        pub fn len(&self) -> usize {
            self.events.len()
        }

        pub fn is_empty(&self) -> bool {
            self.events.is_empty()
        }
    }

    /// Create a test terminal for snapshot testing
    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// Capture the current terminal buffer as a string
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            lines.push(line.trim_end().to_string());
        }

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        lines.join("\n")
    }

    /// Everything the scripted engine was asked to do, in order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum NarrationCall {
        Speak {
            text: String,
            voice: String,
            utterance: UtteranceId,
        },
        Cancel,
    }

    #[derive(Debug, Default)]
    pub struct NarrationScript {
        pub calls: Vec<NarrationCall>,
        pub pending: Vec<NarrationEvent>,
        pub fail_speak: bool,
    }

    impl NarrationScript {
        pub fn last_utterance(&self) -> Option<UtteranceId> {
            self.calls.iter().rev().find_map(|call| match call {
                NarrationCall::Speak { utterance, .. } => Some(*utterance),
                NarrationCall::Cancel => None,
            })
        }

        pub fn spoken_texts(&self) -> Vec<String> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    NarrationCall::Speak { text, .. } => Some(text.clone()),
                    NarrationCall::Cancel => None,
                })
                .collect()
        }

        pub fn cancel_count(&self) -> usize {
            self.calls
                .iter()
                .filter(|call| **call == NarrationCall::Cancel)
                .count()
        }
    }

    /// Speech engine whose events are queued by the test.
    pub struct ScriptedNarrationEngine {
        voices: Vec<Voice>,
        script: Rc<RefCell<NarrationScript>>,
    }

    impl ScriptedNarrationEngine {
        pub fn new(voices: &[&str]) -> (Self, Rc<RefCell<NarrationScript>>) {
            let script = Rc::new(RefCell::new(NarrationScript::default()));
            let engine = Self {
                voices: voices.iter().map(|name| Voice::new(*name)).collect(),
                script: script.clone(),
            };
            (engine, script)
        }
    }

    impl NarrationEngine for ScriptedNarrationEngine {
        fn list_voices(&self) -> Vec<Voice> {
            self.voices.clone()
        }

        fn speak(&mut self, text: &str, voice: &str, utterance: UtteranceId) -> Result<()> {
            let mut script = self.script.borrow_mut();
            if script.fail_speak {
                anyhow::bail!("scripted speak failure");
            }
            script.calls.push(NarrationCall::Speak {
                text: text.to_string(),
                voice: voice.to_string(),
                utterance,
            });
            Ok(())
        }

        fn cancel(&mut self) {
            self.script.borrow_mut().calls.push(NarrationCall::Cancel);
        }

        fn poll_events(&mut self) -> Vec<NarrationEvent> {
            std::mem::take(&mut self.script.borrow_mut().pending)
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ShareCall {
        Copy(String),
        Open(String),
    }

    /// Share side effects, recorded instead of performed.
    #[derive(Default)]
    pub struct RecordingShareActions {
        pub calls: Rc<RefCell<Vec<ShareCall>>>,
    }

    impl ShareActions for RecordingShareActions {
        fn copy_to_clipboard(&mut self, text: &str) -> std::result::Result<(), String> {
            self.calls.borrow_mut().push(ShareCall::Copy(text.to_string()));
            Ok(())
        }

        fn open_url(&mut self, url: &str) -> std::result::Result<(), String> {
            self.calls.borrow_mut().push(ShareCall::Open(url.to_string()));
            Ok(())
        }
    }

    /// Remembers every theme reflected onto it.
    #[derive(Default)]
    pub struct RecordingSurface {
        pub themes: Rc<RefCell<Vec<Theme>>>,
    }

    impl ThemeSurface for RecordingSurface {
        fn reflect(&mut self, theme: Theme) {
            self.themes.borrow_mut().push(theme);
        }
    }

    /// Handles to the recording collaborators of an app built by
    /// [`TestAppBuilder`].
    pub struct TestHandles {
        pub themes: Rc<RefCell<Vec<Theme>>>,
        pub shares: Rc<RefCell<Vec<ShareCall>>>,
    }

    /// Builds an [`App`] wired to in-memory and recording collaborators.
    /// Transitions are instant and the welcome form is off unless asked for.
    pub struct TestAppBuilder {
        book: BookContent,
        store: Box<dyn KeyValueStore>,
        narration: Option<Box<dyn NarrationEngine>>,
        config: AppConfig,
    }

    impl TestAppBuilder {
        pub fn new(book: BookContent) -> Self {
            let config = AppConfig {
                transition_duration: Duration::ZERO,
                show_welcome: false,
                initial_width: 100,
                ..AppConfig::default()
            };
            Self {
                book,
                store: Box::new(MemoryStore::new()),
                narration: None,
                config,
            }
        }

        pub fn sample() -> Self {
            Self::new(BookContent::sample().unwrap())
        }

        pub fn store(mut self, store: impl KeyValueStore + 'static) -> Self {
            self.store = Box::new(store);
            self
        }

        pub fn narration(mut self, engine: impl NarrationEngine + 'static) -> Self {
            self.narration = Some(Box::new(engine));
            self
        }

        pub fn config(mut self, update: impl FnOnce(&mut AppConfig)) -> Self {
            update(&mut self.config);
            self
        }

        pub fn build(self) -> (App, TestHandles) {
            let surface = RecordingSurface::default();
            let share_actions = RecordingShareActions::default();
            let handles = TestHandles {
                themes: surface.themes.clone(),
                shares: share_actions.calls.clone(),
            };
            let app = App::new(
                self.book,
                Collaborators {
                    store: self.store,
                    narration: self.narration,
                    surface: Box::new(surface),
                    share_actions: Box::new(share_actions),
                },
                self.config,
            );
            (app, handles)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;

    #[test]
    fn test_scenario_builder() {
        let scenario = TestScenarioBuilder::new()
            .next_page(2)
            .previous_page(1)
            .go_to_page("12")
            .quit();

        // g, '1', '2', Enter
        assert_eq!(scenario.len(), 8);
        assert_eq!(scenario.build().remaining(), 8);
    }

    #[test]
    fn test_scripted_engine_tracks_last_utterance() {
        use crate::narration::{NarrationEngine, UtteranceId};

        let (mut engine, script) = ScriptedNarrationEngine::new(&["Hebrew Female"]);
        engine.speak("one", "Hebrew Female", UtteranceId(1)).unwrap();
        engine.cancel();
        engine.speak("two", "Hebrew Female", UtteranceId(2)).unwrap();

        let script = script.borrow();
        assert_eq!(script.last_utterance(), Some(UtteranceId(2)));
        assert_eq!(script.spoken_texts(), vec!["one", "two"]);
        assert_eq!(script.cancel_count(), 1);
    }
}
