//! Text-to-speech integration. The reader never talks to a speech engine
//! directly; it goes through [`Narrator`], which owns an optional
//! [`NarrationEngine`] and makes sure that events from a cancelled utterance
//! can never reach the reader.

use std::io::Write;
use std::process::{Child, Command, Stdio};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};

use crate::error::{NarrationUnavailableReason, ReaderError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
}

impl Voice {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationEvent {
    Finished(UtteranceId),
    Failed(UtteranceId, String),
}

/// A speech engine. `speak` starts an utterance and returns immediately;
/// completion is reported later through `poll_events`.
pub trait NarrationEngine {
    fn list_voices(&self) -> Vec<Voice>;
    fn speak(&mut self, text: &str, voice: &str, utterance: UtteranceId) -> Result<()>;
    fn cancel(&mut self);
    fn poll_events(&mut self) -> Vec<NarrationEvent>;
}

/// What the reader has to act on after polling the narrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationOutcome {
    PageFinished { page: usize },
    Stopped(ReaderError),
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    utterance: UtteranceId,
    page: usize,
}

pub struct Narrator {
    engine: Option<Box<dyn NarrationEngine>>,
    voice: String,
    unavailable: Option<NarrationUnavailableReason>,
    reading: bool,
    in_flight: Option<InFlight>,
    next_utterance: u64,
}

impl Narrator {
    pub fn new(engine: Option<Box<dyn NarrationEngine>>, voice: impl Into<String>) -> Self {
        Self {
            engine,
            voice: voice.into(),
            unavailable: None,
            reading: false,
            in_flight: None,
            next_utterance: 1,
        }
    }

    /// Check that the engine exists and has our voice. On failure narration
    /// stays disabled for the rest of the session.
    pub fn initialize(&mut self) -> Result<(), ReaderError> {
        let reason = match &self.engine {
            None => Some(NarrationUnavailableReason::EngineAbsent),
            Some(engine) => {
                let voices = engine.list_voices();
                debug!("Narration voices: {voices:?}");
                if voices.iter().any(|v| v.name == self.voice) {
                    None
                } else {
                    Some(NarrationUnavailableReason::VoiceMissing(self.voice.clone()))
                }
            }
        };

        match reason {
            Some(reason) => {
                warn!("Narration disabled: {reason}");
                self.unavailable = Some(reason.clone());
                Err(ReaderError::NarrationUnavailable(reason))
            }
            None => {
                info!("Narration ready with voice {:?}", self.voice);
                Ok(())
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.unavailable.is_none() && self.engine.is_some()
    }

    pub fn unavailable_reason(&self) -> Option<&NarrationUnavailableReason> {
        self.unavailable.as_ref()
    }

    pub fn is_reading(&self) -> bool {
        self.reading
    }

    pub fn speaking_page(&self) -> Option<usize> {
        self.in_flight.map(|f| f.page)
    }

    /// Enter reading mode and speak `text` for `page`.
    pub fn start(&mut self, page: usize, text: &str) -> Result<(), ReaderError> {
        if let Some(reason) = &self.unavailable {
            return Err(ReaderError::NarrationUnavailable(reason.clone()));
        }
        if self.engine.is_none() {
            return Err(ReaderError::NarrationUnavailable(
                NarrationUnavailableReason::EngineAbsent,
            ));
        }
        self.reading = true;
        self.speak_page(page, text)
    }

    /// Flip reading mode. Returns whether narration is now on.
    pub fn toggle(&mut self, page: usize, text: &str) -> Result<bool, ReaderError> {
        if self.reading {
            self.stop();
            return Ok(false);
        }
        self.start(page, text).map(|()| true)
    }

    /// Leave reading mode, silencing whatever is being spoken.
    pub fn stop(&mut self) {
        self.cancel_in_flight();
        self.reading = false;
    }

    /// Silence the current utterance. When this returns the engine has been
    /// told to stop and any event it still emits for that utterance will be
    /// discarded. Reading mode is left as it was.
    pub fn cancel_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!(
                "Cancelling utterance {:?} for page {}",
                in_flight.utterance,
                in_flight.page + 1
            );
            if let Some(engine) = self.engine.as_mut() {
                engine.cancel();
            }
        }
    }

    /// Speak `text` for `page`, replacing anything in flight.
    pub fn speak_page(&mut self, page: usize, text: &str) -> Result<(), ReaderError> {
        self.cancel_in_flight();
        let Some(engine) = self.engine.as_mut() else {
            return Ok(());
        };

        let utterance = UtteranceId(self.next_utterance);
        self.next_utterance += 1;

        match engine.speak(text, &self.voice, utterance) {
            Ok(()) => {
                self.in_flight = Some(InFlight { utterance, page });
                Ok(())
            }
            Err(e) => {
                error!("Speech engine refused page {}: {e:#}", page + 1);
                self.reading = false;
                Err(ReaderError::NarrationPlaybackError(format!("{e:#}")))
            }
        }
    }

    /// Drain engine events, dropping any that belong to a cancelled utterance.
    pub fn poll(&mut self) -> Vec<NarrationOutcome> {
        let Some(engine) = self.engine.as_mut() else {
            return Vec::new();
        };

        let mut outcomes = Vec::new();
        for event in engine.poll_events() {
            let (utterance, failure) = match event {
                NarrationEvent::Finished(id) => (id, None),
                NarrationEvent::Failed(id, message) => (id, Some(message)),
            };
            let Some(in_flight) = self.in_flight.filter(|f| f.utterance == utterance) else {
                debug!("Dropping event for stale utterance {utterance:?}");
                continue;
            };
            self.in_flight = None;

            match failure {
                None => outcomes.push(NarrationOutcome::PageFinished {
                    page: in_flight.page,
                }),
                Some(message) => {
                    error!("Narration failed on page {}: {message}", in_flight.page + 1);
                    self.reading = false;
                    outcomes.push(NarrationOutcome::Stopped(
                        ReaderError::NarrationPlaybackError(message),
                    ));
                }
            }
        }
        outcomes
    }
}

impl Drop for Narrator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Speaks through an external program, one process per utterance. The text
/// is written to the program's stdin; `{voice}` in the arguments is replaced
/// with the voice name.
pub struct CommandNarrationEngine {
    program: String,
    args: Vec<String>,
    voices: Vec<Voice>,
    child: Option<(UtteranceId, Child)>,
}

impl CommandNarrationEngine {
    pub fn new(command: &[String], voices: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            voices: voices.iter().map(Voice::new).collect(),
            child: None,
        })
    }
}

impl NarrationEngine for CommandNarrationEngine {
    fn list_voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&mut self, text: &str, voice: &str, utterance: UtteranceId) -> Result<()> {
        self.cancel();

        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.replace("{voice}", voice))
            .collect();
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start {}", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .context("Failed to send text to speech program")?;
        }
        self.child = Some((utterance, child));
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some((_, mut child)) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn poll_events(&mut self) -> Vec<NarrationEvent> {
        let Some((utterance, child)) = self.child.as_mut() else {
            return Vec::new();
        };
        let utterance = *utterance;
        let event = match child.try_wait() {
            Ok(None) => return Vec::new(),
            Ok(Some(status)) if status.success() => NarrationEvent::Finished(utterance),
            Ok(Some(status)) => {
                NarrationEvent::Failed(utterance, format!("{} exited with {status}", self.program))
            }
            Err(e) => NarrationEvent::Failed(utterance, e.to_string()),
        };
        self.child = None;
        vec![event]
    }
}

impl Drop for CommandNarrationEngine {
    fn drop(&mut self) {
        self.cancel();
    }
}
