use std::time::{Duration, Instant};

use log::trace;

use crate::pagination::TurnStyle;

pub const TRANSITION_DURATION: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPhase {
    Entering,
    Present,
    Exiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlot {
    pub index: usize,
    pub phase: SlotPhase,
    pub style: Option<TurnStyle>,
}

impl PageSlot {
    /// CSS-style class for the slot, e.g. `page-turn-next-enter`.
    pub fn class_name(&self) -> Option<String> {
        let style = self.style?;
        let suffix = match self.phase {
            SlotPhase::Entering => "enter",
            SlotPhase::Exiting => "exit",
            SlotPhase::Present => return None,
        };
        Some(format!("{}-{suffix}", style.class_name()))
    }
}

/// Enter/exit animation around page changes.
///
/// At most one slot is `Entering` or `Present`; at most one is `Exiting`.
/// Starting a new transition first settles the one in flight, so repeated
/// key presses never leave two pages on screen.
#[derive(Debug)]
pub struct TransitionController {
    duration: Duration,
    current: PageSlot,
    exiting: Option<PageSlot>,
    started_at: Option<Instant>,
}

impl TransitionController {
    pub fn new(index: usize, duration: Duration) -> Self {
        Self {
            duration,
            current: PageSlot {
                index,
                phase: SlotPhase::Present,
                style: None,
            },
            exiting: None,
            started_at: None,
        }
    }

    pub fn begin(&mut self, from: usize, to: usize, style: TurnStyle, now: Instant) {
        self.settle();
        trace!("Transition {from} -> {to} ({})", style.class_name());
        self.exiting = Some(PageSlot {
            index: from,
            phase: SlotPhase::Exiting,
            style: Some(style),
        });
        self.current = PageSlot {
            index: to,
            phase: SlotPhase::Entering,
            style: Some(style),
        };
        self.started_at = Some(now);
        if self.duration.is_zero() {
            self.settle();
        }
    }

    /// Complete the transition if its time is up. Returns true when something
    /// changed and the screen needs a redraw.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.started_at {
            Some(started) if now.saturating_duration_since(started) >= self.duration => {
                self.settle();
                true
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Jump straight to the end state of the running transition.
    pub fn settle(&mut self) {
        self.exiting = None;
        self.current.phase = SlotPhase::Present;
        self.started_at = None;
    }

    pub fn is_animating(&self) -> bool {
        self.started_at.is_some()
    }

    /// 0.0 at the start of a transition, 1.0 once settled.
    pub fn progress(&self, now: Instant) -> f32 {
        match self.started_at {
            Some(started) if !self.duration.is_zero() => {
                let elapsed = now.saturating_duration_since(started).as_secs_f32();
                (elapsed / self.duration.as_secs_f32()).clamp(0.0, 1.0)
            }
            _ => 1.0,
        }
    }

    pub fn current(&self) -> PageSlot {
        self.current
    }

    pub fn exiting(&self) -> Option<PageSlot> {
        self.exiting
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Horizontal shift, in columns, of the entering page. The book reads right
/// to left, so the next page slides in from the left and the previous page
/// from the right.
pub fn slide_offset(style: TurnStyle, progress: f32, max_shift: u16) -> i32 {
    let remaining = ((1.0 - progress.clamp(0.0, 1.0)) * f32::from(max_shift)).round() as i32;
    match style {
        TurnStyle::TurnNext => -remaining,
        TurnStyle::TurnPrev => remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> (TransitionController, Instant) {
        (
            TransitionController::new(0, TRANSITION_DURATION),
            Instant::now(),
        )
    }

    #[test]
    fn starts_present() {
        let (transitions, now) = controller();
        assert_eq!(transitions.current().phase, SlotPhase::Present);
        assert!(transitions.exiting().is_none());
        assert!(!transitions.is_animating());
        assert_eq!(transitions.progress(now), 1.0);
    }

    #[test]
    fn begin_sets_enter_and_exit_slots() {
        let (mut transitions, now) = controller();
        transitions.begin(0, 1, TurnStyle::TurnNext, now);

        let current = transitions.current();
        assert_eq!(current.index, 1);
        assert_eq!(current.phase, SlotPhase::Entering);
        assert_eq!(current.class_name().as_deref(), Some("page-turn-next-enter"));

        let exiting = transitions.exiting().unwrap();
        assert_eq!(exiting.index, 0);
        assert_eq!(exiting.class_name().as_deref(), Some("page-turn-next-exit"));
    }

    #[test]
    fn tick_settles_after_duration() {
        let (mut transitions, now) = controller();
        transitions.begin(2, 1, TurnStyle::TurnPrev, now);

        assert!(transitions.tick(now + Duration::from_millis(100)));
        assert!(transitions.is_animating());

        assert!(transitions.tick(now + TRANSITION_DURATION));
        assert!(!transitions.is_animating());
        assert_eq!(transitions.current().phase, SlotPhase::Present);
        assert_eq!(transitions.current().class_name(), None);
        assert!(transitions.exiting().is_none());

        assert!(!transitions.tick(now + TRANSITION_DURATION * 2));
    }

    #[test]
    fn new_turn_settles_the_previous_one() {
        let (mut transitions, now) = controller();
        transitions.begin(0, 1, TurnStyle::TurnNext, now);
        transitions.begin(1, 2, TurnStyle::TurnNext, now + Duration::from_millis(10));

        // only the page we just left is exiting; page 0 is gone
        assert_eq!(transitions.exiting().unwrap().index, 1);
        assert_eq!(transitions.current().index, 2);
        assert_eq!(transitions.current().phase, SlotPhase::Entering);
    }

    #[test]
    fn progress_is_clamped() {
        let (mut transitions, now) = controller();
        transitions.begin(0, 1, TurnStyle::TurnNext, now);
        assert_eq!(transitions.progress(now), 0.0);
        let half = transitions.progress(now + Duration::from_millis(150));
        assert!((half - 0.5).abs() < 0.01);
        assert_eq!(transitions.progress(now + Duration::from_secs(5)), 1.0);
    }

    #[test]
    fn zero_duration_never_animates() {
        let mut transitions = TransitionController::new(0, Duration::ZERO);
        transitions.begin(0, 1, TurnStyle::TurnNext, Instant::now());
        assert!(!transitions.is_animating());
        assert_eq!(transitions.current().phase, SlotPhase::Present);
    }

    #[test]
    fn slide_direction_follows_style() {
        assert_eq!(slide_offset(TurnStyle::TurnNext, 0.0, 10), -10);
        assert_eq!(slide_offset(TurnStyle::TurnPrev, 0.0, 10), 10);
        assert_eq!(slide_offset(TurnStyle::TurnPrev, 0.5, 10), 5);
        assert_eq!(slide_offset(TurnStyle::TurnNext, 1.0, 10), 0);
    }
}
