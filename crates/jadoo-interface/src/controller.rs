//! Presentation controller
//!
//! Bridges classified key input and timer completions to the
//! [`SequenceMatcher`] and turns its verdicts into effects on a
//! [`PresentationSink`].
//!
//! # Modes
//!
//! ```text
//!            Enter                          Enter
//!  INACTIVE ───────► ACTIVE ◄──────────────────────────── INACTIVE
//!  (enter screen)    │ reset matcher, show interface,
//!                    │ request fullscreen
//!                    │
//!                    ├─ Advanced  ─► cue, SENDING..., sync indicator in 200 ms
//!                    ├─ Completed ─► cue, RECEIVING for 3000 ms, then reset
//!                    └─ Rejected  ─► nothing
//!
//!  ACTIVE ──Enter──► INACTIVE: cancel timers, reset matcher, release
//!                    fullscreen, hide interface
//! ```
//!
//! # Timers
//!
//! Both delays run as [`Scheduler`] tasks whose events come back through the
//! event loop, so every state change happens on one task. Leaving the active
//! mode cancels pending timers and bumps the epoch; a timer event that was
//! already queued carries the old epoch and is dropped.

use std::time::Duration;

use jadoo_config::{AmbientPolicy, Symbol};

use crate::input::KeyInput;
use crate::matcher::{KeySequence, MatchResult, SequenceMatcher};
use crate::presentation::{Element, PresentationSink, SoundCue};
use crate::timers::{Scheduler, TimerEvent, TimerHandle, TimerKind};

/// Delay between an accepted key and the indicator showing the next one
pub const ADVANCE_DISPLAY_DELAY: Duration = Duration::from_millis(200);

/// How long "RECEIVING" stays up before the sequence re-arms
pub const COMPLETION_WINDOW: Duration = Duration::from_millis(3000);

const SENDING_TEXT: &str = "SENDING...";
const RECEIVING_TEXT: &str = "RECEIVING";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Inactive,
    Active,
}

pub struct PresentationController<S> {
    sink: S,
    matcher: SequenceMatcher,
    mode: Mode,
    ambient: AmbientPolicy,
    scheduler: Scheduler,
    pending: Vec<TimerHandle>,
    epoch: u64,
}

impl<S: PresentationSink> PresentationController<S> {
    pub fn new(
        sink: S,
        sequence: KeySequence,
        ambient: AmbientPolicy,
        scheduler: Scheduler,
    ) -> Self {
        Self {
            sink,
            matcher: SequenceMatcher::new(sequence),
            mode: Mode::Inactive,
            ambient,
            scheduler,
            pending: Vec::new(),
            epoch: 0,
        }
    }

    /// Draw the collapsed interface. Called once before the first event.
    pub fn show_initial(&mut self) {
        self.sink.set_visible(Element::EnterScreen, true);
        for element in Element::ACTIVE
            .into_iter()
            .chain(Element::STATUS)
            .chain(Element::AMBIENT)
        {
            self.sink.set_visible(element, false);
        }
    }

    /// Handle one classified key. `Quit` is left to the event loop.
    pub fn handle_input(&mut self, input: KeyInput) {
        match input {
            KeyInput::Activate => self.toggle_mode(),
            KeyInput::Symbol(symbol) => {
                self.handle_symbol(symbol);
            }
            KeyInput::Quit => {}
        }
    }

    pub fn toggle_mode(&mut self) {
        match self.mode {
            Mode::Inactive => self.activate(),
            Mode::Active => self.deactivate(),
        }
    }

    /// Feed a sequence symbol to the matcher and perform the resulting effects.
    pub fn handle_symbol(&mut self, symbol: Symbol) -> MatchResult {
        let result = self.matcher.try_advance(symbol);
        tracing::debug!(
            "Symbol {} -> {:?} (position {})",
            symbol,
            result,
            self.matcher.state().position
        );

        match result {
            MatchResult::Rejected => {}
            MatchResult::Advanced => {
                self.play(SoundCue::Key(symbol));
                self.sink.set_visible(Element::Receiving, false);
                self.sink.set_visible(Element::Sending, true);
                self.sink.set_text(Element::Sending, SENDING_TEXT);
                self.schedule(ADVANCE_DISPLAY_DELAY, TimerKind::AdvanceDisplay);
            }
            MatchResult::Completed => {
                tracing::info!("Sequence complete, receiving");
                self.play(SoundCue::Key(symbol));
                self.sync_indicator();
                self.sink.set_visible(Element::Sending, false);
                self.sink.set_visible(Element::Receiving, true);
                self.sink.set_text(Element::Receiving, RECEIVING_TEXT);
                self.play(SoundCue::Receiving);
                self.schedule(COMPLETION_WINDOW, TimerKind::CompletionWindow);
            }
        }

        result
    }

    pub fn handle_timer(&mut self, event: TimerEvent) {
        if event.epoch != self.epoch {
            tracing::debug!("Dropping stale {:?} timer", event.kind);
            return;
        }

        match event.kind {
            TimerKind::AdvanceDisplay => self.sync_indicator(),
            TimerKind::CompletionWindow => {
                self.sink.set_visible(Element::Receiving, false);
                self.matcher.reset();
                self.sync_indicator();
                tracing::debug!("Sequence re-armed");
            }
        }
    }

    /// Collapse the interface if it is expanded, releasing fullscreen.
    pub fn shutdown(&mut self) {
        if self.mode == Mode::Active {
            self.deactivate();
        }
    }

    fn activate(&mut self) {
        tracing::info!("Interface activated");
        self.mode = Mode::Active;
        self.cancel_timers();

        self.sink.set_visible(Element::EnterScreen, false);
        for element in Element::ACTIVE.into_iter().chain(Element::AMBIENT) {
            self.sink.set_visible(element, true);
        }

        self.matcher.reset();
        self.matcher.set_enabled(true);
        self.sync_indicator();

        if let Err(e) = self.sink.request_full_presentation() {
            tracing::warn!("Fullscreen request failed: {}", e);
        }
    }

    fn deactivate(&mut self) {
        tracing::info!("Interface deactivated");
        self.mode = Mode::Inactive;
        self.cancel_timers();

        self.matcher.set_enabled(false);
        self.matcher.reset();

        if let Err(e) = self.sink.release_full_presentation() {
            tracing::warn!("Leaving fullscreen failed: {}", e);
        }

        for element in Element::ACTIVE.into_iter().chain(Element::STATUS) {
            self.sink.set_visible(element, false);
        }
        if self.ambient == AmbientPolicy::FollowMode {
            for element in Element::AMBIENT {
                self.sink.set_visible(element, false);
            }
        }
        self.sink.set_visible(Element::EnterScreen, true);
    }

    fn sync_indicator(&mut self) {
        let text = self
            .matcher
            .expected_symbol()
            .map(|symbol| symbol.to_string())
            .unwrap_or_default();
        self.sink.set_text(Element::PromptKeys, &text);
    }

    fn play(&mut self, cue: SoundCue) {
        if let Err(e) = self.sink.play_sound(cue) {
            tracing::warn!("Could not play {} cue: {}", cue, e);
        }
    }

    fn schedule(&mut self, delay: Duration, kind: TimerKind) {
        self.pending.retain(|timer| !timer.is_finished());
        let event = TimerEvent {
            kind,
            epoch: self.epoch,
        };
        self.pending.push(self.scheduler.schedule(delay, event));
    }

    fn cancel_timers(&mut self) {
        for timer in self.pending.drain(..) {
            timer.cancel();
        }
        self.epoch += 1;
    }
}

#[cfg(test)]
impl<S> PresentationController<S> {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn matcher(&self) -> &SequenceMatcher {
        &self.matcher
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Number of timers scheduled and not yet fired or cancelled.
    pub fn pending_timers(&self) -> usize {
        self.pending.iter().filter(|t| !t.is_finished()).count()
    }
}
