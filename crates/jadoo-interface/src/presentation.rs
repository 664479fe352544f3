//! The capability interface between the controller and whatever draws the
//! interface.
//!
//! The controller never touches a terminal, a speaker or a window directly.
//! Everything observable goes through a [`PresentationSink`]: the terminal
//! renderer in production and a recording fake in tests.

use std::fmt;

use jadoo_config::Symbol;
use thiserror::Error;

/// Named visual regions of the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    /// "Press Enter" screen shown while collapsed
    EnterScreen,
    /// Dark monitor background behind the expanded interface
    Backdrop,
    Header,
    Circles,
    Quadrants,
    /// Scrolling glyph column on the right
    Garbage,
    /// Prompt frame around the expected-symbol indicator
    Prompt,
    /// Expected-symbol indicator
    PromptKeys,
    Sending,
    Receiving,
    SeaLeft,
    SeaRight,
}

impl Element {
    /// Elements that only exist while the interface is expanded, excluding
    /// the ambient pair.
    pub const ACTIVE: [Element; 6] = [
        Element::Circles,
        Element::Garbage,
        Element::Prompt,
        Element::Header,
        Element::Quadrants,
        Element::Backdrop,
    ];

    /// Sound-wave pair whose collapse behavior is configurable
    pub const AMBIENT: [Element; 2] = [Element::SeaLeft, Element::SeaRight];

    /// Status labels, hidden whenever the interface collapses
    pub const STATUS: [Element; 2] = [Element::Sending, Element::Receiving];
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Element::EnterScreen => "enter-screen",
            Element::Backdrop => "backdrop",
            Element::Header => "header",
            Element::Circles => "circles",
            Element::Quadrants => "quadrants",
            Element::Garbage => "garbage",
            Element::Prompt => "prompt",
            Element::PromptKeys => "prompt-keys",
            Element::Sending => "sending",
            Element::Receiving => "receiving",
            Element::SeaLeft => "sea-left",
            Element::SeaRight => "sea-right",
        };
        write!(f, "{}", name)
    }
}

/// Audio cues the controller can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Tone bound to a sequence symbol
    Key(Symbol),
    /// Played when the whole sequence has been entered
    Receiving,
}

impl fmt::Display for SoundCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoundCue::Key(symbol) => write!(f, "key {}", symbol),
            SoundCue::Receiving => write!(f, "receiving"),
        }
    }
}

/// Failures of best-effort environment requests.
///
/// None of these are fatal; the controller logs them and carries on.
#[derive(Error, Debug)]
pub enum PresentationError {
    #[error("sound file not found: {0}")]
    SoundMissing(std::path::PathBuf),

    #[error("failed to start audio player '{player}': {source}")]
    Player {
        player: String,
        #[source]
        source: std::io::Error,
    },

    #[error("full presentation unavailable: {0}")]
    Fullscreen(#[source] std::io::Error),

    #[error("terminal output failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Output side of the interface.
///
/// Visibility and text updates are infallible from the controller's point of
/// view; audio and fullscreen requests may fail and are only ever logged.
pub trait PresentationSink {
    fn set_visible(&mut self, element: Element, visible: bool);

    fn set_text(&mut self, element: Element, text: &str);

    fn play_sound(&mut self, cue: SoundCue) -> Result<(), PresentationError>;

    fn request_full_presentation(&mut self) -> Result<(), PresentationError>;

    fn release_full_presentation(&mut self) -> Result<(), PresentationError>;
}

#[cfg(test)]
pub mod testing {
    //! Recording sink used by controller tests

    use super::*;

    /// One call made on a [`RecordingSink`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Effect {
        Visible(Element, bool),
        Text(Element, String),
        Sound(SoundCue),
        RequestFull,
        ReleaseFull,
    }

    /// Records every effect and can be told to fail the best-effort requests.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub effects: Vec<Effect>,
        pub fail_sounds: bool,
        pub fail_fullscreen: bool,
    }

    impl RecordingSink {
        /// Drain recorded effects.
        pub fn take(&mut self) -> Vec<Effect> {
            std::mem::take(&mut self.effects)
        }

        /// Last visibility written for `element`, if any.
        pub fn visible(&self, element: Element) -> Option<bool> {
            self.effects.iter().rev().find_map(|effect| match effect {
                Effect::Visible(e, v) if *e == element => Some(*v),
                _ => None,
            })
        }

        /// Last text written to `element`, if any.
        pub fn text(&self, element: Element) -> Option<&str> {
            self.effects.iter().rev().find_map(|effect| match effect {
                Effect::Text(e, t) if *e == element => Some(t.as_str()),
                _ => None,
            })
        }

        pub fn sounds(&self) -> Vec<SoundCue> {
            self.effects
                .iter()
                .filter_map(|effect| match effect {
                    Effect::Sound(cue) => Some(*cue),
                    _ => None,
                })
                .collect()
        }
    }

    impl PresentationSink for RecordingSink {
        fn set_visible(&mut self, element: Element, visible: bool) {
            self.effects.push(Effect::Visible(element, visible));
        }

        fn set_text(&mut self, element: Element, text: &str) {
            self.effects.push(Effect::Text(element, text.to_string()));
        }

        fn play_sound(&mut self, cue: SoundCue) -> Result<(), PresentationError> {
            self.effects.push(Effect::Sound(cue));
            if self.fail_sounds {
                return Err(PresentationError::SoundMissing(format!("{}.wav", cue).into()));
            }
            Ok(())
        }

        fn request_full_presentation(&mut self) -> Result<(), PresentationError> {
            self.effects.push(Effect::RequestFull);
            if self.fail_fullscreen {
                return Err(PresentationError::Fullscreen(std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    "no fullscreen here",
                )));
            }
            Ok(())
        }

        fn release_full_presentation(&mut self) -> Result<(), PresentationError> {
            self.effects.push(Effect::ReleaseFull);
            if self.fail_fullscreen {
                return Err(PresentationError::Fullscreen(std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    "no fullscreen here",
                )));
            }
            Ok(())
        }
    }
}
