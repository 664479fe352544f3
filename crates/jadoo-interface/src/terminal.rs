//! Terminal renderer
//!
//! [`TerminalSink`] is the production [`PresentationSink`]. It keeps a
//! [`Screen`] model of which elements are visible and what they say, and
//! redraws the whole terminal after every change. Full presentation is the
//! terminal's alternate screen.

use std::collections::{HashMap, HashSet};
use std::io::{self, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};

use crate::audio::AudioPlayer;
use crate::presentation::{Element, PresentationError, PresentationSink, SoundCue};

const PHOSPHOR: Color = Color::Rgb { r: 0x9b, g: 0xd8, b: 0x6a };
const DIM: Color = Color::Rgb { r: 0x4f, g: 0x6b, b: 0x3c };
const MAGENTA: Color = Color::Rgb { r: 0xff, g: 0x3c, b: 0xe6 };
const MONITOR: Color = Color::Rgb { r: 0x16, g: 0x19, b: 0x13 };

const CIRCLES: [&str; 3] = [" .-.   .-.   .-. ", "( o ) ( O ) ( o )", " '-'   '-'   '-' "];
const QUADRANTS: [&str; 5] = ["┌───┬───┐", "│▓▓▓│░░░│", "├───┼───┤", "│░░░│▓▓▓│", "└───┴───┘"];
const GARBAGE: [&str; 8] = [
    "⌖⍜⎈⏃", "⍙⏁⎎⌰", "⟟⏃⊑⍜", "⎍⋏⟒⌇", "⏚⍀⟟⌰", "⊬⍜⋔⏃", "⌿⟒⎅⍙", "⋉⏃⊑⍜",
];
const SEA: &str = "∿∿∿∿∿∿∿∿∿∿∿∿∿∿∿∿∿∿∿∿";

/// A piece of text at a fixed terminal position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub row: u16,
    pub col: u16,
    pub text: String,
    pub color: Color,
}

impl Span {
    fn new(row: u16, col: u16, text: impl Into<String>, color: Color) -> Self {
        Self {
            row,
            col,
            text: text.into(),
            color,
        }
    }
}

/// What is currently on screen, independent of any terminal
#[derive(Debug, Default)]
pub struct Screen {
    visible: HashSet<Element>,
    texts: HashMap<Element, String>,
}

impl Screen {
    pub fn set_visible(&mut self, element: Element, visible: bool) {
        if visible {
            self.visible.insert(element);
        } else {
            self.visible.remove(&element);
        }
    }

    pub fn set_text(&mut self, element: Element, text: &str) {
        self.texts.insert(element, text.to_string());
    }

    pub fn is_visible(&self, element: Element) -> bool {
        self.visible.contains(&element)
    }

    fn text(&self, element: Element) -> &str {
        self.texts.get(&element).map(String::as_str).unwrap_or("")
    }

    /// Lay out every visible element.
    pub fn spans(&self) -> Vec<Span> {
        let mut spans = Vec::new();

        if self.is_visible(Element::EnterScreen) {
            spans.push(Span::new(6, 12, "▶  PRESS ENTER TO OPEN THE CHANNEL  ◀", PHOSPHOR));
            spans.push(Span::new(8, 22, "esc to leave", DIM));
        }
        if self.is_visible(Element::Header) {
            spans.push(Span::new(0, 2, "JADOO ░ ALIEN INTERFACE SYSTEM", PHOSPHOR));
        }
        if self.is_visible(Element::Circles) {
            for (i, line) in CIRCLES.iter().enumerate() {
                spans.push(Span::new(2 + i as u16, 2, *line, PHOSPHOR));
            }
        }
        if self.is_visible(Element::Quadrants) {
            for (i, line) in QUADRANTS.iter().enumerate() {
                spans.push(Span::new(2 + i as u16, 24, *line, DIM));
            }
        }
        if self.is_visible(Element::Garbage) {
            for (i, line) in GARBAGE.iter().enumerate() {
                spans.push(Span::new(1 + i as u16, 40, *line, DIM));
            }
        }
        if self.is_visible(Element::Prompt) {
            let keys = self.text(Element::PromptKeys);
            let keys = if keys.is_empty() { " " } else { keys };
            spans.push(Span::new(10, 2, format!("KEY › [ {} ]", keys), PHOSPHOR));
        }
        if self.is_visible(Element::Sending) {
            spans.push(Span::new(12, 2, self.text(Element::Sending), PHOSPHOR));
        }
        if self.is_visible(Element::Receiving) {
            spans.push(Span::new(12, 2, self.text(Element::Receiving), MAGENTA));
        }
        if self.is_visible(Element::SeaLeft) {
            spans.push(Span::new(14, 2, SEA, DIM));
        }
        if self.is_visible(Element::SeaRight) {
            spans.push(Span::new(14, 26, SEA, DIM));
        }

        spans
    }
}

/// Draws the interface on the controlling terminal and plays its cues.
pub struct TerminalSink<W: Write = Stdout> {
    screen: Screen,
    out: W,
    audio: AudioPlayer,
    full: bool,
}

impl TerminalSink {
    /// Put the terminal in raw mode. Restored on drop.
    pub fn new(audio: AudioPlayer) -> Result<Self, PresentationError> {
        Self::with_output(audio, io::stdout())
    }
}

impl<W: Write> TerminalSink<W> {
    fn with_output(audio: AudioPlayer, out: W) -> Result<Self, PresentationError> {
        terminal::enable_raw_mode()?;
        // From here on Drop undoes raw mode, even if hiding the cursor fails
        let mut sink = Self {
            screen: Screen::default(),
            out,
            audio,
            full: false,
        };
        execute!(sink.out, Hide)?;

        Ok(sink)
    }

    fn redraw(&mut self) -> io::Result<()> {
        let background = if self.screen.is_visible(Element::Backdrop) {
            MONITOR
        } else {
            Color::Reset
        };

        queue!(self.out, SetBackgroundColor(background), Clear(ClearType::All))?;
        for span in self.screen.spans() {
            queue!(
                self.out,
                MoveTo(span.col, span.row),
                SetForegroundColor(span.color),
                Print(&span.text)
            )?;
        }
        queue!(self.out, ResetColor)?;
        self.out.flush()
    }

    fn refresh(&mut self) {
        if let Err(e) = self.redraw() {
            tracing::warn!("Redrawing the terminal failed: {}", e);
        }
    }
}

impl<W: Write> PresentationSink for TerminalSink<W> {
    fn set_visible(&mut self, element: Element, visible: bool) {
        self.screen.set_visible(element, visible);
        self.refresh();
    }

    fn set_text(&mut self, element: Element, text: &str) {
        self.screen.set_text(element, text);
        self.refresh();
    }

    fn play_sound(&mut self, cue: SoundCue) -> Result<(), PresentationError> {
        self.audio.play(cue)
    }

    fn request_full_presentation(&mut self) -> Result<(), PresentationError> {
        if !self.full {
            execute!(self.out, EnterAlternateScreen).map_err(PresentationError::Fullscreen)?;
            self.full = true;
            self.refresh();
        }
        Ok(())
    }

    fn release_full_presentation(&mut self) -> Result<(), PresentationError> {
        if self.full {
            execute!(self.out, LeaveAlternateScreen).map_err(PresentationError::Fullscreen)?;
            self.full = false;
            self.refresh();
        }
        Ok(())
    }
}

impl<W: Write> Drop for TerminalSink<W> {
    fn drop(&mut self) {
        if self.full {
            let _ = execute!(self.out, LeaveAlternateScreen);
        }
        let _ = execute!(self.out, ResetColor, Show);
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::warn!("Could not restore the terminal: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jadoo_config::SoundConfig;

    struct BrokenOutput;

    impl Write for BrokenOutput {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "output closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "output closed"))
        }
    }

    fn texts(screen: &Screen) -> Vec<String> {
        screen.spans().into_iter().map(|s| s.text).collect()
    }

    #[test]
    fn test_empty_screen_draws_nothing() {
        assert!(Screen::default().spans().is_empty());
    }

    #[test]
    fn test_enter_screen() {
        let mut screen = Screen::default();
        screen.set_visible(Element::EnterScreen, true);
        assert!(texts(&screen).iter().any(|t| t.contains("PRESS ENTER")));
    }

    #[test]
    fn test_prompt_shows_expected_key() {
        let mut screen = Screen::default();
        screen.set_visible(Element::Prompt, true);
        screen.set_text(Element::PromptKeys, "C");
        assert_eq!(texts(&screen), vec!["KEY › [ C ]"]);

        screen.set_text(Element::PromptKeys, "");
        assert_eq!(texts(&screen), vec!["KEY › [   ]"]);
    }

    #[test]
    fn test_text_without_visibility_is_not_drawn() {
        let mut screen = Screen::default();
        screen.set_text(Element::Sending, "SENDING...");
        assert!(screen.spans().is_empty());

        screen.set_visible(Element::Sending, true);
        assert_eq!(texts(&screen), vec!["SENDING..."]);

        screen.set_visible(Element::Sending, false);
        assert!(screen.spans().is_empty());
    }

    #[test]
    fn test_receiving_is_magenta() {
        let mut screen = Screen::default();
        screen.set_visible(Element::Receiving, true);
        screen.set_text(Element::Receiving, "RECEIVING");
        let spans = screen.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].color, MAGENTA);
    }

    #[test]
    fn test_multiline_elements_stack_rows() {
        let mut screen = Screen::default();
        screen.set_visible(Element::Quadrants, true);
        let rows: Vec<u16> = screen.spans().iter().map(|s| s.row).collect();
        assert_eq!(rows, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_failed_setup_leaves_terminal_cooked() {
        let audio = AudioPlayer::new(SoundConfig::default());
        let result = TerminalSink::with_output(audio, BrokenOutput);
        assert!(result.is_err());

        // Without a tty raw mode is never entered; with one it must be undone
        assert!(!terminal::is_raw_mode_enabled().unwrap_or(false));
    }
}
