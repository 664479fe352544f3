//! Key input sources
//!
//! Two sources feed the same channel of [`KeyInput`]s: the terminal the
//! interface runs in (crossterm event stream) or an evdev keyboard device.
//! Only key presses matter; releases and autorepeat are dropped.

use std::path::Path;

use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use evdev::Key;
use futures::StreamExt;
use jadoo_config::Symbol;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::device;

/// A discrete input event, already classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Toggle between collapsed and expanded interface (Enter)
    Activate,
    /// Candidate sequence symbol
    Symbol(Symbol),
    /// Leave the program (Esc, Ctrl+C)
    Quit,
}

/// evdev key event values
mod event_value {
    pub const PRESS: i32 = 1;
}

/// Classify a terminal key event.
pub fn map_terminal_key(event: &KeyEvent) -> Option<KeyInput> {
    if event.kind != KeyEventKind::Press {
        return None;
    }

    match event.code {
        KeyCode::Enter => Some(KeyInput::Activate),
        KeyCode::Esc => Some(KeyInput::Quit),
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyInput::Quit)
        }
        // Chords are not sequence symbols
        KeyCode::Char(_)
            if event
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            None
        }
        KeyCode::Char(c) => Symbol::new(c).map(KeyInput::Symbol),
        _ => None,
    }
}

/// Classify an evdev key event (`value` is 0 release, 1 press, 2 repeat).
pub fn map_device_key(key: Key, value: i32) -> Option<KeyInput> {
    if value != event_value::PRESS {
        return None;
    }

    match key {
        Key::KEY_ENTER | Key::KEY_KPENTER => Some(KeyInput::Activate),
        Key::KEY_ESC => Some(KeyInput::Quit),
        _ => key_char(key).and_then(Symbol::new).map(KeyInput::Symbol),
    }
}

/// Letter or digit printed on a key (US layout)
fn key_char(key: Key) -> Option<char> {
    let c = match key {
        Key::KEY_A => 'A',
        Key::KEY_B => 'B',
        Key::KEY_C => 'C',
        Key::KEY_D => 'D',
        Key::KEY_E => 'E',
        Key::KEY_F => 'F',
        Key::KEY_G => 'G',
        Key::KEY_H => 'H',
        Key::KEY_I => 'I',
        Key::KEY_J => 'J',
        Key::KEY_K => 'K',
        Key::KEY_L => 'L',
        Key::KEY_M => 'M',
        Key::KEY_N => 'N',
        Key::KEY_O => 'O',
        Key::KEY_P => 'P',
        Key::KEY_Q => 'Q',
        Key::KEY_R => 'R',
        Key::KEY_S => 'S',
        Key::KEY_T => 'T',
        Key::KEY_U => 'U',
        Key::KEY_V => 'V',
        Key::KEY_W => 'W',
        Key::KEY_X => 'X',
        Key::KEY_Y => 'Y',
        Key::KEY_Z => 'Z',
        Key::KEY_0 | Key::KEY_KP0 => '0',
        Key::KEY_1 | Key::KEY_KP1 => '1',
        Key::KEY_2 | Key::KEY_KP2 => '2',
        Key::KEY_3 | Key::KEY_KP3 => '3',
        Key::KEY_4 | Key::KEY_KP4 => '4',
        Key::KEY_5 | Key::KEY_KP5 => '5',
        Key::KEY_6 | Key::KEY_KP6 => '6',
        Key::KEY_7 | Key::KEY_KP7 => '7',
        Key::KEY_8 | Key::KEY_KP8 => '8',
        Key::KEY_9 | Key::KEY_KP9 => '9',
        _ => return None,
    };
    Some(c)
}

/// Read key presses from the controlling terminal.
///
/// The terminal must already be in raw mode for keys to arrive unbuffered.
pub fn spawn_terminal_source(tx: mpsc::Sender<KeyInput>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut events = EventStream::new();

        while let Some(event) = events.next().await {
            let input = match event {
                Ok(Event::Key(key)) => map_terminal_key(&key),
                Ok(_) => None,
                Err(e) => {
                    tracing::error!("Terminal input failed: {}", e);
                    break;
                }
            };

            if let Some(input) = input {
                if tx.send(input).await.is_err() {
                    break;
                }
            }
        }

        tracing::debug!("Terminal input source stopped");
    })
}

/// Read key presses from an evdev keyboard device.
pub fn spawn_device_source(
    path: &Path,
    grab: bool,
    tx: mpsc::Sender<KeyInput>,
) -> Result<JoinHandle<()>> {
    let mut device = device::open_keyboard(path)?;
    if grab {
        device::grab_device(&mut device)
            .with_context(|| format!("Failed to grab {}", path.display()))?;
    }

    let mut stream = device
        .into_event_stream()
        .with_context(|| format!("Failed to read events from {}", path.display()))?;
    let path = path.to_path_buf();

    Ok(tokio::spawn(async move {
        loop {
            let event = match stream.next_event().await {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!("Reading {} failed: {}", path.display(), e);
                    break;
                }
            };

            if event.event_type() != evdev::EventType::KEY {
                continue;
            }

            if let Some(input) = map_device_key(Key::new(event.code()), event.value()) {
                if tx.send(input).await.is_err() {
                    break;
                }
            }
        }

        tracing::debug!("Device input source {} stopped", path.display());
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(c: char) -> Symbol {
        Symbol::new(c).unwrap()
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_terminal_enter_activates() {
        assert_eq!(map_terminal_key(&press(KeyCode::Enter)), Some(KeyInput::Activate));
    }

    #[test]
    fn test_terminal_letters_become_uppercase_symbols() {
        assert_eq!(
            map_terminal_key(&press(KeyCode::Char('b'))),
            Some(KeyInput::Symbol(sym('B')))
        );
        assert_eq!(
            map_terminal_key(&press(KeyCode::Char('F'))),
            Some(KeyInput::Symbol(sym('F')))
        );
        assert_eq!(
            map_terminal_key(&press(KeyCode::Char('3'))),
            Some(KeyInput::Symbol(sym('3')))
        );
    }

    #[test]
    fn test_terminal_quit_keys() {
        assert_eq!(map_terminal_key(&press(KeyCode::Esc)), Some(KeyInput::Quit));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_terminal_key(&ctrl_c), Some(KeyInput::Quit));
    }

    #[test]
    fn test_terminal_ignores_control_and_alt_chords() {
        let ctrl_b = KeyEvent::new(KeyCode::Char('b'), KeyModifiers::CONTROL);
        let alt_b = KeyEvent::new(KeyCode::Char('b'), KeyModifiers::ALT);
        let ctrl_alt_7 =
            KeyEvent::new(KeyCode::Char('7'), KeyModifiers::CONTROL | KeyModifiers::ALT);
        assert_eq!(map_terminal_key(&ctrl_b), None);
        assert_eq!(map_terminal_key(&alt_b), None);
        assert_eq!(map_terminal_key(&ctrl_alt_7), None);

        // Shift is how uppercase arrives and still counts
        let shift_b = KeyEvent::new(KeyCode::Char('B'), KeyModifiers::SHIFT);
        assert_eq!(map_terminal_key(&shift_b), Some(KeyInput::Symbol(sym('B'))));
    }

    #[test]
    fn test_terminal_ignores_other_keys() {
        assert_eq!(map_terminal_key(&press(KeyCode::Char('-'))), None);
        assert_eq!(map_terminal_key(&press(KeyCode::Tab)), None);
        assert_eq!(map_terminal_key(&press(KeyCode::F(1))), None);
    }

    #[test]
    fn test_terminal_ignores_release() {
        let mut release = press(KeyCode::Char('b'));
        release.kind = KeyEventKind::Release;
        assert_eq!(map_terminal_key(&release), None);
    }

    #[test]
    fn test_device_press_only() {
        assert_eq!(map_device_key(Key::KEY_B, 1), Some(KeyInput::Symbol(sym('B'))));
        assert_eq!(map_device_key(Key::KEY_B, 0), None, "release is dropped");
        assert_eq!(map_device_key(Key::KEY_B, 2), None, "autorepeat is dropped");
    }

    #[test]
    fn test_device_special_keys() {
        assert_eq!(map_device_key(Key::KEY_ENTER, 1), Some(KeyInput::Activate));
        assert_eq!(map_device_key(Key::KEY_KPENTER, 1), Some(KeyInput::Activate));
        assert_eq!(map_device_key(Key::KEY_ESC, 1), Some(KeyInput::Quit));
        assert_eq!(map_device_key(Key::KEY_LEFTSHIFT, 1), None);
        assert_eq!(map_device_key(Key::KEY_F1, 1), None);
    }

    #[test]
    fn test_device_digits_and_keypad() {
        assert_eq!(map_device_key(Key::KEY_7, 1), Some(KeyInput::Symbol(sym('7'))));
        assert_eq!(map_device_key(Key::KEY_KP7, 1), Some(KeyInput::Symbol(sym('7'))));
    }

    #[test]
    fn test_device_covers_whole_alphabet() {
        let letters: Vec<char> = [
            Key::KEY_Q, Key::KEY_W, Key::KEY_E, Key::KEY_R, Key::KEY_T, Key::KEY_Y,
            Key::KEY_U, Key::KEY_I, Key::KEY_O, Key::KEY_P, Key::KEY_A, Key::KEY_S,
            Key::KEY_D, Key::KEY_F, Key::KEY_G, Key::KEY_H, Key::KEY_J, Key::KEY_K,
            Key::KEY_L, Key::KEY_Z, Key::KEY_X, Key::KEY_C, Key::KEY_V, Key::KEY_B,
            Key::KEY_N, Key::KEY_M,
        ]
        .into_iter()
        .filter_map(key_char)
        .collect();
        assert_eq!(letters.iter().collect::<String>(), "QWERTYUIOPASDFGHJKLZXCVBNM");
    }
}
