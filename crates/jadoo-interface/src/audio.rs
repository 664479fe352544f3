//! Audio cues played through an external player program
//!
//! Every cue starts a fresh `<player> <file>` process. Starting a cue again
//! while it is still playing stops the previous playback first, so rapid key
//! presses restart the tone instead of stacking it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;

use jadoo_config::SoundConfig;
use tokio::process::{Child, Command};

use crate::presentation::{PresentationError, SoundCue};

pub struct AudioPlayer {
    sounds: SoundConfig,
    playing: HashMap<SoundCue, Child>,
}

impl AudioPlayer {
    pub fn new(sounds: SoundConfig) -> Self {
        Self {
            sounds,
            playing: HashMap::new(),
        }
    }

    /// File that backs a cue.
    pub fn path_for(&self, cue: SoundCue) -> PathBuf {
        match cue {
            SoundCue::Key(symbol) => self.sounds.key_path(symbol),
            SoundCue::Receiving => self.sounds.receiving_path(),
        }
    }

    /// Start playing a cue. Must be called from within a tokio runtime.
    pub fn play(&mut self, cue: SoundCue) -> Result<(), PresentationError> {
        let path = self.path_for(cue);
        if !path.is_file() {
            return Err(PresentationError::SoundMissing(path));
        }

        if let Some(mut previous) = self.playing.remove(&cue) {
            // Already exited is fine
            let _ = previous.start_kill();
        }

        let child = Command::new(&self.sounds.player)
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PresentationError::Player {
                player: self.sounds.player.clone(),
                source,
            })?;

        tracing::trace!("Playing {} from {}", cue, path.display());
        self.playing.insert(cue, child);
        Ok(())
    }
}
