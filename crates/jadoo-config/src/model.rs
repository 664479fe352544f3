//! Configuration data model

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// The sequence played when no `sequence` node is configured.
pub const DEFAULT_SEQUENCE: &str = "BCFEBCEDBCFEDE";

/// Root configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    pub global: GlobalConfig,
    /// The key sequence the user has to reproduce, never empty
    pub sequence: Vec<Symbol>,
    pub ambient: AmbientPolicy,
    pub sounds: SoundConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            global: GlobalConfig::default(),
            sequence: default_sequence(),
            ambient: AmbientPolicy::default(),
            sounds: SoundConfig::default(),
        }
    }
}

fn default_sequence() -> Vec<Symbol> {
    DEFAULT_SEQUENCE.chars().filter_map(Symbol::new).collect()
}

/// Global settings
#[derive(Debug, Clone, Default)]
pub struct GlobalConfig {
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string usable with `tracing_subscriber::EnvFilter`.
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// A single key of the sequence.
///
/// Symbols are ASCII letters or digits. Letters are normalized to uppercase so
/// that `b` and `B` name the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(char);

impl Symbol {
    /// Returns `None` for anything that is not an ASCII letter or digit.
    pub fn new(c: char) -> Option<Self> {
        if c.is_ascii_alphanumeric() {
            Some(Self(c.to_ascii_uppercase()))
        } else {
            None
        }
    }

    pub fn as_char(self) -> char {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Symbol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                Symbol::new(c).ok_or_else(|| format!("'{}' is not a letter or digit", s))
            }
            _ => Err(format!("'{}' must be a single letter or digit", s)),
        }
    }
}

/// What happens to the ambient sound-wave pair when the interface collapses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AmbientPolicy {
    /// The pair is hidden and shown together with every other active element.
    #[default]
    FollowMode,
    /// Once shown the pair stays visible, even while the interface is collapsed.
    AlwaysVisible,
}

impl std::str::FromStr for AmbientPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "follow-mode" | "follow" => Ok(Self::FollowMode),
            "always-visible" | "always" => Ok(Self::AlwaysVisible),
            _ => Err(format!(
                "Unknown ambient policy: {} (expected \"follow-mode\" or \"always-visible\")",
                s
            )),
        }
    }
}

/// Where audio cues come from and how they are played
#[derive(Debug, Clone)]
pub struct SoundConfig {
    /// Base directory for relative sound paths
    pub directory: PathBuf,
    /// Player program, invoked as `<player> <file>`
    pub player: String,
    /// Per-symbol sound files, overriding the `<symbol>.wav` convention
    pub keys: HashMap<Symbol, PathBuf>,
    /// Cue played while the interface is "receiving"
    pub receiving: PathBuf,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            directory: shellexpand::tilde("~/.local/share/jadoo/sounds")
                .into_owned()
                .into(),
            player: "paplay".to_string(),
            keys: HashMap::new(),
            receiving: PathBuf::from("receiving.wav"),
        }
    }
}

impl SoundConfig {
    /// Resolve the sound file bound to a symbol.
    pub fn key_path(&self, symbol: Symbol) -> PathBuf {
        match self.keys.get(&symbol) {
            Some(path) => self.resolve(path),
            None => self.directory.join(format!(
                "{}.wav",
                symbol.as_char().to_ascii_lowercase()
            )),
        }
    }

    /// Resolve the sound file of the receiving cue.
    pub fn receiving_path(&self) -> PathBuf {
        self.resolve(&self.receiving)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.directory.join(path)
        }
    }
}
