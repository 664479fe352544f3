//! Key sequence matching
//!
//! The [`SequenceMatcher`] walks a fixed [`KeySequence`] one symbol at a time.
//!
//! ```text
//!   disabled ──enable──► enabled, position 0
//!                          │
//!                          │ expected symbol   ──► position + 1 (Advanced)
//!                          │ any other symbol  ──► unchanged    (Rejected)
//!                          ▼
//!                        position == N         ──► complete     (Completed)
//!                          │
//!                          └──reset──► position 0
//! ```
//!
//! Matching is prefix-only and lenient: a wrong symbol never moves the
//! position backwards, the user simply tries again.

use jadoo_config::Symbol;

/// The ordered symbols to reproduce. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySequence {
    symbols: Vec<Symbol>,
}

impl KeySequence {
    /// Returns `None` for an empty sequence.
    pub fn new(symbols: Vec<Symbol>) -> Option<Self> {
        if symbols.is_empty() {
            None
        } else {
            Some(Self { symbols })
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn get(&self, position: usize) -> Option<Symbol> {
        self.symbols.get(position).copied()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}

/// Verdict of [`SequenceMatcher::try_advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// Wrong symbol, matcher disabled, or sequence already complete
    Rejected,
    /// Correct symbol, more to come
    Advanced,
    /// Correct symbol and it was the last one
    Completed,
}

/// Snapshot of the matcher progress.
///
/// `complete` is true exactly when `position` equals the sequence length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchState {
    pub position: usize,
    pub complete: bool,
}

#[derive(Debug, Clone)]
pub struct SequenceMatcher {
    sequence: KeySequence,
    state: MatchState,
    enabled: bool,
}

impl SequenceMatcher {
    /// Create a disabled matcher at position 0.
    pub fn new(sequence: KeySequence) -> Self {
        Self {
            sequence,
            state: MatchState::default(),
            enabled: false,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[cfg(test)]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    /// Symbol needed next, `None` once complete.
    pub fn expected_symbol(&self) -> Option<Symbol> {
        if self.state.complete {
            None
        } else {
            self.sequence.get(self.state.position)
        }
    }

    pub fn try_advance(&mut self, symbol: Symbol) -> MatchResult {
        if !self.enabled {
            return MatchResult::Rejected;
        }
        if self.expected_symbol() != Some(symbol) {
            return MatchResult::Rejected;
        }

        self.state.position += 1;
        if self.state.position == self.sequence.len() {
            self.state.complete = true;
            MatchResult::Completed
        } else {
            MatchResult::Advanced
        }
    }

    pub fn reset(&mut self) {
        self.state = MatchState::default();
    }
}
