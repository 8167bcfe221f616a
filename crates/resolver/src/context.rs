//! Context assembly for model delegation.
//!
//! The assembled sequence is always:
//!
//! 1. the system instruction
//! 2. history turns, in caller order, optionally windowed to the most recent N
//! 3. the current message as a user turn
//!
//! Assembly is deterministic apart from message ids and timestamps.

use digibuddy_core::message::{Message, Turn};

/// How much caller history is forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryWindow {
    /// Forward every turn.
    #[default]
    Unbounded,
    /// Forward only the most recent `n` turns.
    Recent(usize),
}

impl HistoryWindow {
    pub fn from_limit(limit: Option<usize>) -> Self {
        match limit {
            Some(n) => Self::Recent(n),
            None => Self::Unbounded,
        }
    }

    /// The slice of `history` this window keeps.
    pub fn apply<'a>(&self, history: &'a [Turn]) -> &'a [Turn] {
        match *self {
            Self::Unbounded => history,
            Self::Recent(n) => &history[history.len().saturating_sub(n)..],
        }
    }
}

/// Builds delegation message sequences. Stateless, so one instance is reused.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    system_prompt: String,
    window: HistoryWindow,
}

impl ContextAssembler {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            window: HistoryWindow::Unbounded,
        }
    }

    pub fn with_window(mut self, window: HistoryWindow) -> Self {
        self.window = window;
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn window(&self) -> HistoryWindow {
        self.window
    }

    /// Assemble the message sequence for one delegation.
    pub fn assemble(&self, message: &str, history: &[Turn]) -> Vec<Message> {
        let kept = self.window.apply(history);
        if kept.len() < history.len() {
            tracing::debug!(
                dropped = history.len() - kept.len(),
                kept = kept.len(),
                "History window applied"
            );
        }

        let mut messages = Vec::with_capacity(kept.len() + 2);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend(kept.iter().map(Turn::to_message));
        messages.push(Message::user(message));
        messages
    }
}
