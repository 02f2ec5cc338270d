//! Host output channel.
//!
//! Everything the console reports to the user flows through an [`OutputSink`]:
//! dispatch failures, script progress and the output of builtin commands.
//! The host decides how to render each [`MessageKind`].

use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Severity of a console message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageKind {
    /// Plain output.
    #[default]
    Normal,
    /// Failures.
    Error,
    /// Completed actions.
    Success,
    /// Recoverable problems.
    Warning,
    /// Informational notes (echoed script lines, descriptions).
    Information,
}

impl MessageKind {
    /// Get the string representation of the message kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Error => "error",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Information => "information",
        }
    }
}

/// A single rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub message: String,
    pub kind: MessageKind,
}

impl OutputLine {
    pub fn new(message: impl Into<String>, kind: MessageKind) -> Self {
        Self { message: message.into(), kind }
    }
}

/// Receiver of console output.
pub trait OutputSink: Send + Sync {
    /// Write one message.
    fn write(&self, message: &str, kind: MessageKind);

    /// Clear everything written so far.
    fn clear(&self) {}
}

/// Sink that keeps every line in memory.
#[derive(Debug, Default)]
pub struct BufferedSink {
    lines: Mutex<Vec<OutputLine>>,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded lines.
    pub fn lines(&self) -> Vec<OutputLine> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Recorded messages of one kind, in order.
    pub fn messages_of(&self, kind: MessageKind) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|line| line.kind == kind)
            .map(|line| line.message.clone())
            .collect()
    }

    /// Whether any recorded message equals `message`.
    pub fn contains(&self, message: &str) -> bool {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|line| line.message == message)
    }
}

impl OutputSink for BufferedSink {
    fn write(&self, message: &str, kind: MessageKind) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(OutputLine::new(message, kind));
    }

    fn clear(&self) {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Events sent from the console to a host render loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// A message to render.
    Line(OutputLine),
    /// Clear the output area.
    Clear,
}

/// Sink that forwards output over an unbounded channel without blocking.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<OutputEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver the host drains.
    pub fn new() -> (Self, UnboundedReceiver<OutputEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl OutputSink for ChannelSink {
    fn write(&self, message: &str, kind: MessageKind) {
        // Receiver gone means the host is shutting down.
        let _ = self.tx.send(OutputEvent::Line(OutputLine::new(message, kind)));
    }

    fn clear(&self) {
        let _ = self.tx.send(OutputEvent::Clear);
    }
}

/// Sink that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn write(&self, message: &str, kind: MessageKind) {
        match kind {
            MessageKind::Error => tracing::error!(kind = kind.as_str(), "{}", message),
            MessageKind::Warning => tracing::warn!(kind = kind.as_str(), "{}", message),
            MessageKind::Normal | MessageKind::Success | MessageKind::Information => {
                tracing::info!(kind = kind.as_str(), "{}", message);
            }
        }
    }
}
