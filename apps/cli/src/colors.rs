//! Message colours for terminal output.
//!
//! Each [`MessageKind`] maps to one of the 16 ANSI colours so the output
//! reads the same on every terminal. `Normal` text is left unstyled.

use colored::{Color, ColoredString, Colorize};
use devconsole_core::MessageKind;

/// Colour used for a message kind, `None` for plain text.
pub fn kind_color(kind: MessageKind) -> Option<Color> {
    match kind {
        MessageKind::Normal => None,
        MessageKind::Error => Some(Color::Red),
        MessageKind::Success => Some(Color::Green),
        MessageKind::Warning => Some(Color::Yellow),
        MessageKind::Information => Some(Color::Cyan),
    }
}

/// Style `message` for display.
pub fn paint(message: &str, kind: MessageKind) -> ColoredString {
    match kind_color(kind) {
        Some(color) => message.color(color),
        None => message.normal(),
    }
}
