//! Single-line input editing for the interactive console.
//!
//! Translates key presses into edits of the pending input line, history
//! recall and completion requests against the [`Console`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use devconsole_core::{Completion, Console, MessageKind};

/// What the host loop should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    /// Input changed; redraw the prompt.
    Redraw,
    /// A line was submitted for execution.
    Submit(String),
    /// The user asked to leave.
    Quit,
    /// Key ignored.
    Nothing,
}

/// Pending input line.
#[derive(Debug, Default)]
pub struct LineEditor {
    buffer: String,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Apply one key press.
    pub fn handle_key(&mut self, key: KeyEvent, console: &Console) -> EditorAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => EditorAction::Quit,
            KeyCode::Char('c' | 'd') if ctrl => EditorAction::Quit,
            KeyCode::Char('u') if ctrl => {
                self.buffer.clear();
                EditorAction::Redraw
            }
            KeyCode::Char(c) if !ctrl => {
                self.buffer.push(c);
                EditorAction::Redraw
            }
            KeyCode::Backspace => {
                if self.buffer.pop().is_some() {
                    EditorAction::Redraw
                } else {
                    EditorAction::Nothing
                }
            }
            KeyCode::Enter => {
                let line = std::mem::take(&mut self.buffer);
                if line.trim().is_empty() {
                    EditorAction::Redraw
                } else {
                    EditorAction::Submit(line)
                }
            }
            KeyCode::Up => {
                self.buffer = console.previous_command().unwrap_or_default();
                EditorAction::Redraw
            }
            KeyCode::Down => {
                self.buffer = console.next_command().unwrap_or_default();
                EditorAction::Redraw
            }
            KeyCode::Tab => self.complete(console),
            _ => EditorAction::Nothing,
        }
    }

    fn complete(&mut self, console: &Console) -> EditorAction {
        match console.complete(&self.buffer) {
            Completion::None => EditorAction::Nothing,
            Completion::Unique(name) => {
                self.buffer = name;
                EditorAction::Redraw
            }
            Completion::Ambiguous(names) => {
                console.write("Available commands:", MessageKind::Normal);
                for name in names {
                    console.write(&format!("  {}", name), MessageKind::Normal);
                }
                EditorAction::Redraw
            }
        }
    }
}
