//! Terminal output.
//!
//! In interactive mode the prompt stays on the last row: every message
//! clears the prompt line, prints itself and redraws the prompt with the
//! pending input. Plain mode just prints lines, for scripts and pipes.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use crossterm::cursor::{MoveTo, MoveToColumn};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use devconsole_core::{MessageKind, OutputEvent, OutputLine};

use crate::colors;

pub const PROMPT: &str = "> ";

/// Shared writer for console output and the input prompt.
#[derive(Debug)]
pub struct Screen {
    interactive: bool,
    input: Mutex<String>,
}

impl Screen {
    pub fn interactive() -> Self {
        Self { interactive: true, input: Mutex::new(String::new()) }
    }

    pub fn plain() -> Self {
        Self { interactive: false, input: Mutex::new(String::new()) }
    }

    /// Render one event from the console.
    pub fn show(&self, event: &OutputEvent) -> io::Result<()> {
        let input = self.input.lock().unwrap_or_else(PoisonError::into_inner);
        let mut out = io::stdout().lock();

        match event {
            OutputEvent::Line(OutputLine { message, kind }) if self.interactive => {
                let text = message.replace('\n', "\r\n");
                queue!(
                    out,
                    MoveToColumn(0),
                    Clear(ClearType::CurrentLine),
                    Print(colors::paint(&text, *kind)),
                    Print("\r\n"),
                    Print(PROMPT),
                    Print(input.as_str())
                )?;
            }
            OutputEvent::Line(OutputLine { message, kind }) => {
                writeln!(out, "{}", colors::paint(message, *kind))?;
            }
            OutputEvent::Clear if self.interactive => {
                queue!(
                    out,
                    Clear(ClearType::All),
                    MoveTo(0, 0),
                    Print(PROMPT),
                    Print(input.as_str())
                )?;
            }
            OutputEvent::Clear => {}
        }
        out.flush()
    }

    /// Replace the pending input and redraw the prompt.
    pub fn set_input(&self, text: &str) -> io::Result<()> {
        let mut input = self.input.lock().unwrap_or_else(PoisonError::into_inner);
        *input = text.to_string();
        let mut out = io::stdout().lock();
        queue!(
            out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(PROMPT),
            Print(input.as_str())
        )?;
        out.flush()
    }

    /// Leave a submitted line on screen and start a fresh prompt below it.
    pub fn commit_input(&self, line: &str) -> io::Result<()> {
        let mut input = self.input.lock().unwrap_or_else(PoisonError::into_inner);
        input.clear();
        let mut out = io::stdout().lock();
        queue!(
            out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(colors::paint(&format!("{}{}", PROMPT, line), MessageKind::Normal)),
            Print("\r\n"),
            Print(PROMPT)
        )?;
        out.flush()
    }

    /// Move past the prompt before leaving raw mode.
    pub fn finish(&self) -> io::Result<()> {
        let mut out = io::stdout().lock();
        queue!(out, Print("\r\n"))?;
        out.flush()
    }
}
