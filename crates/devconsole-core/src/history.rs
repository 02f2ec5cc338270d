//! Command history with recall cursor.
//!
//! Lines are unique: re-submitting a line moves it to the newest slot. The
//! cursor sits one past the newest entry after every add, so the first
//! `previous()` returns the most recent line. Navigation never wraps.

/// Default number of remembered lines.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Bounded, deduplicated history of submitted lines.
#[derive(Debug, Clone)]
pub struct CommandHistory {
    entries: Vec<String>,
    /// `None` only while the buffer has never been filled or was cleared.
    cursor: Option<usize>,
    max_entries: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl CommandHistory {
    /// Create a history holding at most `max_entries` lines (minimum 1).
    pub fn new(max_entries: usize) -> Self {
        Self { entries: Vec::new(), cursor: None, max_entries: max_entries.max(1) }
    }

    /// Record a submitted line. Blank lines are ignored.
    pub fn add(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }

        self.entries.retain(|existing| existing != line);
        self.entries.push(line.to_string());

        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(..excess);
        }

        self.cursor = Some(self.entries.len());
        tracing::debug!(command = %line, "Command added to history");
    }

    /// Step back to the previous line.
    pub fn previous(&mut self) -> Option<&str> {
        match self.cursor {
            Some(cursor) if cursor > 0 => {
                let index = cursor - 1;
                self.cursor = Some(index);
                self.entries.get(index).map(String::as_str)
            }
            _ => None,
        }
    }

    /// Step forward to the next line.
    ///
    /// Returns `None` once the newest line is selected; the cursor then stays
    /// put, so a following `previous()` moves to the line before it.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&str> {
        let index = self.cursor.map_or(0, |cursor| cursor + 1);
        if index < self.entries.len() {
            self.cursor = Some(index);
            self.entries.get(index).map(String::as_str)
        } else {
            None
        }
    }

    /// Forget every line.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
        tracing::info!("Command history cleared");
    }

    /// Lines from oldest to newest.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current cursor; `None` is the cleared sentinel.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }
}
