//! Command registry.
//!
//! Definitions are keyed by `(name, flag)`. An empty flag is the plain
//! variant of a command; every other flag is a separate definition that
//! shares the name. Registering an existing pair replaces it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{ConsoleError, DispatchError, Result};
use crate::parser::ParsedCommand;

/// Callable behind a command.
pub type Handler = Arc<dyn Fn(&[String]) -> anyhow::Result<()> + Send + Sync>;

/// A registered command variant.
#[derive(Clone)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    /// Empty for the unflagged variant.
    pub flag: String,
    pub handler: Handler,
}

impl CommandDefinition {
    /// Create a definition from any compatible closure.
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        flag: impl Into<String>,
        handler: F,
    ) -> Self
    where
        F: Fn(&[String]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            flag: flag.into(),
            handler: Arc::new(handler),
        }
    }

    /// Whether this definition answers to `name` with `flag`.
    pub fn matches(&self, name: &str, flag: &str) -> bool {
        self.name == name && self.flag == flag
    }

    /// Display key, `name` or `name flag`.
    pub fn key(&self) -> String {
        if self.flag.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.flag)
        }
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("flag", &self.flag)
            .finish_non_exhaustive()
    }
}

/// Registry of command definitions.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<CommandDefinition>>,
    names: BTreeSet<String>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing any with the same name and flag.
    pub fn register(&mut self, definition: CommandDefinition) -> Result<()> {
        if definition.name.trim().is_empty() {
            return Err(ConsoleError::InvalidDefinition(
                "command name must not be empty".to_string(),
            ));
        }

        let before = self.commands.len();
        self.commands.retain(|existing| !existing.matches(&definition.name, &definition.flag));
        if self.commands.len() != before {
            tracing::debug!(command = %definition.key(), "Replacing existing command definition");
        }

        self.names.insert(definition.name.clone());
        self.commands.push(Arc::new(definition));
        Ok(())
    }

    /// Resolve a parsed command.
    ///
    /// Only the first flag on the line takes part in matching.
    pub fn find_match(
        &self,
        parsed: &ParsedCommand,
    ) -> std::result::Result<Arc<CommandDefinition>, DispatchError> {
        match parsed.primary_flag() {
            Some(flag) => {
                self.get(&parsed.name, flag).ok_or_else(|| DispatchError::FlagNotSupported {
                    name: parsed.name.clone(),
                    flag: flag.to_string(),
                })
            }
            None => self
                .get(&parsed.name, "")
                .ok_or_else(|| DispatchError::CommandNotFound { name: parsed.name.clone() }),
        }
    }

    /// Look up one variant.
    pub fn get(&self, name: &str, flag: &str) -> Option<Arc<CommandDefinition>> {
        self.commands.iter().find(|c| c.matches(name, flag)).cloned()
    }

    /// Distinct command names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    /// Description of the unflagged variant of `name`.
    pub fn describe(&self, name: &str) -> Option<&str> {
        self.commands
            .iter()
            .find(|c| c.matches(name, ""))
            .map(|c| c.description.as_str())
    }

    /// Flags registered for `name`, in registration order.
    pub fn flags_for(&self, name: &str) -> Vec<String> {
        self.commands
            .iter()
            .filter(|c| c.name == name && !c.flag.is_empty())
            .map(|c| c.flag.clone())
            .collect()
    }

    /// Number of registered definitions (all variants).
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drop every definition.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.names.clear();
    }
}
