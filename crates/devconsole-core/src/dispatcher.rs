//! Command dispatch.
//!
//! Matches a parsed command against the registry and runs the handler. A
//! line with flags runs the matched handler once per flag position, each
//! time with only that position's arguments; a line without flags runs it
//! once with every argument.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::DispatchError;
use crate::output::{MessageKind, OutputSink};
use crate::parser::ParsedCommand;
use crate::registry::{CommandDefinition, CommandRegistry};

/// What happened to a dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Every handler invocation returned normally.
    Executed {
        invocations: usize,
    },
    /// A handler failed; remaining invocations for the line were skipped.
    HandlerFailed {
        /// Invocations that completed before the failure.
        invocations: usize,
        error: String,
    },
    /// No unflagged registration for the name.
    NotFound,
    /// The first flag is not registered for the name.
    FlagNotSupported,
}

impl DispatchOutcome {
    /// Whether at least the lookup succeeded and all handlers ran cleanly.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Executed { .. })
    }
}

/// Runs parsed commands against a shared registry.
pub struct Dispatcher {
    registry: Arc<RwLock<CommandRegistry>>,
    sink: Arc<dyn OutputSink>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher over an empty registry.
    pub fn new(sink: Arc<dyn OutputSink>) -> Self {
        Self::with_registry(Arc::new(RwLock::new(CommandRegistry::new())), sink)
    }

    pub fn with_registry(
        registry: Arc<RwLock<CommandRegistry>>,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        Self { registry, sink }
    }

    /// Shared handle to the registry.
    pub fn registry(&self) -> Arc<RwLock<CommandRegistry>> {
        Arc::clone(&self.registry)
    }

    /// Read access to the registry.
    pub fn read_registry(&self) -> RwLockReadGuard<'_, CommandRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access to the registry.
    pub fn write_registry(&self) -> RwLockWriteGuard<'_, CommandRegistry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Execute a parsed command. Never panics and never returns an error;
    /// every failure is reported through the sink.
    pub fn execute(&self, parsed: &ParsedCommand) -> DispatchOutcome {
        // Lookup result is cloned out so no lock is held while handlers run.
        let lookup = self.read_registry().find_match(parsed);

        let definition = match lookup {
            Ok(definition) => definition,
            Err(err @ DispatchError::FlagNotSupported { .. }) => {
                tracing::warn!(
                    command = %parsed.name,
                    flag = ?parsed.primary_flag(),
                    "Unsupported flag"
                );
                self.sink.write(&err.to_string(), MessageKind::Warning);
                return DispatchOutcome::FlagNotSupported;
            }
            Err(err @ DispatchError::CommandNotFound { .. }) => {
                tracing::debug!(command = %parsed.name, "Command not found");
                self.sink.write(&err.to_string(), MessageKind::Error);
                return DispatchOutcome::NotFound;
            }
        };

        let positions: Vec<usize> = if parsed.has_flags() {
            parsed.flags.iter().map(|(position, _)| *position).collect()
        } else {
            vec![0]
        };

        let mut invocations = 0;
        for position in positions {
            let args = parsed.args_for_position(position);
            if let Err(error) = invoke(&definition, &args) {
                tracing::error!(command = %parsed.name, error = %error, "Error executing command");
                self.sink.write(
                    &format!("Error executing command '{}': {}", parsed.name, error),
                    MessageKind::Error,
                );
                return DispatchOutcome::HandlerFailed { invocations, error };
            }
            invocations += 1;
        }

        tracing::debug!(command = %parsed.name, invocations, "Command executed");
        DispatchOutcome::Executed { invocations }
    }
}

/// Run a handler, turning both errors and panics into a message.
fn invoke(definition: &CommandDefinition, args: &[String]) -> Result<(), String> {
    match panic::catch_unwind(AssertUnwindSafe(|| (definition.handler)(args))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(format!("{:#}", err)),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
