//! DevConsole Core - command interpreter for embedded developer consoles.
//!
//! This crate provides the engine behind an in-process console:
//! - Parsing of `name -flag args…` lines with quoted arguments
//! - A registry of commands keyed by name and flag
//! - Dispatch that routes each flag's arguments to the handler
//! - Bounded command history and prefix completion
//! - A single-flight script runner with `pause(<secs>)` support
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use devconsole_core::{BufferedSink, Console, ConsoleConfig};
//!
//! # fn main() -> devconsole_core::Result<()> {
//! let sink = Arc::new(BufferedSink::new());
//! let console = Console::with_builtins(ConsoleConfig::default(), sink.clone())?;
//!
//! console.register_command("spawn", "Spawns an entity", "-n", |args| {
//!     println!("spawning {}", args.join(" "));
//!     Ok(())
//! })?;
//!
//! let _ = console.execute("spawn -n crate -n barrel");
//! # Ok(())
//! # }
//! ```

pub mod builtins;
pub mod completion;
pub mod config;
pub mod console;
pub mod dispatcher;
pub mod error;
pub mod history;
pub mod output;
pub mod parser;
pub mod registry;
pub mod script;

pub use builtins::register_builtins;
pub use completion::{Completer, Completion};
pub use config::{ConsoleConfig, HistoryConfig, ScriptConfig};
pub use console::{COMMAND_NOT_FOUND, Console};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{ConsoleError, DispatchError, ParseError, Result, ScriptError};
pub use history::CommandHistory;
pub use output::{
    BufferedSink, ChannelSink, MessageKind, OutputEvent, OutputLine, OutputSink, TracingSink,
};
pub use parser::{Argument, ParsedCommand, parse, split_flags, tokenize};
pub use registry::{CommandDefinition, CommandRegistry, Handler};
pub use script::{LineExecutor, ScriptOutcome, ScriptRunner, parse_pause};
