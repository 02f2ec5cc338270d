//! Console facade.
//!
//! Owns the dispatcher, history, completer and script runner, and exposes
//! the operations a host front end needs: submit a line, register
//! commands, recall history, ask for completions and run scripts.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tokio::task::JoinHandle;

use crate::completion::{Completer, Completion};
use crate::config::ConsoleConfig;
use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::error::{ParseError, Result};
use crate::history::CommandHistory;
use crate::output::{MessageKind, OutputSink};
use crate::parser;
use crate::registry::CommandDefinition;
use crate::script::{LineExecutor, ScriptOutcome, ScriptRunner};

/// Description returned for names without an unflagged registration.
pub const COMMAND_NOT_FOUND: &str = "Command not found";

/// An interactive command console.
pub struct Console {
    config: ConsoleConfig,
    sink: Arc<dyn OutputSink>,
    dispatcher: Dispatcher,
    history: Mutex<CommandHistory>,
    completer: RwLock<Completer>,
    scripts: ScriptRunner,
    exit_requested: AtomicBool,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("config", &self.config)
            .field("scripts", &self.scripts)
            .finish_non_exhaustive()
    }
}

impl Console {
    /// Create a console with an empty registry.
    pub fn new(config: ConsoleConfig, sink: Arc<dyn OutputSink>) -> Arc<Self> {
        let history = CommandHistory::new(config.history.max_entries);
        let scripts = ScriptRunner::new(config.script.clone(), Arc::clone(&sink));
        Arc::new(Self {
            dispatcher: Dispatcher::new(Arc::clone(&sink)),
            history: Mutex::new(history),
            completer: RwLock::new(Completer::default()),
            scripts,
            exit_requested: AtomicBool::new(false),
            sink,
            config,
        })
    }

    /// Create a console with the builtin commands registered.
    pub fn with_builtins(config: ConsoleConfig, sink: Arc<dyn OutputSink>) -> Result<Arc<Self>> {
        let console = Self::new(config, sink);
        crate::builtins::register_builtins(&console)?;
        Ok(console)
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Parse and dispatch one line, then record it in history.
    ///
    /// Lines that do not parse are reported and not recorded.
    pub fn execute(&self, line: &str) -> std::result::Result<DispatchOutcome, ParseError> {
        let parsed = match parser::parse(line) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(error = %err, "Ignoring unparseable input");
                self.sink.write(&err.to_string(), MessageKind::Warning);
                return Err(err);
            }
        };

        let outcome = self.dispatcher.execute(&parsed);
        self.history().add(line);
        Ok(outcome)
    }

    /// Register a command definition and refresh completion.
    ///
    /// The completer is updated under the registry write lock so concurrent
    /// registrations publish their name sets in registration order.
    pub fn register(&self, definition: CommandDefinition) -> Result<()> {
        let mut registry = self.dispatcher.write_registry();
        registry.register(definition)?;
        self.completer
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .update_names(registry.names());
        Ok(())
    }

    /// Register a command from its parts.
    pub fn register_command<F>(
        &self,
        name: &str,
        description: &str,
        flag: &str,
        handler: F,
    ) -> Result<()>
    where
        F: Fn(&[String]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(CommandDefinition::new(name, description, flag, handler))
    }

    /// Write a message to the host.
    pub fn write(&self, message: &str, kind: MessageKind) {
        self.sink.write(message, kind);
    }

    /// Show the banner.
    pub fn display_info(&self) {
        self.sink.write(
            &format!("{} v{}", self.config.banner, self.config.version),
            MessageKind::Success,
        );
        self.sink.write("Type 'help' for a list of commands.", MessageKind::Normal);
    }

    /// Clear the output and show the banner again.
    pub fn clear(&self) {
        self.sink.clear();
        self.display_info();
    }

    pub fn request_exit(&self) {
        self.exit_requested.store(true, Ordering::SeqCst);
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested.load(Ordering::SeqCst)
    }

    /// Recall the line before the current history position.
    pub fn previous_command(&self) -> Option<String> {
        self.history().previous().map(str::to_string)
    }

    /// Recall the line after the current history position.
    pub fn next_command(&self) -> Option<String> {
        self.history().next().map(str::to_string)
    }

    /// Snapshot of the history, oldest first.
    pub fn history_entries(&self) -> Vec<String> {
        self.history().entries().to_vec()
    }

    pub fn clear_history(&self) {
        self.history().clear();
    }

    /// Command names starting with `partial`.
    pub fn suggestions(&self, partial: &str) -> Vec<String> {
        self.completer.read().unwrap_or_else(PoisonError::into_inner).suggest(partial)
    }

    pub fn complete(&self, partial: &str) -> Completion {
        self.completer.read().unwrap_or_else(PoisonError::into_inner).complete(partial)
    }

    /// Distinct registered command names.
    pub fn command_names(&self) -> Vec<String> {
        self.dispatcher.read_registry().names()
    }

    /// Description of the unflagged variant, or [`COMMAND_NOT_FOUND`].
    pub fn command_description(&self, name: &str) -> String {
        self.dispatcher
            .read_registry()
            .describe(name)
            .unwrap_or(COMMAND_NOT_FOUND)
            .to_string()
    }

    pub fn scripts(&self) -> &ScriptRunner {
        &self.scripts
    }

    /// Run script lines in the background.
    pub fn run_script(self: &Arc<Self>, lines: Vec<String>) -> JoinHandle<ScriptOutcome> {
        let executor: Arc<dyn LineExecutor> = Arc::clone(self) as Arc<dyn LineExecutor>;
        self.scripts.spawn(lines, executor)
    }

    /// Run a script file in the background.
    pub fn run_script_file(
        self: &Arc<Self>,
        path: impl Into<PathBuf>,
    ) -> JoinHandle<ScriptOutcome> {
        let executor: Arc<dyn LineExecutor> = Arc::clone(self) as Arc<dyn LineExecutor>;
        self.scripts.spawn_file(path.into(), executor)
    }

    fn history(&self) -> MutexGuard<'_, CommandHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LineExecutor for Console {
    fn execute_line(&self, line: &str) {
        // Failures are already reported to the sink.
        let _ = self.execute(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::BufferedSink;
    use std::sync::atomic::AtomicUsize;

    fn console() -> (Arc<Console>, Arc<BufferedSink>) {
        let sink = Arc::new(BufferedSink::new());
        (Console::new(ConsoleConfig::default(), sink.clone()), sink)
    }

    #[test]
    fn test_execute_records_history_after_dispatch() {
        let (console, _) = console();
        console.register_command("ping", "", "", |_| Ok(())).unwrap();

        console.execute("ping").unwrap();
        console.execute("unknown").unwrap();

        assert_eq!(console.history_entries(), vec!["ping".to_string(), "unknown".to_string()]);
    }

    #[test]
    fn test_blank_input_is_reported_and_not_recorded() {
        let (console, sink) = console();

        assert_eq!(console.execute("   "), Err(ParseError::Empty));
        assert!(console.history_entries().is_empty());
        assert_eq!(sink.messages_of(MessageKind::Warning), vec!["Empty command input".to_string()]);
    }

    #[test]
    fn test_register_refreshes_suggestions() {
        let (console, _) = console();
        assert!(console.suggestions("sp").is_empty());

        console.register_command("spawn", "Spawns things", "", |_| Ok(())).unwrap();
        console.register_command("spawn", "Spawn help", "-h", |_| Ok(())).unwrap();

        assert_eq!(console.suggestions("SP"), vec!["spawn".to_string()]);
        assert_eq!(console.complete("sp"), Completion::Unique("spawn".to_string()));
    }

    #[test]
    fn test_concurrent_registration_keeps_completer_in_sync() {
        let (console, _) = console();
        let threads: Vec<_> = (0..8)
            .map(|i| {
                let console = Arc::clone(&console);
                std::thread::spawn(move || {
                    for j in 0..25 {
                        let name = format!("cmd_{}_{}", i, j);
                        console.register_command(&name, "", "", |_| Ok(())).unwrap();
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().expect("registration thread panicked");
        }

        let mut suggested = console.suggestions("cmd_");
        suggested.sort();
        assert_eq!(suggested.len(), 200);
        assert_eq!(suggested, console.command_names());
    }

    #[test]
    fn test_command_description_sentinel() {
        let (console, _) = console();
        console.register_command("spawn", "Spawns things", "", |_| Ok(())).unwrap();

        assert_eq!(console.command_description("spawn"), "Spawns things");
        assert_eq!(console.command_description("nothing"), COMMAND_NOT_FOUND);
    }

    #[test]
    fn test_history_navigation_through_console() {
        let (console, _) = console();
        console.execute("a").unwrap();
        console.execute("b").unwrap();

        assert_eq!(console.previous_command().as_deref(), Some("b"));
        assert_eq!(console.previous_command().as_deref(), Some("a"));
        assert_eq!(console.previous_command(), None);
        assert_eq!(console.next_command().as_deref(), Some("b"));
    }

    #[test]
    fn test_history_respects_configured_cap() {
        let sink = Arc::new(BufferedSink::new());
        let mut config = ConsoleConfig::default();
        config.history.max_entries = 2;
        let console = Console::new(config, sink);

        for line in ["one", "two", "three"] {
            console.execute(line).unwrap();
        }

        assert_eq!(console.history_entries(), vec!["two".to_string(), "three".to_string()]);
    }

    #[test]
    fn test_failing_handler_does_not_block_next_command() {
        let (console, _) = console();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        console.register_command("fail", "", "", |_| anyhow::bail!("nope")).unwrap();
        console
            .register_command("count", "", "", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        assert!(matches!(console.execute("fail"), Ok(DispatchOutcome::HandlerFailed { .. })));
        assert!(console.execute("count").unwrap().is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_redisplays_banner() {
        let (console, sink) = console();
        console.write("old output", MessageKind::Normal);

        console.clear();

        assert!(!sink.contains("old output"));
        assert!(sink.contains("DevConsole v1.0.0"));
        assert!(sink.contains("Type 'help' for a list of commands."));
    }

    #[test]
    fn test_exit_request_flag() {
        let (console, _) = console();
        assert!(!console.exit_requested());
        console.request_exit();
        assert!(console.exit_requested());
    }
}
