//! Script execution.
//!
//! A script is a list of console lines replayed through the same path as
//! typed input. Blank lines and comment lines are skipped, `pause(<secs>)`
//! suspends the run, and every other line is echoed and executed followed
//! by a short delay. At most one script runs at a time; a second request
//! while one is in flight is rejected, not queued.
//!
//! The only suspension points are the per-line delay and pauses. Both are
//! `tokio::time::sleep`, so the host keeps rendering and reading input while
//! a script runs.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ScriptConfig;
use crate::dispatcher::panic_message;
use crate::error::ScriptError;
use crate::output::{MessageKind, OutputSink};

/// Something that can run a single console line.
pub trait LineExecutor: Send + Sync {
    /// Execute one raw line. Failures are reported by the executor itself.
    fn execute_line(&self, line: &str);
}

/// How a script run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOutcome {
    /// All lines processed.
    Completed { lines_executed: usize },
    /// Another script was already running.
    Rejected,
    /// The script could not be loaded or the run aborted.
    Failed(String),
    /// Stopped by [`ScriptRunner::cancel`].
    Cancelled { lines_executed: usize },
}

/// Marks the runner busy until dropped, including on unwind.
struct RunGuard {
    running: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Single-flight script runner.
#[derive(Clone)]
pub struct ScriptRunner {
    running: Arc<AtomicBool>,
    cancel: Arc<Mutex<CancellationToken>>,
    sink: Arc<dyn OutputSink>,
    config: Arc<ScriptConfig>,
}

impl std::fmt::Debug for ScriptRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptRunner")
            .field("running", &self.is_running())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ScriptRunner {
    pub fn new(config: ScriptConfig, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            sink,
            config: Arc::new(config),
        }
    }

    /// Whether a script is currently in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the in-flight script at its next suspension point.
    pub fn cancel(&self) {
        self.cancel.lock().unwrap_or_else(PoisonError::into_inner).cancel();
    }

    /// Run `lines` to completion on the current task.
    pub async fn run(&self, lines: Vec<String>, executor: &dyn LineExecutor) -> ScriptOutcome {
        let Some((guard, token)) = self.try_begin() else {
            return ScriptOutcome::Rejected;
        };
        let outcome = self.run_lines(&lines, executor, &token, None).await;
        drop(guard);
        outcome
    }

    /// Load a script file and run it on the current task.
    pub async fn run_file(&self, path: &Path, executor: &dyn LineExecutor) -> ScriptOutcome {
        let Some((guard, token)) = self.try_begin() else {
            return ScriptOutcome::Rejected;
        };
        let outcome = match self.load(path).await {
            Ok(lines) => self.run_lines(&lines, executor, &token, Some(path)).await,
            Err(err) => {
                self.sink.write(&err.to_string(), MessageKind::Error);
                ScriptOutcome::Failed(err.to_string())
            }
        };
        drop(guard);
        outcome
    }

    /// Start `lines` in the background. The handle resolves when the run ends.
    ///
    /// The single-flight check happens before this returns, so two calls in
    /// a row always reject the second one.
    pub fn spawn(
        &self,
        lines: Vec<String>,
        executor: Arc<dyn LineExecutor>,
    ) -> JoinHandle<ScriptOutcome> {
        let Some((guard, token)) = self.try_begin() else {
            return tokio::spawn(async { ScriptOutcome::Rejected });
        };
        let runner = self.clone();
        self.supervise(tokio::spawn(async move {
            let _guard = guard;
            runner.run_lines(&lines, executor.as_ref(), &token, None).await
        }))
    }

    /// Start a script file in the background.
    pub fn spawn_file(
        &self,
        path: PathBuf,
        executor: Arc<dyn LineExecutor>,
    ) -> JoinHandle<ScriptOutcome> {
        let Some((guard, token)) = self.try_begin() else {
            return tokio::spawn(async { ScriptOutcome::Rejected });
        };
        let runner = self.clone();
        self.supervise(tokio::spawn(async move {
            let _guard = guard;
            match runner.load(&path).await {
                Ok(lines) => runner.run_lines(&lines, executor.as_ref(), &token, Some(&path)).await,
                Err(err) => {
                    runner.sink.write(&err.to_string(), MessageKind::Error);
                    ScriptOutcome::Failed(err.to_string())
                }
            }
        }))
    }

    fn try_begin(&self) -> Option<(RunGuard, CancellationToken)> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Script rejected, another script is running");
            self.sink.write(&ScriptError::AlreadyRunning.to_string(), MessageKind::Warning);
            return None;
        }

        let guard = RunGuard { running: Arc::clone(&self.running) };
        let token = CancellationToken::new();
        *self.cancel.lock().unwrap_or_else(PoisonError::into_inner) = token.clone();
        Some((guard, token))
    }

    /// Turn a panicked run into a reported failure.
    fn supervise(&self, handle: JoinHandle<ScriptOutcome>) -> JoinHandle<ScriptOutcome> {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    let message = format!("Error executing script: {}", err);
                    tracing::error!(error = %err, "Script task aborted");
                    sink.write(&message, MessageKind::Error);
                    ScriptOutcome::Failed(message)
                }
            }
        })
    }

    async fn load(&self, path: &Path) -> Result<Vec<String>, ScriptError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ScriptError::FileMissing { path: path.to_path_buf(), source })?;
        Ok(content.lines().map(str::to_string).collect())
    }

    async fn run_lines(
        &self,
        lines: &[String],
        executor: &dyn LineExecutor,
        token: &CancellationToken,
        source: Option<&Path>,
    ) -> ScriptOutcome {
        info!(lines = lines.len(), source = ?source, "Script execution started");
        let mut lines_executed = 0;

        for line in lines {
            if token.is_cancelled() {
                return self.cancelled(lines_executed);
            }

            let trimmed = line.trim();
            if trimmed.is_empty() || has_prefix(trimmed, &self.config.comment_prefix) {
                continue;
            }

            if has_prefix(trimmed, &self.config.pause_directive) {
                let duration = self.pause_duration(trimmed);
                if !suspend(duration, token).await {
                    return self.cancelled(lines_executed);
                }
                continue;
            }

            self.sink.write(&format!("> {}", line), MessageKind::Information);
            let executed = panic::catch_unwind(AssertUnwindSafe(|| executor.execute_line(line)));
            if let Err(payload) = executed {
                let message =
                    format!("Error executing script: {}", panic_message(payload.as_ref()));
                tracing::error!(line = %line, "Script aborted by a panicking line");
                self.sink.write(&message, MessageKind::Error);
                return ScriptOutcome::Failed(message);
            }
            lines_executed += 1;

            if !suspend(self.config.line_delay(), token).await {
                return self.cancelled(lines_executed);
            }
        }

        let message = match source {
            Some(path) => format!("Script execution completed: {}", path.display()),
            None => "Script execution completed".to_string(),
        };
        info!(lines_executed, "Script execution completed");
        self.sink.write(&message, MessageKind::Success);
        ScriptOutcome::Completed { lines_executed }
    }

    fn pause_duration(&self, directive: &str) -> Duration {
        match parse_pause(directive) {
            Ok(duration) => {
                self.sink.write(
                    &format!("Pausing for {} seconds...", duration.as_secs_f64()),
                    MessageKind::Information,
                );
                duration
            }
            Err(err) => {
                let fallback = self.config.default_pause();
                warn!(directive, error = %err, "Invalid pause directive");
                self.sink.write(
                    &format!("{}. Using default {} second delay.", err, fallback.as_secs_f64()),
                    MessageKind::Warning,
                );
                fallback
            }
        }
    }

    fn cancelled(&self, lines_executed: usize) -> ScriptOutcome {
        debug!(lines_executed, "Script cancelled");
        self.sink.write("Script execution cancelled", MessageKind::Warning);
        ScriptOutcome::Cancelled { lines_executed }
    }
}

/// Prefix match that never treats an empty prefix as matching.
fn has_prefix(line: &str, prefix: &str) -> bool {
    !prefix.is_empty() && line.starts_with(prefix)
}

/// Sleep unless cancelled first. Returns `false` on cancellation.
async fn suspend(duration: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        () = tokio::time::sleep(duration) => true,
        () = token.cancelled() => false,
    }
}

/// Extract the duration from a `pause(<seconds>)` directive.
pub fn parse_pause(directive: &str) -> Result<Duration, ScriptError> {
    let open = directive
        .find('(')
        .ok_or_else(|| ScriptError::PauseParse("missing '('".to_string()))?;
    let close = directive
        .find(')')
        .ok_or_else(|| ScriptError::PauseParse("missing ')'".to_string()))?;
    if close < open {
        return Err(ScriptError::PauseParse("')' before '('".to_string()));
    }

    let text = directive[open + 1..close].trim();
    let seconds: f64 = text
        .parse()
        .map_err(|_| ScriptError::PauseParse(format!("'{}' is not a number", text)))?;
    Duration::try_from_secs_f64(seconds)
        .map_err(|_| ScriptError::PauseParse(format!("'{}' is not a valid duration", text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::BufferedSink;

    #[derive(Default)]
    struct Recorder {
        lines: Mutex<Vec<String>>,
    }

    impl LineExecutor for Recorder {
        fn execute_line(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }
    }

    fn fast_config() -> ScriptConfig {
        ScriptConfig { line_delay_ms: 0, default_pause_secs: 0.01, ..ScriptConfig::default() }
    }

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_parse_pause_values() {
        assert_eq!(parse_pause("pause(2)").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_pause("pause( 0.5 )").unwrap(), Duration::from_millis(500));
        assert!(parse_pause("pause(abc)").is_err());
        assert!(parse_pause("pause(3").is_err());
        assert!(parse_pause("pause(-1)").is_err());
        assert!(parse_pause("pause()").is_err());
    }

    #[tokio::test]
    async fn test_run_skips_blank_and_comments() {
        let sink = Arc::new(BufferedSink::new());
        let runner = ScriptRunner::new(fast_config(), sink.clone());
        let recorder = Recorder::default();

        let script =
            lines(&["", "// setup", "   // indented comment", "echo one", "  ", "echo two"]);
        let outcome = runner.run(script, &recorder).await;

        assert_eq!(outcome, ScriptOutcome::Completed { lines_executed: 2 });
        assert_eq!(*recorder.lines.lock().unwrap(), lines(&["echo one", "echo two"]));
        assert_eq!(
            sink.messages_of(MessageKind::Information),
            vec!["> echo one".to_string(), "> echo two".to_string()]
        );
        assert_eq!(
            sink.messages_of(MessageKind::Success),
            vec!["Script execution completed".to_string()]
        );
        assert!(!runner.is_running());
    }

    #[tokio::test]
    async fn test_pause_is_not_dispatched() {
        let sink = Arc::new(BufferedSink::new());
        let runner = ScriptRunner::new(fast_config(), sink.clone());
        let recorder = Recorder::default();

        let outcome = runner.run(lines(&["pause(0.01)", "echo after"]), &recorder).await;

        assert_eq!(outcome, ScriptOutcome::Completed { lines_executed: 1 });
        assert_eq!(*recorder.lines.lock().unwrap(), lines(&["echo after"]));
        assert!(sink.contains("Pausing for 0.01 seconds..."));
    }

    #[tokio::test]
    async fn test_bad_pause_falls_back_to_default() {
        let sink = Arc::new(BufferedSink::new());
        let runner = ScriptRunner::new(fast_config(), sink.clone());
        let recorder = Recorder::default();

        let outcome = runner.run(lines(&["pause(soon)", "echo still runs"]), &recorder).await;

        assert_eq!(outcome, ScriptOutcome::Completed { lines_executed: 1 });
        let warnings = sink.messages_of(MessageKind::Warning);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Error parsing pause time:"));
        assert!(warnings[0].ends_with("Using default 0.01 second delay."));
    }

    #[tokio::test]
    async fn test_second_run_is_rejected_while_first_in_flight() {
        let sink = Arc::new(BufferedSink::new());
        let runner = ScriptRunner::new(fast_config(), sink.clone());
        let recorder: Arc<Recorder> = Arc::new(Recorder::default());

        let first = runner.spawn(lines(&["echo a", "pause(0.1)", "echo b"]), recorder.clone());
        assert!(runner.is_running());

        let second = runner.run(lines(&["echo intruder"]), recorder.as_ref()).await;
        assert_eq!(second, ScriptOutcome::Rejected);
        assert!(sink.contains("Another script is currently executing"));

        assert_eq!(first.await.unwrap(), ScriptOutcome::Completed { lines_executed: 2 });
        assert_eq!(*recorder.lines.lock().unwrap(), lines(&["echo a", "echo b"]));
        assert!(!runner.is_running());
    }

    #[tokio::test]
    async fn test_missing_file_reports_error() {
        let sink = Arc::new(BufferedSink::new());
        let runner = ScriptRunner::new(fast_config(), sink.clone());
        let recorder = Recorder::default();

        let outcome = runner.run_file(Path::new("/no/such/script.txt"), &recorder).await;

        assert!(matches!(outcome, ScriptOutcome::Failed(_)));
        assert_eq!(
            sink.messages_of(MessageKind::Error),
            vec!["Script file not found: /no/such/script.txt".to_string()]
        );
        assert!(!runner.is_running());
    }

    #[tokio::test]
    async fn test_cancel_stops_at_next_suspension() {
        let sink = Arc::new(BufferedSink::new());
        let runner = ScriptRunner::new(fast_config(), sink.clone());
        let recorder: Arc<Recorder> = Arc::new(Recorder::default());

        let handle = runner.spawn(lines(&["echo a", "pause(30)", "echo never"]), recorder.clone());
        tokio::time::sleep(Duration::from_millis(20)).await;
        runner.cancel();

        assert_eq!(handle.await.unwrap(), ScriptOutcome::Cancelled { lines_executed: 1 });
        assert_eq!(*recorder.lines.lock().unwrap(), lines(&["echo a"]));
        assert!(sink.contains("Script execution cancelled"));
        assert!(!runner.is_running());
    }

    struct Exploder;

    impl LineExecutor for Exploder {
        fn execute_line(&self, _line: &str) {
            panic!("executor blew up");
        }
    }

    #[tokio::test]
    async fn test_run_reports_panicking_line() {
        let sink = Arc::new(BufferedSink::new());
        let runner = ScriptRunner::new(fast_config(), sink.clone());

        let outcome = runner.run(lines(&["boom", "echo never"]), &Exploder).await;

        assert_eq!(
            outcome,
            ScriptOutcome::Failed("Error executing script: executor blew up".to_string())
        );
        assert_eq!(
            sink.messages_of(MessageKind::Error),
            vec!["Error executing script: executor blew up".to_string()]
        );
        assert!(!sink.contains("Script execution completed"));
        assert!(!runner.is_running());
    }

    #[tokio::test]
    async fn test_empty_prefixes_still_dispatch_lines() {
        let sink = Arc::new(BufferedSink::new());
        let config = ScriptConfig {
            comment_prefix: String::new(),
            pause_directive: String::new(),
            ..fast_config()
        };
        let runner = ScriptRunner::new(config, sink.clone());
        let recorder = Recorder::default();

        let outcome = runner.run(lines(&["echo a", "echo b"]), &recorder).await;

        assert_eq!(outcome, ScriptOutcome::Completed { lines_executed: 2 });
        assert_eq!(*recorder.lines.lock().unwrap(), lines(&["echo a", "echo b"]));
    }

    #[tokio::test]
    async fn test_panicking_executor_returns_runner_to_idle() {
        let sink = Arc::new(BufferedSink::new());
        let runner = ScriptRunner::new(fast_config(), sink.clone());

        let outcome = runner.spawn(lines(&["boom"]), Arc::new(Exploder)).await.unwrap();

        assert!(matches!(outcome, ScriptOutcome::Failed(_)));
        assert!(!runner.is_running());
        assert_eq!(sink.messages_of(MessageKind::Error).len(), 1);
    }
}
