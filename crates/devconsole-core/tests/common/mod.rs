//! Shared helpers for DevConsole Core integration tests.

#![allow(dead_code)]

use devconsole_core::{BufferedSink, Console, ConsoleConfig};
use std::io::Write;
use std::sync::{Arc, Once};
use tempfile::NamedTempFile;

static TRACING: Once = Once::new();

/// Installs a test subscriber once per binary; honours `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Config with no inter-line delay so scripts finish quickly.
pub fn fast_config() -> ConsoleConfig {
    let mut config = ConsoleConfig::default();
    config.script.line_delay_ms = 0;
    config.script.default_pause_secs = 0.01;
    config
}

/// Console with builtins and a recording sink.
pub fn console_with_builtins() -> (Arc<Console>, Arc<BufferedSink>) {
    init_tracing();
    let sink = Arc::new(BufferedSink::new());
    let console = Console::with_builtins(fast_config(), sink.clone()).expect("builtins register");
    (console, sink)
}

/// Writes `content` to a temporary script file.
pub fn script_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp script");
    file.write_all(content.as_bytes()).expect("Failed to write temp script");
    file
}
