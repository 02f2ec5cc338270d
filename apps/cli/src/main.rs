//! DevConsole CLI - terminal host for the DevConsole command interpreter.
//!
//! Runs an interactive console with history recall and Tab completion, or
//! replays a script file non-interactively with `--script`.

mod colors;
mod editor;
mod screen;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use devconsole_core::{ChannelSink, Console, ConsoleConfig, OutputEvent, ScriptOutcome};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use editor::{EditorAction, LineEditor};
use screen::Screen;

/// DevConsole - interactive developer command console
#[derive(Parser, Debug)]
#[command(
    name = "devconsole",
    author,
    version,
    about = "DevConsole - interactive developer command console"
)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a script file and exit instead of starting the interactive console
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Maximum number of history entries (overrides the config file)
    #[arg(long)]
    history_size: Option<usize>,

    /// Disable coloured output
    #[arg(long)]
    no_color: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

/// Restores cooked mode on drop, including on early return.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Logs go to stderr so they never interleave with console output.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr).with_target(false))
        .init();

    if args.no_color {
        colored::control::set_override(false);
    }

    let config = load_config(&args)?;
    let (sink, events) = ChannelSink::new();
    let console = Console::with_builtins(config, Arc::new(sink))?;

    match args.script {
        Some(path) => run_script(console, events, path).await,
        None => run_interactive(console, events).await,
    }
}

fn load_config(args: &Args) -> anyhow::Result<ConsoleConfig> {
    let mut config = ConsoleConfig::load_or_default(args.config.as_deref())
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    if let Some(size) = args.history_size {
        config.history.max_entries = size;
    }
    config.validate()?;
    tracing::debug!(?config, "Configuration loaded");
    Ok(config)
}

/// Drain console output onto the screen until every sender is gone.
fn spawn_renderer(
    screen: Arc<Screen>,
    mut events: UnboundedReceiver<OutputEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Err(err) = screen.show(&event) {
                tracing::error!(error = %err, "Failed to write console output");
                break;
            }
        }
    })
}

async fn run_script(
    console: Arc<Console>,
    events: UnboundedReceiver<OutputEvent>,
    path: PathBuf,
) -> anyhow::Result<ExitCode> {
    let renderer = spawn_renderer(Arc::new(Screen::plain()), events);

    let outcome = console.run_script_file(path).await?;
    tracing::info!(?outcome, "Script finished");

    // Dropping the console closes the output channel so the renderer drains and stops.
    drop(console);
    renderer.await?;

    Ok(match outcome {
        ScriptOutcome::Completed { .. } | ScriptOutcome::Cancelled { .. } => ExitCode::SUCCESS,
        ScriptOutcome::Rejected | ScriptOutcome::Failed(_) => ExitCode::FAILURE,
    })
}

/// Forward key presses from a blocking reader until the receiver is dropped.
fn spawn_key_reader(tx: UnboundedSender<KeyEvent>) -> JoinHandle<io::Result<()>> {
    tokio::task::spawn_blocking(move || {
        while !tx.is_closed() {
            if !event::poll(Duration::from_millis(100))? {
                continue;
            }
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
                && tx.send(key).is_err()
            {
                break;
            }
        }
        Ok(())
    })
}

async fn run_interactive(
    console: Arc<Console>,
    events: UnboundedReceiver<OutputEvent>,
) -> anyhow::Result<ExitCode> {
    let _raw = RawModeGuard::enable().context("Failed to enable raw terminal mode")?;
    let screen = Arc::new(Screen::interactive());
    let renderer = spawn_renderer(Arc::clone(&screen), events);

    let (key_tx, mut keys) = mpsc::unbounded_channel();
    let reader = spawn_key_reader(key_tx);

    console.display_info();
    screen.set_input("")?;

    let mut editor = LineEditor::new();
    let mut tick = tokio::time::interval(Duration::from_millis(100));

    while !console.exit_requested() {
        let key = tokio::select! {
            key = keys.recv() => key,
            _ = tick.tick() => continue,
        };
        // Reader stopped; its error, if any, is reported below.
        let Some(key) = key else { break };

        match editor.handle_key(key, &console) {
            EditorAction::Submit(line) => {
                screen.commit_input(&line)?;
                let _ = console.execute(&line);
            }
            EditorAction::Redraw => screen.set_input(editor.buffer())?,
            EditorAction::Quit => break,
            EditorAction::Nothing => {}
        }
    }

    console.scripts().cancel();
    drop(keys);
    reader.await??;

    // Output still queued (e.g. "Exiting application...") drains once the channel closes.
    drop(console);
    if tokio::time::timeout(Duration::from_millis(500), renderer).await.is_err() {
        tracing::debug!("Renderer did not drain before shutdown");
    }
    screen.finish()?;
    tracing::info!("Console closed");
    Ok(ExitCode::SUCCESS)
}
