//! Stock commands every console gets.
//!
//! Handlers hold a weak reference to the console so the registry inside the
//! console does not keep the console itself alive.

use std::sync::{Arc, Weak};

use anyhow::Context;

use crate::console::Console;
use crate::error::Result;
use crate::output::MessageKind;

const HELP_DESCRIPTION: &str = "Displays all available commands\nUsage: help";
const CLEAR_DESCRIPTION: &str = "Clears the console\nUsage: clear";
const EXIT_DESCRIPTION: &str = "Exits the application\nUsage: exit";
const ECHO_DESCRIPTION: &str = "Prints the given text to the console\nUsage: echo <text>";
const VERSION_DESCRIPTION: &str = "Displays the current version of the application\nUsage: version";
const EXECUTE_SCRIPT_DESCRIPTION: &str =
    "Executes a script file\nUsage: execute_script <file_path>";

fn upgrade(console: &Weak<Console>) -> anyhow::Result<Arc<Console>> {
    console.upgrade().context("console is no longer available")
}

/// Register `name` with handler `run`, plus a `-h` variant printing its description.
fn register_with_help<F>(
    console: &Arc<Console>,
    name: &str,
    description: &str,
    run: F,
) -> Result<()>
where
    F: Fn(&Console, &[String]) -> anyhow::Result<()> + Send + Sync + 'static,
{
    let weak = Arc::downgrade(console);
    console.register_command(name, description, "", move |args| run(&*upgrade(&weak)?, args))?;

    let weak = Arc::downgrade(console);
    let topic = name.to_string();
    console.register_command(name, &format!("Shows help for {} command", name), "-h", move |_| {
        describe(&*upgrade(&weak)?, &topic);
        Ok(())
    })
}

fn describe(console: &Console, name: &str) {
    let description = console.command_description(name);
    console.write(&format!("{}: {}", name, description), MessageKind::Information);
}

/// Register help, clear, exit, echo, version and execute_script.
pub fn register_builtins(console: &Arc<Console>) -> Result<()> {
    let weak = Arc::downgrade(console);
    console.register_command("help", HELP_DESCRIPTION, "", move |_| {
        let console = upgrade(&weak)?;
        console.write("Available commands:", MessageKind::Success);
        for name in console.command_names() {
            console.write(&format!("  {}", name), MessageKind::Normal);
        }
        console.write(
            "Use '[command] -h' for more information on a specific command.",
            MessageKind::Information,
        );
        Ok(())
    })?;

    let weak = Arc::downgrade(console);
    console.register_command("help", "Shows help for a specific command", "-c", move |args| {
        let console = upgrade(&weak)?;
        match args.first() {
            Some(name) => describe(&console, name),
            None => console.write("Usage: help -c [command]", MessageKind::Information),
        }
        Ok(())
    })?;

    register_with_help(console, "clear", CLEAR_DESCRIPTION, |console, _| {
        console.clear();
        Ok(())
    })?;

    register_with_help(console, "exit", EXIT_DESCRIPTION, |console, _| {
        console.write("Exiting application...", MessageKind::Success);
        console.request_exit();
        Ok(())
    })?;

    register_with_help(console, "echo", ECHO_DESCRIPTION, |console, args| {
        console.write(&args.join(" "), MessageKind::Normal);
        Ok(())
    })?;

    register_with_help(console, "version", VERSION_DESCRIPTION, |console, _| {
        console.display_info();
        Ok(())
    })?;

    let weak = Arc::downgrade(console);
    console.register_command("execute_script", EXECUTE_SCRIPT_DESCRIPTION, "", move |args| {
        let console = upgrade(&weak)?;
        let Some(path) = args.first() else {
            console.write("Usage: execute_script <file_path>", MessageKind::Normal);
            return Ok(());
        };
        tokio::runtime::Handle::try_current().context("scripts need an async runtime")?;
        // Detached; progress and completion are reported through the sink.
        drop(console.run_script_file(path.as_str()));
        Ok(())
    })?;
    let weak = Arc::downgrade(console);
    console.register_command(
        "execute_script",
        "Shows help for execute_script command",
        "-h",
        move |_| {
            describe(&*upgrade(&weak)?, "execute_script");
            Ok(())
        },
    )?;

    tracing::debug!(commands = console.command_names().len(), "Builtin commands registered");
    Ok(())
}
