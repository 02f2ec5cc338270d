//! Error types for the developer console.

use std::path::PathBuf;

use thiserror::Error;

/// Reasons a raw input line produced no command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Input was empty or whitespace only.
    #[error("Empty command input")]
    Empty,

    /// Input had content but no usable tokens (e.g. a lone quote).
    #[error("No command found in input")]
    NoTokens,
}

/// Reasons a parsed command could not be matched against the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No unflagged registration exists for the name.
    #[error("Command '{name}' not found.")]
    CommandNotFound {
        /// Lowercased command name from the input.
        name: String,
    },

    /// The line carried flags but no registration matches the first one.
    #[error("Command '{name}' does not support the provided flag.")]
    FlagNotSupported {
        /// Lowercased command name from the input.
        name: String,
        /// First flag token of the line.
        flag: String,
    },
}

/// Script runner errors.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// A script is already in flight.
    #[error("Another script is currently executing")]
    AlreadyRunning,

    /// The script file could not be read.
    #[error("Script file not found: {}", path.display())]
    FileMissing {
        /// Requested path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A `pause(...)` directive did not contain a usable duration.
    #[error("Error parsing pause time: {0}")]
    PauseParse(String),
}

/// Core error type for console operations.
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// Parse failures.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Dispatch failures.
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Script failures.
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid command definition.
    #[error("invalid command definition: {0}")]
    InvalidDefinition(String),
}

/// Result type alias for console operations.
pub type Result<T> = std::result::Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_messages() {
        let err = DispatchError::CommandNotFound { name: "warp".to_string() };
        assert_eq!(err.to_string(), "Command 'warp' not found.");

        let err =
            DispatchError::FlagNotSupported { name: "warp".to_string(), flag: "-x".to_string() };
        assert_eq!(err.to_string(), "Command 'warp' does not support the provided flag.");
    }

    #[test]
    fn test_console_error_parse_conversion() {
        let err: ConsoleError = ParseError::Empty.into();
        match err {
            ConsoleError::Parse(ParseError::Empty) => {}
            _ => panic!("Expected Parse error variant"),
        }
    }

    #[test]
    fn test_console_error_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: ConsoleError = io_err.into();
        assert!(matches!(err, ConsoleError::Io(_)));
    }

    #[test]
    fn test_script_file_missing_display() {
        let err = ScriptError::FileMissing {
            path: PathBuf::from("boot.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "nope"),
        };
        assert_eq!(err.to_string(), "Script file not found: boot.txt");
    }

    #[test]
    fn test_console_error_config() {
        let err = ConsoleError::Config("bad history size".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Configuration error"));
        assert!(msg.contains("bad history size"));
    }
}
