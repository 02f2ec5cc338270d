//! Input line parsing.
//!
//! A line is tokenized (double-quoted spans stay whole), the first token
//! becomes the lowercased command name, and the remaining tokens are split
//! into flags and arguments. Flags are numbered 1, 2, 3… in the order they
//! appear; every argument is tagged with the position of the most recent
//! flag before it, or 0 when no flag has been seen yet.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ParseError;

// A run of non-space, non-quote characters, or a complete "quoted span".
static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^\s"]+|"([^"]*)""#).expect("valid token pattern"));

/// An argument together with the flag position it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    /// 1-based flag position, 0 when no flag preceded the argument.
    pub position: usize,
    pub value: String,
}

impl Argument {
    pub fn new(position: usize, value: impl Into<String>) -> Self {
        Self { position, value: value.into() }
    }

    /// Legacy `"<position> <value>"` rendering; unflagged values render as-is.
    pub fn encoded(&self) -> String {
        if self.position == 0 {
            self.value.clone()
        } else {
            format!("{} {}", self.position, self.value)
        }
    }
}

/// Result of parsing one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lowercased command name.
    pub name: String,
    /// `(position, token)` for every flag, in input order.
    pub flags: Vec<(usize, String)>,
    pub arguments: Vec<Argument>,
}

impl ParsedCommand {
    /// First flag token, the one used for registry matching.
    pub fn primary_flag(&self) -> Option<&str> {
        self.flags.first().map(|(_, flag)| flag.as_str())
    }

    pub fn has_flags(&self) -> bool {
        !self.flags.is_empty()
    }

    /// Argument values routed to the flag at `position`.
    ///
    /// Position 0 returns every argument value regardless of its flag.
    pub fn args_for_position(&self, position: usize) -> Vec<String> {
        if position == 0 {
            return self.arguments.iter().map(|arg| arg.value.clone()).collect();
        }
        self.arguments
            .iter()
            .filter(|arg| arg.position == position)
            .map(|arg| arg.value.clone())
            .collect()
    }

    /// Arguments in their legacy encoded form.
    pub fn encoded_arguments(&self) -> Vec<String> {
        self.arguments.iter().map(Argument::encoded).collect()
    }
}

/// Split a raw line into tokens.
///
/// Quoted spans lose their quotes and keep inner whitespace. A quote without
/// a partner is dropped.
pub fn tokenize(input: &str) -> Vec<String> {
    TOKEN_PATTERN
        .captures_iter(input)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Separate flags from arguments in the tokens following the command name.
pub fn split_flags<I, S>(tokens: I) -> (Vec<(usize, String)>, Vec<Argument>)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut flags = Vec::new();
    let mut arguments = Vec::new();
    let mut flag_index = 0;

    for token in tokens {
        let token = token.into();
        if token.starts_with('-') {
            flag_index += 1;
            flags.push((flag_index, token));
        } else {
            arguments.push(Argument::new(flag_index, token));
        }
    }

    (flags, arguments)
}

/// Parse a raw input line.
pub fn parse(input: &str) -> Result<ParsedCommand, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut tokens = tokenize(input).into_iter();
    let Some(first) = tokens.next() else {
        return Err(ParseError::NoTokens);
    };

    let (flags, arguments) = split_flags(tokens);
    Ok(ParsedCommand { name: first.to_lowercase(), flags, arguments })
}
