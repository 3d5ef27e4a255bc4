//! Validate filter text without binding it to an entity type

use super::CliError;
use crate::config::Limits;
use crate::serialize::{self, FilterWire};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The filter to validate
    pub filter: String,
    /// Print the `{"Filter": ...}` wire object instead of the bare text
    pub wire: bool,
    /// Pretty-print the wire object
    pub pretty: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Canonical text of a valid filter
    Canonical(String),
    /// Serialized wire object of a valid filter
    Wire(String),
}

/// Parse a filter and render it in canonical form.
///
/// Without an entity type there is nothing to bind against, so only lexing
/// and parsing are checked and number literals keep their source spelling.
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let text = serialize::normalize_filter_text(&options.filter);
    if text.is_empty() {
        return Err(CliError::NoInput);
    }

    let expr = crate::parse_with(&text, &Limits::from_env())?;
    let canonical = expr.to_string();
    if !options.wire {
        return Ok(CheckResult::Canonical(canonical));
    }

    let wire = FilterWire { filter: canonical };
    let json = if options.pretty {
        serde_json::to_string_pretty(&wire)?
    } else {
        serde_json::to_string(&wire)?
    };
    Ok(CheckResult::Wire(json))
}

/// Read a `{"Filter": ...}` object and return its normalized, validated text.
pub fn execute_unwire(json: &str) -> Result<String, CliError> {
    let wire: FilterWire = serde_json::from_str(json)?;
    let text = serialize::normalize_filter_text(&wire.filter);
    crate::parse_with(&text, &Limits::from_env())?;
    Ok(text)
}
