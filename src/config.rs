//! Parser limits.
//!
//! Filters arrive from untrusted callers, so input length and nesting depth
//! are bounded. The defaults fit any hand-written filter by a wide margin.

use std::env;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_INPUT_LEN: usize = 4096;
pub const DEFAULT_MAX_DEPTH: usize = 64;

const MAX_INPUT_LEN_VAR: &str = "SIEVE_MAX_INPUT_LEN";
const MAX_DEPTH_VAR: &str = "SIEVE_MAX_DEPTH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Limits {
    /// Maximum filter length in characters
    pub max_input_len: usize,
    /// Maximum nesting of parentheses and negations
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_input_len: DEFAULT_MAX_INPUT_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Limits {
    /// Defaults overridden by `SIEVE_MAX_INPUT_LEN` / `SIEVE_MAX_DEPTH`.
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut limits = Limits::default();
        if let Some(len) = read_var(MAX_INPUT_LEN_VAR) {
            limits.max_input_len = len;
        }
        if let Some(depth) = read_var(MAX_DEPTH_VAR) {
            limits.max_depth = depth;
        }
        limits
    }
}

fn read_var(name: &str) -> Option<usize> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "ignoring unparseable limit");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let limits: Limits = serde_json::from_str(r#"{"maxDepth": 8}"#).unwrap();
        assert_eq!(limits.max_depth, 8);
        assert_eq!(limits.max_input_len, DEFAULT_MAX_INPUT_LEN);
    }
}
