//! Error taxonomy.
//!
//! Every stage has its own error type; [`Error`] tags them with a kind so
//! callers outside the engine (an HTTP layer, a CLI) can map a failure to a
//! status without matching on every variant.

use thiserror::Error;

use crate::descriptor::FieldType;

pub use crate::binder::{BindError, BindReason, CoercionError};
pub use crate::lexer::LexError;
pub use crate::parser::ParseError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error(transparent)]
    Construction(#[from] ConstructionError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Lex,
    Parse,
    Bind,
    Construction,
    Compile,
    Evaluation,
    Range,
    Serialization,
}

impl ErrorKind {
    /// HTTP-style status a transport layer should answer with.
    pub fn status_code(self) -> u16 {
        match self {
            Self::Lex | Self::Parse | Self::Range | Self::Serialization => 400,
            Self::Bind | Self::Construction => 422,
            Self::Compile | Self::Evaluation => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lex => "lex",
            Self::Parse => "parse",
            Self::Bind => "bind",
            Self::Construction => "construction",
            Self::Compile => "compile",
            Self::Evaluation => "evaluation",
            Self::Range => "range",
            Self::Serialization => "serialization",
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Lex(_) => ErrorKind::Lex,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Bind(_) => ErrorKind::Bind,
            Self::Construction(_) => ErrorKind::Construction,
            Self::Compile(_) => ErrorKind::Compile,
            Self::Evaluation(_) => ErrorKind::Evaluation,
            Self::Range(_) => ErrorKind::Range,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }
}

/// A filter criteria value/comparison combination that cannot be built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstructionError {
    #[error("null is not allowed for non-nullable member '{member}' of type {field_type}")]
    NullNotAllowed { member: String, field_type: FieldType },
    #[error("invalid value for member '{member}': {source}")]
    InvalidValue {
        member: String,
        #[source]
        source: CoercionError,
    },
    #[error("comparison `{comparison}` is not defined for member '{member}' of type {field_type}")]
    InvalidComparison {
        member: String,
        comparison: &'static str,
        field_type: FieldType,
    },
    #[error("expected a `member <op> constant` comparison, found {shape} `{expression}`")]
    UnsupportedShape {
        shape: &'static str,
        expression: String,
    },
}

/// A structurally valid predicate tree that cannot be turned into a closure.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot compile filter `{expression}` for {entity}: {reason}")]
pub struct CompileError {
    pub entity: &'static str,
    pub expression: String,
    pub reason: String,
}

/// Failure while running a compiled predicate or comparator on an entity.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("evaluating `{expression}` against {entity} failed: {source}")]
pub struct EvaluationError {
    pub entity: &'static str,
    pub expression: String,
    #[source]
    pub source: AccessError,
}

/// Failure reading a member value from an entity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccessError {
    #[error("'{segment}' is absent, cannot navigate into it")]
    NullNavigation { segment: String },
    #[error("member '{member}' declared as {expected} produced a {found} value")]
    TypeMismatch {
        member: String,
        expected: FieldType,
        found: &'static str,
    },
    #[error("predicate was not compiled: {0}")]
    Uncompiled(String),
    #[error("{0}")]
    Custom(String),
}

/// A paging argument outside its allowed range. Never clamped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("{name} must be at least {min}, got {value}")]
    BelowMinimum {
        name: &'static str,
        value: i64,
        min: i64,
    },
    #[error("page {page} with page size {page_size} overflows the skip count")]
    Overflow { page: i64, page_size: i64 },
}
