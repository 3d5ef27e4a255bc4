use std::fmt;

use serde::{Deserialize, Serialize};

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    // Comparison
    /// Equal (`==`)
    Equal,
    /// Not equal (`!=`)
    NotEqual,
    /// Less than (`<`)
    LessThan,
    /// Greater than (`>`)
    GreaterThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than or equal (`>=`)
    GreaterEqual,

    // Logical
    /// Logical AND (`&&`)
    And,
    /// Logical OR (`||`)
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Equal => "==",
            BinOp::NotEqual => "!=",
            BinOp::LessThan => "<",
            BinOp::GreaterThan => ">",
            BinOp::LessEqual => "<=",
            BinOp::GreaterEqual => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    /// The comparison this operator denotes, or `None` for `&&` / `||`.
    pub fn comparison(self) -> Option<ComparisonType> {
        match self {
            BinOp::Equal => Some(ComparisonType::Equal),
            BinOp::NotEqual => Some(ComparisonType::NotEqual),
            BinOp::LessThan => Some(ComparisonType::LessThan),
            BinOp::GreaterThan => Some(ComparisonType::GreaterThan),
            BinOp::LessEqual => Some(ComparisonType::LessThanOrEqual),
            BinOp::GreaterEqual => Some(ComparisonType::GreaterThanOrEqual),
            BinOp::And | BinOp::Or => None,
        }
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

impl From<ComparisonType> for BinOp {
    fn from(comparison: ComparisonType) -> Self {
        match comparison {
            ComparisonType::Equal => BinOp::Equal,
            ComparisonType::NotEqual => BinOp::NotEqual,
            ComparisonType::GreaterThan => BinOp::GreaterThan,
            ComparisonType::GreaterThanOrEqual => BinOp::GreaterEqual,
            ComparisonType::LessThan => BinOp::LessThan,
            ComparisonType::LessThanOrEqual => BinOp::LessEqual,
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Logical negation (`!`)
    Not,
}

/// The kind of comparison between a member and a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonType {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl ComparisonType {
    pub fn symbol(self) -> &'static str {
        BinOp::from(self).symbol()
    }

    /// Ordering comparisons need a totally ordered member type.
    pub fn is_ordering(self) -> bool {
        !matches!(self, ComparisonType::Equal | ComparisonType::NotEqual)
    }

    /// The comparison that holds after swapping operands: `3 < x` is `x > 3`.
    pub fn mirrored(self) -> Self {
        match self {
            ComparisonType::Equal => ComparisonType::Equal,
            ComparisonType::NotEqual => ComparisonType::NotEqual,
            ComparisonType::GreaterThan => ComparisonType::LessThan,
            ComparisonType::GreaterThanOrEqual => ComparisonType::LessThanOrEqual,
            ComparisonType::LessThan => ComparisonType::GreaterThan,
            ComparisonType::LessThanOrEqual => ComparisonType::GreaterThanOrEqual,
        }
    }
}

impl fmt::Display for ComparisonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
