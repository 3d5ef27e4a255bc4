use std::fmt;

use crate::ast::{BinOp, UnaryOp};
use crate::value::quote_string;

/// Abstract Syntax Tree node representing a parsed filter expression.
///
/// Besides coming out of the parser, trees can be assembled in code with the
/// builder helpers:
///
/// ```
/// use sieve::ast::Expr;
///
/// let expr = Expr::member("Age").gt(30).and(Expr::member("Name").eq("John"));
/// assert_eq!(expr.to_string(), r#"(Age > 30 && Name == "John")"#);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal constant
    ///
    /// # Example
    /// ```text
    /// "John"
    /// 42
    /// null
    /// ```
    Literal(Literal),

    /// Member access on the entity
    ///
    /// # Examples
    /// ```text
    /// Age
    /// Address.City
    /// ```
    Member(MemberPath),

    /// Unary operation
    ///
    /// # Example
    /// ```text
    /// !Archived
    /// ```
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Binary operation (comparison or logical connective)
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// Literal value as written in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Unescaped string body
    String(String),
    /// Number source text; parsed against the member type during binding
    Number(String),
    Boolean(bool),
    Null,
}

/// Dotted chain of member names, e.g. `Address.City`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberPath {
    pub segments: Vec<String>,
}

impl MemberPath {
    /// Split a dotted path: `"Address.City"` → `["Address", "City"]`.
    pub fn parse(path: &str) -> Self {
        MemberPath {
            segments: path.split('.').map(|s| s.trim().to_string()).collect(),
        }
    }

    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// The dotted form used as the descriptor table key.
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

impl Expr {
    pub fn member(path: &str) -> Self {
        Expr::Member(MemberPath::parse(path))
    }

    pub fn literal(value: impl Into<Literal>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn null() -> Self {
        Expr::Literal(Literal::Null)
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eq(self, value: impl Into<Literal>) -> Self {
        Expr::binary(BinOp::Equal, self, Expr::literal(value))
    }

    pub fn ne(self, value: impl Into<Literal>) -> Self {
        Expr::binary(BinOp::NotEqual, self, Expr::literal(value))
    }

    pub fn gt(self, value: impl Into<Literal>) -> Self {
        Expr::binary(BinOp::GreaterThan, self, Expr::literal(value))
    }

    pub fn ge(self, value: impl Into<Literal>) -> Self {
        Expr::binary(BinOp::GreaterEqual, self, Expr::literal(value))
    }

    pub fn lt(self, value: impl Into<Literal>) -> Self {
        Expr::binary(BinOp::LessThan, self, Expr::literal(value))
    }

    pub fn le(self, value: impl Into<Literal>) -> Self {
        Expr::binary(BinOp::LessEqual, self, Expr::literal(value))
    }

    pub fn and(self, other: Expr) -> Self {
        Expr::binary(BinOp::And, self, other)
    }

    pub fn or(self, other: Expr) -> Self {
        Expr::binary(BinOp::Or, self, other)
    }

    pub fn not(self) -> Self {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }

    /// Short name of the node shape, used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            Expr::Literal(_) => "literal",
            Expr::Member(_) => "member access",
            Expr::Unary { .. } => "negation",
            Expr::Binary { op, .. } if op.is_logical() => "logical expression",
            Expr::Binary { .. } => "comparison",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => f.write_str(&quote_string(s)),
            Literal::Number(text) => f.write_str(text),
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::Null => f.write_str("null"),
        }
    }
}

/// Prints the same canonical shape as a bound predicate, except that number
/// literals keep their source text.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(literal) => write!(f, "{literal}"),
            Expr::Member(path) => write!(f, "{path}"),
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => write!(f, "!({operand})"),
            Expr::Binary { op, left, right } if op.is_logical() => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            Expr::Binary { op, left, right } => write!(f, "{left} {} {right}", op.symbol()),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Boolean(b)
    }
}

macro_rules! number_literal {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Literal {
                fn from(n: $ty) -> Self {
                    Literal::Number(n.to_string())
                }
            }
        )*
    };
}

number_literal!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, rust_decimal::Decimal);

impl<V: Into<Literal>> From<Option<V>> for Literal {
    fn from(value: Option<V>) -> Self {
        value.map_or(Literal::Null, Into::into)
    }
}
