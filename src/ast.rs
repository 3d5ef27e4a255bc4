//! # Filter Expression Language - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for the filter
//! expression language: a small boolean language over the members of a
//! single entity type.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, member paths, operations)
//! - **[operators]** - Comparison and logical operators
//!
//! ## Quick Start
//!
//! ```text
//! Name == 'John' && Age > 30
//! (Status == 1 || Status == 2) && !Archived
//! Address.City != null
//! ```
//!
//! ## Precedence
//!
//! From lowest to highest: `||`, `&&`, `!`, comparison. `!` applies to a whole
//! comparison, so `!Age > 30` reads as `!(Age > 30)`. Parentheses group
//! connectives anywhere a comparison may appear.
//!
//! The AST only lives for the duration of one parse; the binder turns it into
//! a typed [`Predicate`](crate::predicate::Predicate) and it is discarded.
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{Expr, Literal, MemberPath};
pub use operators::{BinOp, ComparisonType, UnaryOp};
pub use tokens::{Token, TokenKind};
