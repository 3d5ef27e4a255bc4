//! Filter expressions, ordering and paging over typed entities.
//!
//! Text such as `Name == "John" && Age > 30` is lexed, parsed and bound
//! against an entity's member table ([`Descriptor`]), producing an
//! [`EntityFilterCriteria`] that compiles to a closure once and compares by
//! canonical text. A [`QuerySpecification`] gathers filters, search criteria,
//! a sort chain and a paging window, and crosses process boundaries as JSON.
//!
//! ```
//! use once_cell::sync::Lazy;
//! use sieve::{Descriptor, Entity, EntityFilterCriteria, FieldType};
//!
//! struct Person {
//!     name: String,
//!     age: i32,
//! }
//!
//! impl Entity for Person {
//!     fn descriptor() -> &'static Descriptor<Self> {
//!         static DESCRIPTOR: Lazy<Descriptor<Person>> = Lazy::new(|| {
//!             Descriptor::builder("Person")
//!                 .field("Name", FieldType::STRING, |p: &Person| p.name.clone())
//!                 .field("Age", FieldType::I32, |p: &Person| p.age)
//!                 .build()
//!         });
//!         &DESCRIPTOR
//!     }
//! }
//!
//! let filter = EntityFilterCriteria::<Person>::parse("Name == 'John' && Age>30").unwrap();
//! assert_eq!(filter.to_string(), r#"(Name == "John" && Age > 30)"#);
//!
//! let john = Person { name: "John".into(), age: 41 };
//! assert!(filter.matches(&john).unwrap());
//! ```

pub mod ast;
pub mod binder;
pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod entity_filter;
pub mod error;
pub mod evaluator;
pub mod filter;
pub mod lexer;
pub mod order;
pub mod parser;
pub mod predicate;
pub mod search;
pub mod serialize;
pub mod specification;
pub mod value;

pub use ast::{ComparisonType, Expr, Token, TokenKind};
pub use binder::{bind, bind_text};
pub use cache::{CacheStats, PredicateCache};
pub use config::Limits;
pub use descriptor::{Descriptor, Entity, FieldType, Member, ScalarType};
pub use entity_filter::EntityFilterCriteria;
pub use error::{Error, ErrorKind, Result};
pub use evaluator::{InMemoryEvaluator, SpecificationEvaluator};
pub use filter::FilterCriteria;
pub use lexer::{LexError, Lexer, tokenize};
pub use order::{OrderDescriptor, SortBuilder, SortDirection};
pub use parser::{ParseError, Parser, parse, parse_with};
pub use predicate::Predicate;
pub use search::{SearchBuilder, SearchCriterion};
pub use serialize::{from_json, to_json, to_json_pretty};
pub use specification::{ProjectedSpecification, QueryFlags, QuerySpecification};
pub use value::Value;
