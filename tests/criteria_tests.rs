// tests/criteria_tests.rs

mod common;

use std::collections::HashSet;

use common::{Person, person};
use pretty_assertions::assert_eq;
use sieve::ast::Expr;
use sieve::error::{AccessError, ConstructionError};
use sieve::{ComparisonType, EntityFilterCriteria, Error, ErrorKind, FilterCriteria, Value};

fn filter(text: &str) -> EntityFilterCriteria<Person> {
    EntityFilterCriteria::parse(text).unwrap()
}

// ============================================================================
// Filter Criteria
// ============================================================================

#[test]
fn test_typed_construction() {
    let criteria = FilterCriteria::new::<Person>("Age", 30, ComparisonType::GreaterThan).unwrap();
    assert_eq!(criteria.name(), "Age");
    assert_eq!(criteria.value(), &Value::Integer(30));
    assert_eq!(criteria.comparison(), ComparisonType::GreaterThan);
    assert_eq!(criteria.property_type(), sieve::FieldType::I32);
    assert_eq!(criteria.to_string(), "Age > 30");
}

#[test]
fn test_typed_and_parsed_agree() {
    let typed = FilterCriteria::new::<Person>("Name", "John", ComparisonType::Equal).unwrap();
    let parsed = FilterCriteria::parse::<Person>("Name == 'John'").unwrap();
    assert_eq!(typed, parsed);

    let from_typed = EntityFilterCriteria::<Person>::from_criteria(&typed).unwrap();
    assert_eq!(from_typed, filter("Name == \"John\""));
}

#[test]
fn test_value_is_normalized_to_member_type() {
    let criteria = FilterCriteria::new::<Person>("Score", 3_i64, ComparisonType::LessThan).unwrap();
    assert_eq!(criteria.value(), &Value::Float(3.0));
    assert_eq!(
        EntityFilterCriteria::<Person>::from_criteria(&criteria).unwrap(),
        filter("Score < 3")
    );
}

#[test]
fn test_null_against_non_nullable() {
    let err = FilterCriteria::new::<Person>("Age", None::<i32>, ComparisonType::Equal).unwrap_err();
    assert!(matches!(
        err,
        Error::Construction(ConstructionError::NullNotAllowed { .. })
    ));
    assert_eq!(err.kind(), ErrorKind::Construction);

    let ok = FilterCriteria::new::<Person>("Score", None::<f64>, ComparisonType::Equal).unwrap();
    assert_eq!(ok.value(), &Value::Null);
}

#[test]
fn test_invalid_value_and_comparison() {
    let err = FilterCriteria::new::<Person>("Age", "thirty", ComparisonType::Equal).unwrap_err();
    assert!(matches!(err, Error::Construction(ConstructionError::InvalidValue { .. })));

    let err = FilterCriteria::new::<Person>("Name", "a", ComparisonType::GreaterThan).unwrap_err();
    assert!(matches!(
        err,
        Error::Construction(ConstructionError::InvalidComparison { .. })
    ));
}

#[test]
fn test_unknown_member_is_a_bind_error() {
    let err = FilterCriteria::new::<Person>("Height", 1, ComparisonType::Equal).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Bind);
}

#[test]
fn test_unsupported_shapes() {
    let reversed = Expr::binary(
        sieve::ast::BinOp::LessThan,
        Expr::literal(3),
        Expr::member("Age"),
    );
    let test_cases = vec![
        (reversed, "reversed comparison"),
        (Expr::member("Age").gt(1).and(Expr::member("Age").lt(9)), "logical expression"),
        (Expr::member("Age").gt(1).not(), "negation"),
        (Expr::member("Archived"), "member access"),
        (
            Expr::binary(sieve::ast::BinOp::Equal, Expr::member("Name"), Expr::member("Nickname")),
            "member to member comparison",
        ),
    ];

    for (expr, expected) in test_cases {
        match FilterCriteria::from_comparison::<Person>(&expr) {
            Err(Error::Construction(ConstructionError::UnsupportedShape { shape, .. })) => {
                assert_eq!(shape, expected, "Failed for {}", expr)
            }
            other => panic!("Expected unsupported shape for {}, got {:?}", expr, other),
        }
    }
}

// ============================================================================
// Entity Filter Criteria
// ============================================================================

#[test]
fn test_equality_by_canonical_text() {
    assert_eq!(filter("Age > 30"), filter("Age>30"));
    assert_eq!(filter("Name == 'x'"), filter("Name == \"x\""));
    assert_eq!(filter("(Age > 30)"), filter("Age > 30"));
    assert_ne!(filter("Age > 30"), filter("Age >= 31"));
}

#[test]
fn test_hash_consistency() {
    let mut set = HashSet::new();
    set.insert(filter("Age > 30"));
    set.insert(filter("Age>30"));
    set.insert(filter("  Age   >  30 "));
    set.insert(filter("Age >= 31"));
    assert_eq!(set.len(), 2);
}

#[test]
fn test_compiles_lazily_once() {
    let criteria = filter("Name == \"John\" && Age > 30");
    assert!(!criteria.is_compiled());

    assert!(criteria.matches(&person("John", 41)).unwrap());
    assert!(criteria.is_compiled());
    assert!(!criteria.matches(&person("John", 30)).unwrap());
    assert!(!criteria.matches(&person("Jane", 41)).unwrap());
}

#[test]
fn test_evaluation_error_carries_context() {
    let criteria = filter("Employer.Size > 10");
    let err = criteria.matches(&person("John", 41)).unwrap_err();
    assert_eq!(err.entity, "Person");
    assert_eq!(err.expression, "Employer.Size > 10");
    assert_eq!(
        err.source,
        AccessError::NullNavigation {
            segment: "Employer".to_string()
        }
    );
    assert_eq!(Error::from(err).status_code(), 500);
}

#[test]
fn test_combinators() {
    let both = filter("Age > 30").and(&filter("Archived")).unwrap();
    assert_eq!(both.expression(), "(Age > 30 && Archived)");

    let either = filter("Age > 30").or(&filter("Archived")).unwrap();
    let mut joan = person("Joan", 20);
    joan.archived = true;
    assert!(either.matches(&joan).unwrap());
    assert!(!both.matches(&joan).unwrap());
}

#[test]
fn test_handmade_tree_fails_compile() {
    let member = sieve::binder::resolve::<Person>("Name").unwrap();
    let predicate = sieve::Predicate::compare(member, ComparisonType::GreaterThan, Value::from("a"));
    let err = EntityFilterCriteria::new(predicate).unwrap_err();
    assert_eq!(err.entity, "Person");
    assert_eq!(Error::from(err).kind(), ErrorKind::Compile);
}

#[test]
fn test_clone_shares_text() {
    let original = filter("Age > 30");
    original.matches(&person("A", 40)).unwrap();
    let copy = original.clone();
    assert_eq!(copy, original);
    assert!(copy.is_compiled());
}
