// tests/binder_tests.rs

mod common;

use common::{Person, person};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use sieve::ast::ComparisonType;
use sieve::binder::{self, BindReason, CoercionError};
use sieve::{Error, Value, bind_text, parse};

fn bind_err(text: &str) -> BindReason {
    match bind_text::<Person>(text) {
        Err(Error::Bind(err)) => err.reason,
        other => panic!("Expected bind error for {}, got {:?}", text, other),
    }
}

fn eval(text: &str, target: &Person) -> bool {
    let compiled = bind_text::<Person>(text).unwrap().compile().unwrap();
    compiled(target).unwrap()
}

// ============================================================================
// Member resolution
// ============================================================================

#[test]
fn test_unknown_member() {
    assert_eq!(bind_err("Unknown == 1"), BindReason::UnknownMember);

    let err = bind_text::<Person>("Unknown == 1").unwrap_err();
    assert_eq!(err.status_code(), 422);
    assert!(err.to_string().contains("`Unknown` on Person"), "{}", err);
}

#[test]
fn test_nested_member_resolves() {
    let predicate = bind_text::<Person>("Address.City == 'Oslo'").unwrap();
    assert_eq!(predicate.member_paths(), vec!["Address.City"]);
    assert_eq!(bind_err("Address.Street == 'x'"), BindReason::UnknownMember);
}

#[test]
fn test_resolve() {
    let member = binder::resolve::<Person>("Employer.Size").unwrap();
    assert_eq!(member.field_type(), sieve::FieldType::U32);
    assert!(binder::resolve::<Person>("Employer").is_err());
}

// ============================================================================
// Literal coercion
// ============================================================================

#[test]
fn test_enum_compares_by_integer() {
    let mut p = person("Jane", 30);
    p.status = common::Status::Pending;
    assert!(eval("Status == 2", &p));
    assert!(!eval("Status == 1", &p));
    assert!(eval("Status >= 2", &p));
}

#[test]
fn test_enum_rejects_string() {
    assert!(matches!(
        bind_err("Status == \"Active\""),
        BindReason::Coercion(CoercionError::Invalid { .. })
    ));
}

#[test]
fn test_integer_member_rejects_fraction_and_overflow() {
    assert!(matches!(bind_err("Age == 1.5"), BindReason::Coercion(_)));
    assert!(matches!(bind_err("Age > 3000000000"), BindReason::Coercion(_)));
    assert!(matches!(bind_err("Employer.Size > -1"), BindReason::Coercion(_)));
}

#[test]
fn test_string_member_accepts_only_strings() {
    assert!(matches!(bind_err("Name == 3"), BindReason::Coercion(_)));
    assert!(matches!(bind_err("Name == true"), BindReason::Coercion(_)));
    assert!(bind_text::<Person>("Name == '3'").is_ok());
}

#[test]
fn test_bool_member_accepts_only_booleans() {
    assert!(matches!(bind_err("Archived == 1"), BindReason::Coercion(_)));
    assert!(bind_text::<Person>("Archived == false").is_ok());
}

#[test]
fn test_null_only_for_nullable_members() {
    assert!(bind_text::<Person>("Score == null").is_ok());
    assert!(bind_text::<Person>("Nickname != null").is_ok());
    assert_eq!(
        bind_err("Age == null"),
        BindReason::Coercion(CoercionError::NullNotAllowed(sieve::FieldType::I32))
    );
    assert_eq!(
        bind_err("Score > null"),
        BindReason::NullOrdering(ComparisonType::GreaterThan)
    );
}

#[test]
fn test_decimal_literals() {
    let mut p = person("Bob", 35);
    p.balance = Decimal::new(125050, 2);
    assert!(eval("Balance > 1250.49", &p));
    assert!(eval("Balance == 1250.5", &p));
    assert!(eval("Balance < 1.3e3", &p));
}

#[test]
fn test_f32_member() {
    let p = person("Al", 20);
    assert!(eval("Ratio == 0.5", &p));
    assert!(eval("Ratio < 0.6", &p));
}

#[test]
fn test_coerce_literal_directly() {
    let number = sieve::ast::Literal::Number("7".to_string());
    assert_eq!(
        binder::coerce_literal(&number, sieve::FieldType::U8.nullable()),
        Ok(Value::Unsigned(7))
    );
}

// ============================================================================
// Operators and shapes
// ============================================================================

#[test]
fn test_ordering_invalid_for_strings_and_bools() {
    assert!(matches!(bind_err("Name > 'a'"), BindReason::InvalidOperator { .. }));
    assert!(matches!(bind_err("Archived <= true"), BindReason::InvalidOperator { .. }));
}

#[test]
fn test_bare_member_must_be_bool() {
    assert!(bind_text::<Person>("Archived").is_ok());
    assert!(matches!(bind_err("Age"), BindReason::NotBoolean(_)));
}

#[test]
fn test_reversed_comparison_is_mirrored() {
    let expr = sieve::ast::Expr::binary(
        sieve::ast::BinOp::LessThan,
        sieve::ast::Expr::literal(3),
        sieve::ast::Expr::member("Age"),
    );
    let predicate = sieve::bind::<Person>(&expr).unwrap();
    assert_eq!(predicate.to_string(), "Age > 3");
}

#[test]
fn test_member_to_member_is_rejected() {
    let expr = sieve::ast::Expr::binary(
        sieve::ast::BinOp::Equal,
        sieve::ast::Expr::member("Name"),
        sieve::ast::Expr::member("Nickname"),
    );
    let err = sieve::bind::<Person>(&expr).unwrap_err();
    assert_eq!(err.reason, BindReason::UnsupportedComparison);
}

// ============================================================================
// Canonical text and evaluation
// ============================================================================

#[test]
fn test_canonical_text() {
    let test_cases = vec![
        ("Age>30", "Age > 30"),
        ("Name == 'x'", "Name == \"x\""),
        ("Status == 02", "Status == 2"),
        ("Score == 1.50", "Score == 1.5"),
        ("Balance == 1.50", "Balance == 1.50"),
        ("!Archived || Age <= -1", "(!(Archived) || Age <= -1)"),
        ("Nickname == \"say \\\"hi\\\"\"", "Nickname == \"say \\\"hi\\\"\""),
    ];

    for (input, expected) in test_cases {
        let predicate = bind_text::<Person>(input).unwrap();
        assert_eq!(predicate.to_string(), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_canonical_text_reparses_to_itself() {
    let text = "((Name == 'John' && Age > 30) || !(Address.City != \"Oslo\"))";
    let once = bind_text::<Person>(text).unwrap().to_string();
    let twice = bind_text::<Person>(&once).unwrap().to_string();
    assert_eq!(once, twice);
}

#[test]
fn test_evaluation() {
    let john = person("John", 41);
    assert!(eval("Name == \"John\" && Age > 30", &john));
    assert!(!eval("Name == \"John\" && Age > 50", &john));
    assert!(eval("Name == 'Bob' || Age > 40", &john));
    assert!(eval("!Archived", &john));
    assert!(eval("Address.City == 'Oslo'", &john));
}

#[test]
fn test_null_comparisons() {
    let p = person("John", 41);
    assert!(eval("Score == null", &p));
    assert!(!eval("Score != null", &p));
    assert!(!eval("Score > 10", &p));
    assert!(!eval("Score <= 10", &p));
    assert!(eval("Score != 10", &p));
}

#[test]
fn test_navigation_through_absent_parent_fails() {
    let p = person("John", 41);
    let compiled = bind_text::<Person>("Employer.Size > 10")
        .unwrap()
        .compile()
        .unwrap();
    assert!(compiled(&p).is_err());
}

#[test]
fn test_parse_error_is_not_a_bind_error() {
    assert!(parse("Name == 30 &&").is_err());
    assert!(matches!(bind_text::<Person>("Name == 30 &&"), Err(Error::Parse(_))));
}

#[test]
fn test_long_chains_fail_before_binding() {
    let text = vec!["Age>1"; 580].join("&&");

    // Small stack: binding an unbounded chain would overflow it
    let handle = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || {
            let bound = bind_text::<Person>(&text).map(|_| ());
            let parsed = sieve::EntityFilterCriteria::<Person>::parse(&text).map(|_| ());
            (bound, parsed)
        })
        .unwrap();
    let (bound, parsed) = handle.join().unwrap();

    assert!(matches!(bound, Err(Error::Parse(_))));
    assert!(matches!(parsed, Err(Error::Parse(_))));
}
