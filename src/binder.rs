//! Binding: AST + entity type → typed [`Predicate`].
//!
//! Member paths are resolved through the entity's [`Descriptor`] table and
//! every literal is coerced to the declared type of the member it is compared
//! with. Enum members compare through their integer representation; nullable
//! members coerce against their underlying type and additionally accept
//! `null`.
//!
//! [`Descriptor`]: crate::descriptor::Descriptor

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    ast::{BinOp, ComparisonType, Expr, Literal, UnaryOp},
    config::Limits,
    descriptor::{Entity, FieldType, Member, ScalarType},
    error::Error,
    parser,
    predicate::Predicate,
    value::Value,
};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot bind `{member_path}` on {entity}: {reason}")]
pub struct BindError {
    pub entity: &'static str,
    pub member_path: String,
    pub reason: BindReason,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindReason {
    #[error("no such member")]
    UnknownMember,
    #[error(transparent)]
    Coercion(#[from] CoercionError),
    #[error("operator `{op}` is not defined for {field_type}")]
    InvalidOperator {
        op: ComparisonType,
        field_type: FieldType,
    },
    #[error("null can only be compared with `==` or `!=`, not `{0}`")]
    NullOrdering(ComparisonType),
    #[error("member of type {0} cannot be used as a condition on its own")]
    NotBoolean(FieldType),
    #[error("a literal cannot be used as a condition")]
    LiteralCondition,
    #[error("a comparison needs exactly one member and one literal")]
    UnsupportedComparison,
    #[error("member of type {0} cannot be searched, only strings can")]
    NotSearchable(FieldType),
    #[error("invalid search term: {0}")]
    InvalidSearchTerm(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("null is not allowed for non-nullable {0}")]
    NullNotAllowed(FieldType),
    #[error("{value} is not a valid {target}")]
    Invalid { value: String, target: FieldType },
}

/// Resolve a dotted member path on `T`.
pub fn resolve<T: Entity>(path: &str) -> Result<Member<T>, BindError> {
    T::member(path).cloned().ok_or_else(|| BindError {
        entity: T::entity_name(),
        member_path: path.to_string(),
        reason: BindReason::UnknownMember,
    })
}

/// Bind a parsed expression against `T`.
pub fn bind<T: Entity>(expr: &Expr) -> Result<Predicate<T>, BindError> {
    match expr {
        Expr::Binary { op, left, right } => match op {
            BinOp::And => Ok(bind::<T>(left)?.and(bind::<T>(right)?)),
            BinOp::Or => Ok(bind::<T>(left)?.or(bind::<T>(right)?)),
            _ => {
                // Only the two logical operators lack a comparison
                let comparison = op.comparison().unwrap_or(ComparisonType::Equal);
                bind_comparison(comparison, left, right)
            }
        },
        Expr::Unary {
            op: UnaryOp::Not,
            operand,
        } => Ok(bind::<T>(operand)?.not()),
        Expr::Member(path) => {
            let member = resolve::<T>(&path.dotted())?;
            if !member.field_type().is_bool() {
                return Err(BindError {
                    entity: T::entity_name(),
                    member_path: member.path().to_string(),
                    reason: BindReason::NotBoolean(member.field_type()),
                });
            }
            Ok(Predicate::Test(member))
        }
        Expr::Literal(literal) => Err(BindError {
            entity: T::entity_name(),
            member_path: literal.to_string(),
            reason: BindReason::LiteralCondition,
        }),
    }
}

/// Lex, parse and bind in one step.
pub fn bind_text<T: Entity>(text: &str) -> Result<Predicate<T>, Error> {
    bind_text_with(text, &Limits::default())
}

pub fn bind_text_with<T: Entity>(text: &str, limits: &Limits) -> Result<Predicate<T>, Error> {
    let expr = parser::parse_with(text, limits)?;
    let predicate = bind::<T>(&expr)?;
    tracing::debug!(entity = T::entity_name(), filter = %predicate, "bound filter");
    Ok(predicate)
}

fn bind_comparison<T: Entity>(
    comparison: ComparisonType,
    left: &Expr,
    right: &Expr,
) -> Result<Predicate<T>, BindError> {
    let (path, literal, comparison) = match (left, right) {
        (Expr::Member(path), Expr::Literal(literal)) => (path, literal, comparison),
        (Expr::Literal(literal), Expr::Member(path)) => (path, literal, comparison.mirrored()),
        _ => {
            return Err(BindError {
                entity: T::entity_name(),
                member_path: format!("{left} {} {right}", comparison.symbol()),
                reason: BindReason::UnsupportedComparison,
            });
        }
    };

    let member = resolve::<T>(&path.dotted())?;
    let fail = |reason: BindReason| BindError {
        entity: T::entity_name(),
        member_path: member.path().to_string(),
        reason,
    };

    check_comparison(comparison, member.field_type(), matches!(literal, Literal::Null))
        .map_err(fail)?;
    let value = coerce_literal(literal, member.field_type())
        .map_err(|e| fail(BindReason::Coercion(e)))?;

    Ok(Predicate::compare(member.clone(), comparison, value))
}

/// Whether `comparison` is defined between a member of `field_type` and a
/// constant (`is_null` when the constant is null).
pub fn check_comparison(
    comparison: ComparisonType,
    field_type: FieldType,
    is_null: bool,
) -> Result<(), BindReason> {
    if !comparison.is_ordering() {
        return Ok(());
    }
    if is_null {
        return Err(BindReason::NullOrdering(comparison));
    }
    if !field_type.supports_ordering() {
        return Err(BindReason::InvalidOperator {
            op: comparison,
            field_type,
        });
    }
    Ok(())
}

/// Coerce a source literal to `target`. Number text must parse into the exact
/// numeric type of the member.
pub fn coerce_literal(literal: &Literal, target: FieldType) -> Result<Value, CoercionError> {
    let invalid = || CoercionError::Invalid {
        value: literal.to_string(),
        target,
    };

    match literal {
        Literal::Null if target.nullable => Ok(Value::Null),
        Literal::Null => Err(CoercionError::NullNotAllowed(target)),
        Literal::Boolean(b) if target.is_bool() => Ok(Value::Boolean(*b)),
        Literal::String(s) if target.is_string() => Ok(Value::String(s.clone())),
        Literal::Number(text) => parse_number(text, target.scalar_type()).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

fn parse_number(text: &str, scalar: ScalarType) -> Option<Value> {
    let value = match scalar {
        ScalarType::I8 => Value::Integer(text.parse::<i8>().ok()?.into()),
        ScalarType::I16 => Value::Integer(text.parse::<i16>().ok()?.into()),
        ScalarType::I32 => Value::Integer(text.parse::<i32>().ok()?.into()),
        ScalarType::I64 => Value::Integer(text.parse::<i64>().ok()?),
        ScalarType::U8 => Value::Unsigned(text.parse::<u8>().ok()?.into()),
        ScalarType::U16 => Value::Unsigned(text.parse::<u16>().ok()?.into()),
        ScalarType::U32 => Value::Unsigned(text.parse::<u32>().ok()?.into()),
        ScalarType::U64 => Value::Unsigned(text.parse::<u64>().ok()?),
        ScalarType::F32 => {
            let n = text.parse::<f32>().ok().filter(|n| n.is_finite())?;
            Value::Float(n.into())
        }
        ScalarType::F64 => Value::Float(text.parse::<f64>().ok().filter(|n| n.is_finite())?),
        ScalarType::Decimal => Value::Decimal(
            Decimal::from_str(text)
                .or_else(|_| Decimal::from_scientific(text))
                .ok()?,
        ),
        ScalarType::Bool | ScalarType::String => return None,
    };
    Some(value)
}

/// Coerce a value supplied from code to `target`, normalizing its
/// representation so it matches what [`coerce_literal`] would produce.
///
/// Integers convert to any integer type they fit in and to floats or
/// decimals; floats only to float types; decimals only to decimals.
pub fn coerce_value(value: Value, target: FieldType) -> Result<Value, CoercionError> {
    let invalid = |value: &Value| CoercionError::Invalid {
        value: value.to_string(),
        target,
    };
    let scalar = target.scalar_type();

    let coerced = match &value {
        Value::Null if target.nullable => Some(Value::Null),
        Value::Null => return Err(CoercionError::NullNotAllowed(target)),
        Value::Boolean(_) if target.is_bool() => Some(value.clone()),
        Value::String(_) if target.is_string() => Some(value.clone()),
        Value::Integer(n) => coerce_integer(i128::from(*n), scalar),
        Value::Unsigned(n) => coerce_integer(i128::from(*n), scalar),
        Value::Float(n) if n.is_finite() => match scalar {
            ScalarType::F64 => Some(Value::Float(*n)),
            // Keep only what an f32 member can hold
            ScalarType::F32 => Some(Value::Float(f64::from(*n as f32))).filter(|v| match v {
                Value::Float(f) => f.is_finite(),
                _ => false,
            }),
            _ => None,
        },
        Value::Decimal(_) if scalar == ScalarType::Decimal => Some(value.clone()),
        _ => None,
    };

    coerced.ok_or_else(|| invalid(&value))
}

fn coerce_integer(n: i128, scalar: ScalarType) -> Option<Value> {
    let value = match scalar {
        ScalarType::I8 => Value::Integer(i8::try_from(n).ok()?.into()),
        ScalarType::I16 => Value::Integer(i16::try_from(n).ok()?.into()),
        ScalarType::I32 => Value::Integer(i32::try_from(n).ok()?.into()),
        ScalarType::I64 => Value::Integer(i64::try_from(n).ok()?),
        ScalarType::U8 => Value::Unsigned(u8::try_from(n).ok()?.into()),
        ScalarType::U16 => Value::Unsigned(u16::try_from(n).ok()?.into()),
        ScalarType::U32 => Value::Unsigned(u32::try_from(n).ok()?.into()),
        ScalarType::U64 => Value::Unsigned(u64::try_from(n).ok()?),
        // Same text an integer literal would have
        ScalarType::F32 | ScalarType::F64 | ScalarType::Decimal => {
            return parse_number(&n.to_string(), scalar);
        }
        ScalarType::Bool | ScalarType::String => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_text_must_fit_exact_type() {
        let number = |s: &str| Literal::Number(s.to_string());
        assert_eq!(
            coerce_literal(&number("127"), FieldType::I8),
            Ok(Value::Integer(127))
        );
        assert!(coerce_literal(&number("128"), FieldType::I8).is_err());
        assert!(coerce_literal(&number("1.5"), FieldType::I32).is_err());
        assert!(coerce_literal(&number("-1"), FieldType::U32).is_err());
        assert!(coerce_literal(&number("1e999"), FieldType::F64).is_err());
    }

    #[test]
    fn code_values_normalize_like_literals() {
        assert_eq!(
            coerce_value(Value::from(30_i32), FieldType::F64),
            coerce_literal(&Literal::Number("30".into()), FieldType::F64)
        );
        assert_eq!(
            coerce_value(Value::from(7_i64), FieldType::U8),
            Ok(Value::Unsigned(7))
        );
        assert!(coerce_value(Value::from(1.5), FieldType::DECIMAL).is_err());
        assert_eq!(
            coerce_value(Value::Null, FieldType::I32),
            Err(CoercionError::NullNotAllowed(FieldType::I32))
        );
    }
}
