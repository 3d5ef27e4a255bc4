use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::{
    ast::ComparisonType,
    binder,
    descriptor::{FieldType, Member, ScalarType},
    error::AccessError,
    value::{Value, format_float},
};

pub type CompiledPredicate<T> = Arc<dyn Fn(&T) -> Result<bool, AccessError> + Send + Sync>;

/// A filter bound to the members of `T`.
///
/// Its `Display` output is the canonical text: equal for filters that differ
/// only in spacing, quoting or redundant parentheses, and parseable back into
/// the same tree.
pub enum Predicate<T> {
    /// `Member op constant`, constant already coerced to the member type
    Compare {
        member: Member<T>,
        comparison: ComparisonType,
        value: Value,
    },
    /// Bare boolean member
    Test(Member<T>),
    Not(Box<Predicate<T>>),
    And(Box<Predicate<T>>, Box<Predicate<T>>),
    Or(Box<Predicate<T>>, Box<Predicate<T>>),
}

impl<T: 'static> Predicate<T> {
    pub fn compare(member: Member<T>, comparison: ComparisonType, value: Value) -> Self {
        Predicate::Compare {
            member,
            comparison,
            value,
        }
    }

    pub fn and(self, other: Predicate<T>) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate<T>) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Paths of every member the predicate reads, in tree order.
    pub fn member_paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, paths: &mut Vec<&'a str>) {
        match self {
            Predicate::Compare { member, .. } | Predicate::Test(member) => {
                paths.push(member.path())
            }
            Predicate::Not(inner) => inner.collect_paths(paths),
            Predicate::And(left, right) | Predicate::Or(left, right) => {
                left.collect_paths(paths);
                right.collect_paths(paths);
            }
        }
    }

    /// Turn the tree into a closure. Fails when a node is not well typed,
    /// which can only happen for trees assembled by hand.
    pub fn compile(&self) -> Result<CompiledPredicate<T>, String> {
        match self {
            Predicate::Compare {
                member,
                comparison,
                value,
            } => {
                let field_type = member.field_type();
                binder::check_comparison(*comparison, field_type, value.is_null())
                    .map_err(|reason| format!("`{}`: {reason}", member.path()))?;
                if !field_type.accepts(value) {
                    return Err(format!(
                        "`{}`: {} constant does not fit {field_type}",
                        member.path(),
                        value.type_name()
                    ));
                }

                let member = member.clone();
                let comparison = *comparison;
                let value = value.clone();
                Ok(Arc::new(move |entity: &T| -> Result<bool, AccessError> {
                    let actual = member.get(entity)?;
                    Ok(compare_values(&actual, comparison, &value))
                }))
            }
            Predicate::Test(member) => {
                if !member.field_type().is_bool() {
                    return Err(format!(
                        "`{}` of type {} is not a condition",
                        member.path(),
                        member.field_type()
                    ));
                }
                let member = member.clone();
                // An absent nullable bool does not satisfy the test
                Ok(Arc::new(move |entity: &T| -> Result<bool, AccessError> {
                    Ok(member.get(entity)?.as_bool().unwrap_or(false))
                }))
            }
            Predicate::Not(inner) => {
                let inner = inner.compile()?;
                Ok(Arc::new(move |entity: &T| -> Result<bool, AccessError> {
                    Ok(!inner(entity)?)
                }))
            }
            Predicate::And(left, right) => {
                let left = left.compile()?;
                let right = right.compile()?;
                Ok(Arc::new(move |entity: &T| -> Result<bool, AccessError> {
                    Ok(left(entity)? && right(entity)?)
                }))
            }
            Predicate::Or(left, right) => {
                let left = left.compile()?;
                let right = right.compile()?;
                Ok(Arc::new(move |entity: &T| -> Result<bool, AccessError> {
                    Ok(left(entity)? || right(entity)?)
                }))
            }
        }
    }
}

/// `null == null` holds; any ordering against null is false.
pub(crate) fn compare_values(actual: &Value, comparison: ComparisonType, expected: &Value) -> bool {
    if actual.is_null() || expected.is_null() {
        let both = actual.is_null() && expected.is_null();
        return match comparison {
            ComparisonType::Equal => both,
            ComparisonType::NotEqual => !both,
            _ => false,
        };
    }

    let ordering = actual.compare(expected);
    match comparison {
        ComparisonType::Equal => ordering == Some(Ordering::Equal),
        ComparisonType::NotEqual => ordering != Some(Ordering::Equal),
        ComparisonType::GreaterThan => ordering == Some(Ordering::Greater),
        ComparisonType::GreaterThanOrEqual => {
            matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
        }
        ComparisonType::LessThan => ordering == Some(Ordering::Less),
        ComparisonType::LessThanOrEqual => {
            matches!(ordering, Some(Ordering::Less | Ordering::Equal))
        }
    }
}

/// Literal text of a coerced constant. `f32` members print the shortest text
/// that reads back as the same `f32`, not the widened `f64`.
pub(crate) fn render_value(value: &Value, field_type: FieldType) -> String {
    match value {
        Value::Float(n) if field_type.scalar_type() == ScalarType::F32 => {
            let narrow = *n as f32;
            format_float(narrow, f64::from(narrow.abs()))
        }
        other => other.to_string(),
    }
}

impl<T> fmt::Display for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare {
                member,
                comparison,
                value,
            } => write!(
                f,
                "{} {} {}",
                member.path(),
                comparison.symbol(),
                render_value(value, member.field_type())
            ),
            Predicate::Test(member) => f.write_str(member.path()),
            Predicate::Not(inner) => write!(f, "!({inner})"),
            Predicate::And(left, right) => write!(f, "({left} && {right})"),
            Predicate::Or(left, right) => write!(f, "({left} || {right})"),
        }
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        match self {
            Predicate::Compare {
                member,
                comparison,
                value,
            } => Predicate::Compare {
                member: member.clone(),
                comparison: *comparison,
                value: value.clone(),
            },
            Predicate::Test(member) => Predicate::Test(member.clone()),
            Predicate::Not(inner) => Predicate::Not(inner.clone()),
            Predicate::And(left, right) => Predicate::And(left.clone(), right.clone()),
            Predicate::Or(left, right) => Predicate::Or(left.clone(), right.clone()),
        }
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.to_string()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_semantics() {
        let null = Value::Null;
        let one = Value::Integer(1);
        assert!(compare_values(&null, ComparisonType::Equal, &null));
        assert!(!compare_values(&null, ComparisonType::Equal, &one));
        assert!(compare_values(&one, ComparisonType::NotEqual, &null));
        assert!(!compare_values(&null, ComparisonType::LessThan, &one));
        assert!(!compare_values(&one, ComparisonType::GreaterThanOrEqual, &null));
    }

    #[test]
    fn f32_constants_render_narrow() {
        let widened = Value::from(0.1_f32);
        assert_eq!(render_value(&widened, FieldType::F32), "0.1");
        assert_eq!(render_value(&Value::Float(0.1), FieldType::F64), "0.1");
    }
}
