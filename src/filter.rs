use std::fmt;

use crate::{
    ast::{ComparisonType, Expr, Literal},
    binder::{self, CoercionError},
    descriptor::{Entity, FieldType, Member},
    error::{ConstructionError, Error},
    parser,
    predicate::{self, Predicate},
    value::Value,
};

/// A single `member <comparison> constant` condition in declarative form.
///
/// Both constructors validate against the entity's member table, so a
/// `FilterCriteria` always holds a value of the member's declared type.
///
/// ```
/// # use once_cell::sync::Lazy;
/// # use sieve::{Descriptor, Entity, FieldType};
/// # struct Person { age: i32 }
/// # impl Entity for Person {
/// #     fn descriptor() -> &'static Descriptor<Self> {
/// #         static D: Lazy<Descriptor<Person>> = Lazy::new(|| {
/// #             Descriptor::builder("Person").field("Age", FieldType::I32, |p: &Person| p.age).build()
/// #         });
/// #         &D
/// #     }
/// # }
/// use sieve::{ComparisonType, FilterCriteria};
///
/// let typed = FilterCriteria::new::<Person>("Age", 30, ComparisonType::GreaterThan).unwrap();
/// let parsed = FilterCriteria::parse::<Person>("Age > 30").unwrap();
/// assert_eq!(typed, parsed);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    property_type: FieldType,
    name: String,
    value: Value,
    comparison: ComparisonType,
}

impl FilterCriteria {
    pub fn new<T: Entity>(
        member_path: &str,
        value: impl Into<Value>,
        comparison: ComparisonType,
    ) -> Result<Self, Error> {
        let member = binder::resolve::<T>(member_path)?;
        let value = value.into();
        check_shape(&member, comparison, value.is_null())?;
        let value = binder::coerce_value(value, member.field_type())
            .map_err(|source| invalid_value(&member, source))?;
        Ok(FilterCriteria::from_parts(&member, value, comparison))
    }

    /// Accepts only `member <op> literal`; anything else is a
    /// [`ConstructionError::UnsupportedShape`].
    pub fn from_comparison<T: Entity>(expr: &Expr) -> Result<Self, Error> {
        let unsupported = |shape: &'static str| ConstructionError::UnsupportedShape {
            shape,
            expression: expr.to_string(),
        };

        let Expr::Binary { op, left, right } = expr else {
            return Err(unsupported(expr.shape()).into());
        };
        let Some(comparison) = op.comparison() else {
            return Err(unsupported(expr.shape()).into());
        };
        let (path, literal) = match (left.as_ref(), right.as_ref()) {
            (Expr::Member(path), Expr::Literal(literal)) => (path, literal),
            (Expr::Literal(_), Expr::Member(_)) => {
                return Err(unsupported("reversed comparison").into());
            }
            (Expr::Member(_), Expr::Member(_)) => {
                return Err(unsupported("member to member comparison").into());
            }
            _ => return Err(unsupported(expr.shape()).into()),
        };

        let member = binder::resolve::<T>(&path.dotted())?;
        check_shape(&member, comparison, matches!(literal, Literal::Null))?;
        let value = binder::coerce_literal(literal, member.field_type())
            .map_err(|source| invalid_value(&member, source))?;
        Ok(FilterCriteria::from_parts(&member, value, comparison))
    }

    pub fn parse<T: Entity>(text: &str) -> Result<Self, Error> {
        FilterCriteria::from_comparison::<T>(&parser::parse(text)?)
    }

    fn from_parts<T>(member: &Member<T>, value: Value, comparison: ComparisonType) -> Self {
        FilterCriteria {
            property_type: member.field_type(),
            name: member.path().to_string(),
            value,
            comparison,
        }
    }

    pub fn property_type(&self) -> FieldType {
        self.property_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn comparison(&self) -> ComparisonType {
        self.comparison
    }

    /// The same predicate tree the equivalent filter text binds to.
    pub fn to_predicate<T: Entity>(&self) -> Result<Predicate<T>, Error> {
        let member = binder::resolve::<T>(&self.name)?;
        let value = binder::coerce_value(self.value.clone(), member.field_type())
            .map_err(|source| invalid_value(&member, source))?;
        Ok(Predicate::compare(member, self.comparison, value))
    }
}

fn check_shape<T>(
    member: &Member<T>,
    comparison: ComparisonType,
    is_null: bool,
) -> Result<(), ConstructionError> {
    let field_type = member.field_type();
    if is_null && !field_type.nullable {
        return Err(ConstructionError::NullNotAllowed {
            member: member.path().to_string(),
            field_type,
        });
    }
    binder::check_comparison(comparison, field_type, is_null).map_err(|_| {
        ConstructionError::InvalidComparison {
            member: member.path().to_string(),
            comparison: comparison.symbol(),
            field_type,
        }
    })
}

fn invalid_value<T>(member: &Member<T>, source: CoercionError) -> ConstructionError {
    match source {
        CoercionError::NullNotAllowed(field_type) => ConstructionError::NullNotAllowed {
            member: member.path().to_string(),
            field_type,
        },
        source => ConstructionError::InvalidValue {
            member: member.path().to_string(),
            source,
        },
    }
}

impl fmt::Display for FilterCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.name,
            self.comparison.symbol(),
            predicate::render_value(&self.value, self.property_type)
        )
    }
}
