use std::cmp::Ordering;
use std::fmt;

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};

/// A scalar value read from an entity member or coerced from a literal.
///
/// Signed and unsigned integers are kept apart so `u64` members keep their
/// full range; `Decimal` carries exact base-10 values for money-like members.
///
/// # Examples
///
/// ```
/// use sieve::Value;
///
/// assert_eq!(Value::from(42_i32), Value::Integer(42));
/// assert_eq!(Value::from(7_u8), Value::Unsigned(7));
/// assert_eq!(Value::from(None::<String>), Value::Null);
/// assert_eq!(Value::from("John"), Value::String("John".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Decimal(Decimal),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Unsigned(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Integer(_) | Value::Unsigned(_) | Value::Float(_) | Value::Decimal(_)
        )
    }

    /// Partial comparison between two non-null values of compatible kinds.
    ///
    /// Numbers of different representations compare by mathematical value;
    /// strings compare ordinally. Returns `None` for incompatible kinds, for
    /// nulls and for NaN.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            (String(a), String(b)) => Some(a.cmp(b)),
            (Integer(a), Integer(b)) => Some(a.cmp(b)),
            (Unsigned(a), Unsigned(b)) => Some(a.cmp(b)),
            (Integer(a), Unsigned(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
            (Unsigned(a), Integer(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Decimal(a), Decimal(b)) => Some(a.cmp(b)),
            (a, b) if a.is_numeric() && b.is_numeric() => compare_mixed_numbers(a, b),
            _ => None,
        }
    }

    /// Total order used for sorting: nulls first, then by [`Value::compare`],
    /// falling back to a fixed rank between unrelated kinds.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (a, b) => a.compare(b).unwrap_or_else(|| a.rank().cmp(&b.rank())),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) | Value::Unsigned(_) | Value::Decimal(_) => 2,
            // NaN lands here when compared against itself
            Value::Float(_) => 3,
            Value::String(_) => 4,
        }
    }
}

/// Mixed numeric comparison goes through `Decimal` when both sides fit,
/// falling back to `f64`.
fn compare_mixed_numbers(a: &Value, b: &Value) -> Option<Ordering> {
    if let Some(ad) = to_decimal(a)
        && let Some(bd) = to_decimal(b)
    {
        return Some(ad.cmp(&bd));
    }
    let af = to_f64(a)?;
    let bf = to_f64(b)?;
    af.partial_cmp(&bf)
}

fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Integer(n) => Some(Decimal::from(*n)),
        Value::Unsigned(n) => Some(Decimal::from(*n)),
        Value::Float(n) => Decimal::from_f64(*n),
        Value::Decimal(d) => Some(*d),
        _ => None,
    }
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(n) => n.to_f64(),
        Value::Unsigned(n) => n.to_f64(),
        Value::Float(n) => Some(*n),
        Value::Decimal(d) => d.to_f64(),
        _ => None,
    }
}

/// Double-quote a string, escaping backslash, double quote and control
/// characters the lexer understands.
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Shortest text that reads back as the same float. Magnitudes outside
/// `1e-5..1e16` use exponent form so `1e-300` stays six characters.
pub(crate) fn format_float<F: fmt::Display + fmt::LowerExp>(n: F, magnitude: f64) -> String {
    if magnitude != 0.0 && !(1e-5..1e16).contains(&magnitude) {
        format!("{n:e}")
    } else {
        format!("{n}")
    }
}

/// Renders the value as a literal of the filter language.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Unsigned(n) => write!(f, "{n}"),
            Value::Float(n) => f.write_str(&format_float(*n, n.abs())),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::String(s) => f.write_str(&quote_string(s)),
        }
    }
}

macro_rules! value_from {
    ($variant:ident: $($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

value_from!(Integer: i8, i16, i32, i64);
value_from!(Unsigned: u8, u16, u32, u64);
value_from!(Float: f32, f64);
value_from!(Boolean: bool);
value_from!(Decimal: Decimal);
value_from!(String: String, &str);

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(value: Option<V>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
