//! Precomputed member tables.
//!
//! Each entity type registers, once, a [`Descriptor`] mapping dotted member
//! paths to a declared [`FieldType`] and a typed accessor. Binding, ordering
//! and search resolve names through this table instead of looking anything up
//! per call.
//!
//! ```
//! use once_cell::sync::Lazy;
//! use sieve::{Descriptor, Entity, FieldType};
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
//! assert!(Person::member("Age").is_some());
//! assert!(Person::member("Height").is_none());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::AccessError;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    String,
}

impl ScalarType {
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::I8 => "i8",
            ScalarType::I16 => "i16",
            ScalarType::I32 => "i32",
            ScalarType::I64 => "i64",
            ScalarType::U8 => "u8",
            ScalarType::U16 => "u16",
            ScalarType::U32 => "u32",
            ScalarType::U64 => "u64",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
            ScalarType::Decimal => "decimal",
            ScalarType::String => "string",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ScalarType::I8
                | ScalarType::I16
                | ScalarType::I32
                | ScalarType::I64
                | ScalarType::U8
                | ScalarType::U16
                | ScalarType::U32
                | ScalarType::U64
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer()
            || matches!(self, ScalarType::F32 | ScalarType::F64 | ScalarType::Decimal)
    }
}

/// What a member holds before nullability is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Scalar(ScalarType),
    /// Enumeration compared through its integer representation.
    Enum {
        name: &'static str,
        repr: ScalarType,
    },
}

/// Declared type of an entity member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldType {
    pub base: BaseType,
    pub nullable: bool,
}

impl FieldType {
    pub const BOOL: FieldType = FieldType::scalar(ScalarType::Bool);
    pub const I8: FieldType = FieldType::scalar(ScalarType::I8);
    pub const I16: FieldType = FieldType::scalar(ScalarType::I16);
    pub const I32: FieldType = FieldType::scalar(ScalarType::I32);
    pub const I64: FieldType = FieldType::scalar(ScalarType::I64);
    pub const U8: FieldType = FieldType::scalar(ScalarType::U8);
    pub const U16: FieldType = FieldType::scalar(ScalarType::U16);
    pub const U32: FieldType = FieldType::scalar(ScalarType::U32);
    pub const U64: FieldType = FieldType::scalar(ScalarType::U64);
    pub const F32: FieldType = FieldType::scalar(ScalarType::F32);
    pub const F64: FieldType = FieldType::scalar(ScalarType::F64);
    pub const DECIMAL: FieldType = FieldType::scalar(ScalarType::Decimal);
    pub const STRING: FieldType = FieldType::scalar(ScalarType::String);

    pub const fn scalar(scalar: ScalarType) -> Self {
        FieldType {
            base: BaseType::Scalar(scalar),
            nullable: false,
        }
    }

    /// An enum member read as its `repr` integer. `repr` must be an integer
    /// scalar type.
    pub const fn enumeration(name: &'static str, repr: ScalarType) -> Self {
        FieldType {
            base: BaseType::Enum { name, repr },
            nullable: false,
        }
    }

    /// The `Option<_>` form of this type.
    pub const fn nullable(self) -> Self {
        FieldType {
            base: self.base,
            nullable: true,
        }
    }

    /// The scalar type values are coerced to; an enum's representation.
    pub fn scalar_type(&self) -> ScalarType {
        match self.base {
            BaseType::Scalar(scalar) => scalar,
            BaseType::Enum { repr, .. } => repr,
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.base, BaseType::Enum { .. })
    }

    pub fn is_bool(&self) -> bool {
        self.base == BaseType::Scalar(ScalarType::Bool)
    }

    pub fn is_string(&self) -> bool {
        self.base == BaseType::Scalar(ScalarType::String)
    }

    /// Whether `<`, `>`, `<=` and `>=` are defined for this type.
    pub fn supports_ordering(&self) -> bool {
        self.is_enum() || self.scalar_type().is_numeric()
    }

    /// Whether an accessor result is a plausible value of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        let scalar = self.scalar_type();
        match value {
            Value::Null => self.nullable,
            Value::Boolean(_) => scalar == ScalarType::Bool,
            Value::String(_) => self.is_string(),
            Value::Integer(_) | Value::Unsigned(_) => scalar.is_integer(),
            Value::Float(_) => matches!(scalar, ScalarType::F32 | ScalarType::F64),
            Value::Decimal(_) => scalar == ScalarType::Decimal,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.base {
            BaseType::Scalar(scalar) => scalar.name().to_string(),
            BaseType::Enum { name, repr } => format!("enum {name}({})", repr.name()),
        };
        if self.nullable {
            write!(f, "Option<{base}>")
        } else {
            f.write_str(&base)
        }
    }
}

pub type Accessor<T> = Arc<dyn Fn(&T) -> Result<Value, AccessError> + Send + Sync>;

/// One resolvable member: its dotted path, declared type and accessor.
pub struct Member<T> {
    path: String,
    field_type: FieldType,
    accessor: Accessor<T>,
}

impl<T> Member<T> {
    pub fn new(path: impl Into<String>, field_type: FieldType, accessor: Accessor<T>) -> Self {
        Member {
            path: path.into(),
            field_type,
            accessor,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Reads the member and checks the result against the declared type.
    pub fn get(&self, entity: &T) -> Result<Value, AccessError> {
        let value = (self.accessor)(entity)?;
        if self.field_type.accepts(&value) {
            Ok(value)
        } else {
            Err(AccessError::TypeMismatch {
                member: self.path.clone(),
                expected: self.field_type,
                found: value.type_name(),
            })
        }
    }
}

impl<T> Clone for Member<T> {
    fn clone(&self) -> Self {
        Member {
            path: self.path.clone(),
            field_type: self.field_type,
            accessor: Arc::clone(&self.accessor),
        }
    }
}

impl<T> fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("path", &self.path)
            .field("field_type", &self.field_type)
            .finish_non_exhaustive()
    }
}

/// Member table of one entity type.
pub struct Descriptor<T> {
    name: &'static str,
    members: BTreeMap<String, Member<T>>,
}

impl<T: 'static> Descriptor<T> {
    pub fn builder(name: &'static str) -> DescriptorBuilder<T> {
        DescriptorBuilder {
            name,
            members: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn member(&self, path: &str) -> Option<&Member<T>> {
        self.members.get(path)
    }

    /// Members in path order.
    pub fn members(&self) -> impl Iterator<Item = &Member<T>> {
        self.members.values()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<T> fmt::Debug for Descriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("name", &self.name)
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .finish()
    }
}

pub struct DescriptorBuilder<T> {
    name: &'static str,
    members: BTreeMap<String, Member<T>>,
}

impl<T: 'static> DescriptorBuilder<T> {
    /// Registers a member with an infallible accessor.
    pub fn field<V, F>(self, name: &str, field_type: FieldType, get: F) -> Self
    where
        V: Into<Value>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.try_field(name, field_type, move |entity| Ok(get(entity).into()))
    }

    /// Registers a member whose accessor can fail.
    pub fn try_field<F>(mut self, name: &str, field_type: FieldType, get: F) -> Self
    where
        F: Fn(&T) -> Result<Value, AccessError> + Send + Sync + 'static,
    {
        self.members.insert(
            name.to_string(),
            Member::new(name, field_type, Arc::new(get)),
        );
        self
    }

    /// Flattens the members of an embedded value under `name.`.
    pub fn nested<U, F>(mut self, name: &str, project: F, inner: &Descriptor<U>) -> Self
    where
        U: 'static,
        F: Fn(&T) -> &U + Send + Sync + 'static,
    {
        let project = Arc::new(project);
        for member in inner.members() {
            let project = Arc::clone(&project);
            let accessor = Arc::clone(&member.accessor);
            let path = format!("{name}.{}", member.path);
            self.members.insert(
                path.clone(),
                Member::new(
                    path,
                    member.field_type,
                    Arc::new(move |entity: &T| accessor(project(entity))),
                ),
            );
        }
        self
    }

    /// Like [`nested`](Self::nested) for an optional embedded value. Reading
    /// through an absent parent fails with [`AccessError::NullNavigation`].
    pub fn nested_optional<U, F>(mut self, name: &str, project: F, inner: &Descriptor<U>) -> Self
    where
        U: 'static,
        F: Fn(&T) -> Option<&U> + Send + Sync + 'static,
    {
        let project = Arc::new(project);
        for member in inner.members() {
            let project = Arc::clone(&project);
            let accessor = Arc::clone(&member.accessor);
            let segment = name.to_string();
            let path = format!("{name}.{}", member.path);
            self.members.insert(
                path.clone(),
                Member::new(
                    path,
                    member.field_type,
                    Arc::new(move |entity: &T| match project(entity) {
                        Some(inner) => accessor(inner),
                        None => Err(AccessError::NullNavigation {
                            segment: segment.clone(),
                        }),
                    }),
                ),
            );
        }
        self
    }

    pub fn build(self) -> Descriptor<T> {
        Descriptor {
            name: self.name,
            members: self.members,
        }
    }
}

/// Capability trait for types filters can be bound against.
pub trait Entity: Sized + 'static {
    fn descriptor() -> &'static Descriptor<Self>;

    fn entity_name() -> &'static str {
        Self::descriptor().name()
    }

    fn member(path: &str) -> Option<&'static Member<Self>> {
        Self::descriptor().member(path)
    }
}
