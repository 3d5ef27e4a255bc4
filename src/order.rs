use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::{
    binder::{self, BindError},
    descriptor::{Entity, Member},
    error::{AccessError, EvaluationError},
    value::Value,
};

/// Sort direction; serialized as its ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SortDirection {
    #[default]
    Ascending = 0,
    Descending = 1,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl From<SortDirection> for u8 {
    fn from(direction: SortDirection) -> Self {
        direction as u8
    }
}

impl TryFrom<u8> for SortDirection {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SortDirection::Ascending),
            1 => Ok(SortDirection::Descending),
            other => Err(format!("invalid sort direction {other}, expected 0 or 1")),
        }
    }
}

/// One sort key: a member of `T` and a direction.
pub struct OrderDescriptor<T> {
    member: Member<T>,
    direction: SortDirection,
}

impl<T> OrderDescriptor<T> {
    pub fn member_path(&self) -> &str {
        self.member.path()
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

impl<T: Entity> OrderDescriptor<T> {
    pub fn new(member_path: &str, direction: SortDirection) -> Result<Self, BindError> {
        Ok(OrderDescriptor {
            member: binder::resolve::<T>(member_path)?,
            direction,
        })
    }

    pub fn ascending(member_path: &str) -> Result<Self, BindError> {
        OrderDescriptor::new(member_path, SortDirection::Ascending)
    }

    pub fn descending(member_path: &str) -> Result<Self, BindError> {
        OrderDescriptor::new(member_path, SortDirection::Descending)
    }

    fn key(&self, entity: &T) -> Result<Value, EvaluationError> {
        self.member.get(entity).map_err(|source| self.failure(source))
    }

    fn failure(&self, source: AccessError) -> EvaluationError {
        EvaluationError {
            entity: T::entity_name(),
            expression: format!("order by {self}"),
            source,
        }
    }

    /// Nulls sort first in ascending order and last in descending order.
    pub fn compare(&self, a: &T, b: &T) -> Result<Ordering, EvaluationError> {
        let ordering = self.key(a)?.sort_cmp(&self.key(b)?);
        Ok(self.direction.apply(ordering))
    }
}

impl<T> Clone for OrderDescriptor<T> {
    fn clone(&self) -> Self {
        OrderDescriptor {
            member: self.member.clone(),
            direction: self.direction,
        }
    }
}

impl<T> PartialEq for OrderDescriptor<T> {
    fn eq(&self, other: &Self) -> bool {
        self.member.path() == other.member.path() && self.direction == other.direction
    }
}

impl<T> Eq for OrderDescriptor<T> {}

impl<T> Hash for OrderDescriptor<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.member.path().hash(state);
        self.direction.hash(state);
    }
}

impl<T> fmt::Display for OrderDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.member.path(), self.direction.as_str())
    }
}

impl<T> fmt::Debug for OrderDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderDescriptor")
            .field("member", &self.member.path())
            .field("direction", &self.direction)
            .finish()
    }
}

/// Ordered chain of sort keys; earlier keys take precedence.
pub struct SortBuilder<T> {
    orders: Vec<OrderDescriptor<T>>,
}

impl<T> Default for SortBuilder<T> {
    fn default() -> Self {
        SortBuilder { orders: Vec::new() }
    }
}

impl<T> SortBuilder<T> {
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrderDescriptor<T>> {
        self.orders.iter()
    }

    pub fn clear(&mut self) {
        self.orders.clear();
    }
}

impl<T: Entity> SortBuilder<T> {
    pub fn new() -> Self {
        SortBuilder::default()
    }

    /// Starts the chain over with `member_path` ascending.
    pub fn order_by(&mut self, member_path: &str) -> Result<&mut Self, BindError> {
        self.orders.clear();
        self.then_by(member_path)
    }

    pub fn order_by_descending(&mut self, member_path: &str) -> Result<&mut Self, BindError> {
        self.orders.clear();
        self.then_by_descending(member_path)
    }

    pub fn then_by(&mut self, member_path: &str) -> Result<&mut Self, BindError> {
        self.orders.push(OrderDescriptor::ascending(member_path)?);
        Ok(self)
    }

    pub fn then_by_descending(&mut self, member_path: &str) -> Result<&mut Self, BindError> {
        self.orders.push(OrderDescriptor::descending(member_path)?);
        Ok(self)
    }

    pub fn push(&mut self, order: OrderDescriptor<T>) {
        self.orders.push(order);
    }

    /// First key that tells `a` and `b` apart decides.
    pub fn compare(&self, a: &T, b: &T) -> Result<Ordering, EvaluationError> {
        for order in &self.orders {
            let ordering = order.compare(a, b)?;
            if ordering != Ordering::Equal {
                return Ok(ordering);
            }
        }
        Ok(Ordering::Equal)
    }

    /// Stable sort. Keys are read once per item, so an accessor failure
    /// surfaces before anything is reordered.
    pub fn sort(&self, items: Vec<T>) -> Result<Vec<T>, EvaluationError> {
        if self.orders.is_empty() {
            return Ok(items);
        }

        let mut keyed = items
            .into_iter()
            .map(|item| -> Result<(Vec<Value>, T), EvaluationError> {
                let keys = self
                    .orders
                    .iter()
                    .map(|order| order.key(&item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((keys, item))
            })
            .collect::<Result<Vec<_>, _>>()?;

        keyed.sort_by(|(a, _), (b, _)| {
            self.orders
                .iter()
                .zip(a.iter().zip(b.iter()))
                .map(|(order, (a, b))| order.direction.apply(a.sort_cmp(b)))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        Ok(keyed.into_iter().map(|(_, item)| item).collect())
    }
}

impl<T> Clone for SortBuilder<T> {
    fn clone(&self) -> Self {
        SortBuilder {
            orders: self.orders.clone(),
        }
    }
}

impl<T> fmt::Display for SortBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, order) in self.orders.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{order}")?;
        }
        Ok(())
    }
}

impl<T> fmt::Debug for SortBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.orders).finish()
    }
}

#[test]
fn direction_ordinals() {
    assert_eq!(u8::from(SortDirection::Ascending), 0);
    assert_eq!(u8::from(SortDirection::Descending), 1);
    assert!(SortDirection::try_from(2).is_err());
}
