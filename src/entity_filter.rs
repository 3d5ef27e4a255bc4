use std::fmt;
use std::hash::{Hash, Hasher};

use once_cell::sync::OnceCell;

use crate::{
    binder,
    config::Limits,
    descriptor::Entity,
    error::{AccessError, CompileError, Error, EvaluationError},
    filter::FilterCriteria,
    predicate::{CompiledPredicate, Predicate},
};

/// A validated filter over `T` with a compiled closure built on first use.
///
/// Construction compiles the predicate once to reject bad trees early; the
/// closure used for evaluation is compiled again the first time
/// [`matches`](Self::matches) runs and is shared by every later call, from
/// any thread. Two criteria are equal when their canonical texts are.
pub struct EntityFilterCriteria<T> {
    predicate: Predicate<T>,
    canonical: String,
    compiled: OnceCell<CompiledPredicate<T>>,
}

impl<T: Entity> EntityFilterCriteria<T> {
    pub fn new(predicate: Predicate<T>) -> Result<Self, CompileError> {
        let canonical = predicate.to_string();
        predicate.compile().map_err(|reason| CompileError {
            entity: T::entity_name(),
            expression: canonical.clone(),
            reason,
        })?;
        tracing::debug!(entity = T::entity_name(), filter = %canonical, "validated filter");

        Ok(EntityFilterCriteria {
            predicate,
            canonical,
            compiled: OnceCell::new(),
        })
    }

    /// Lex, parse, bind and validate a filter string.
    pub fn parse(text: &str) -> Result<Self, Error> {
        EntityFilterCriteria::parse_with(text, &Limits::default())
    }

    pub fn parse_with(text: &str, limits: &Limits) -> Result<Self, Error> {
        let predicate = binder::bind_text_with::<T>(text, limits)?;
        Ok(EntityFilterCriteria::new(predicate)?)
    }

    pub fn from_criteria(criteria: &FilterCriteria) -> Result<Self, Error> {
        Ok(EntityFilterCriteria::new(criteria.to_predicate::<T>()?)?)
    }

    /// Conjunction of two filters.
    pub fn and(&self, other: &EntityFilterCriteria<T>) -> Result<Self, CompileError> {
        EntityFilterCriteria::new(self.predicate.clone().and(other.predicate.clone()))
    }

    pub fn or(&self, other: &EntityFilterCriteria<T>) -> Result<Self, CompileError> {
        EntityFilterCriteria::new(self.predicate.clone().or(other.predicate.clone()))
    }

    pub fn predicate(&self) -> &Predicate<T> {
        &self.predicate
    }

    /// Canonical filter text.
    pub fn expression(&self) -> &str {
        &self.canonical
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    fn compiled(&self) -> Result<&CompiledPredicate<T>, AccessError> {
        self.compiled
            .get_or_try_init(|| {
                tracing::trace!(entity = T::entity_name(), filter = %self.canonical, "compiling filter");
                self.predicate.compile()
            })
            .map_err(AccessError::Uncompiled)
    }

    /// Evaluate the filter against one entity.
    pub fn matches(&self, entity: &T) -> Result<bool, EvaluationError> {
        let result = self.compiled().and_then(|compiled| compiled(entity));
        result.map_err(|source| {
            tracing::warn!(
                entity = T::entity_name(),
                filter = %self.canonical,
                error = %source,
                "filter evaluation failed"
            );
            EvaluationError {
                entity: T::entity_name(),
                expression: self.canonical.clone(),
                source,
            }
        })
    }
}

impl<T> Clone for EntityFilterCriteria<T> {
    fn clone(&self) -> Self {
        EntityFilterCriteria {
            predicate: self.predicate.clone(),
            canonical: self.canonical.clone(),
            compiled: self.compiled.clone(),
        }
    }
}

impl<T> PartialEq for EntityFilterCriteria<T> {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl<T> Eq for EntityFilterCriteria<T> {}

impl<T> Hash for EntityFilterCriteria<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl<T> fmt::Display for EntityFilterCriteria<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl<T> fmt::Debug for EntityFilterCriteria<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityFilterCriteria")
            .field("expression", &self.canonical)
            .field("compiled", &self.compiled.get().is_some())
            .finish()
    }
}
