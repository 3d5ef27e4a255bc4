use crate::{
    descriptor::Entity,
    error::EvaluationError,
    specification::{ProjectedSpecification, QuerySpecification},
};

/// Executes a specification against some source of entities.
///
/// Store-backed implementations translate the specification into their own
/// query language; [`InMemoryEvaluator`] runs it over a `Vec`.
pub trait SpecificationEvaluator<T: Entity> {
    fn evaluate(
        &self,
        specification: &QuerySpecification<T>,
        items: Vec<T>,
    ) -> Result<Vec<T>, EvaluationError>;
}

/// Applies filters and search, then sort, skip, take and post-processing, in
/// that order.
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryEvaluator;

impl InMemoryEvaluator {
    pub fn new() -> Self {
        InMemoryEvaluator
    }

    /// Like [`evaluate`](SpecificationEvaluator::evaluate), then maps each
    /// result through the selector before the projection's post-processing.
    pub fn evaluate_projected<T: Entity, R>(
        &self,
        projected: &ProjectedSpecification<T, R>,
        items: Vec<T>,
    ) -> Result<Vec<R>, EvaluationError> {
        let rows = self.evaluate(projected.specification(), items)?;
        let selected = rows.iter().map(|row| projected.select(row)).collect();
        Ok(projected.apply_post_processing(selected))
    }
}

impl<T: Entity> SpecificationEvaluator<T> for InMemoryEvaluator {
    fn evaluate(
        &self,
        specification: &QuerySpecification<T>,
        items: Vec<T>,
    ) -> Result<Vec<T>, EvaluationError> {
        let total = items.len();
        let mut matched = Vec::new();
        for item in items {
            if specification.is_satisfied_by(&item)? && specification.matches_search(&item)? {
                matched.push(item);
            }
        }

        let sorted = specification.sort().sort(matched)?;
        let window = sorted.into_iter().skip(specification.skip());
        let page: Vec<T> = match specification.take() {
            Some(take) => window.take(take).collect(),
            None => window.collect(),
        };

        tracing::debug!(
            entity = T::entity_name(),
            total,
            returned = page.len(),
            "evaluated specification"
        );
        Ok(specification.apply_post_processing(page))
    }
}
