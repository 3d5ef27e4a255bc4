//! The query specification aggregate.
//!
//! A [`QuerySpecification`] collects everything a caller wants from one
//! query: filters (all must hold), a search group (any may hold), a sort
//! chain, a paging window, shaping flags for the executing store and an
//! optional in-memory step applied to the results.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    binder::BindError,
    descriptor::Entity,
    entity_filter::EntityFilterCriteria,
    error::{Error, EvaluationError, RangeError},
    filter::FilterCriteria,
    order::{OrderDescriptor, SortBuilder},
    search::SearchBuilder,
};

pub type PostProcess<T> = Arc<dyn Fn(Vec<T>) -> Vec<T> + Send + Sync>;
pub type Selector<T, R> = Arc<dyn Fn(&T) -> R + Send + Sync>;

/// Hints for the executing store. None of them change in-memory evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryFlags {
    pub as_no_tracking: bool,
    pub as_split_query: bool,
    pub ignore_query_filters: bool,
}

pub struct QuerySpecification<T> {
    filters: Vec<EntityFilterCriteria<T>>,
    sort: SortBuilder<T>,
    search: SearchBuilder<T>,
    skip: usize,
    take: Option<usize>,
    flags: QueryFlags,
    post_processing: Option<PostProcess<T>>,
}

impl<T> Default for QuerySpecification<T> {
    fn default() -> Self {
        QuerySpecification {
            filters: Vec::new(),
            sort: SortBuilder::default(),
            search: SearchBuilder::default(),
            skip: 0,
            take: None,
            flags: QueryFlags::default(),
            post_processing: None,
        }
    }
}

impl<T: Entity> QuerySpecification<T> {
    pub fn new() -> Self {
        QuerySpecification::default()
    }

    pub fn add_filter(&mut self, criteria: EntityFilterCriteria<T>) -> &mut Self {
        self.filters.push(criteria);
        self
    }

    /// Parse, bind and add a filter string.
    pub fn add_filter_text(&mut self, text: &str) -> Result<&mut Self, Error> {
        let criteria = EntityFilterCriteria::parse(text)?;
        Ok(self.add_filter(criteria))
    }

    pub fn add_filter_criteria(&mut self, criteria: &FilterCriteria) -> Result<&mut Self, Error> {
        let criteria = EntityFilterCriteria::from_criteria(criteria)?;
        Ok(self.add_filter(criteria))
    }

    pub fn add_order(&mut self, order: OrderDescriptor<T>) -> &mut Self {
        self.sort.push(order);
        self
    }

    /// Replaces the sort chain with `member_path` ascending.
    pub fn order_by(&mut self, member_path: &str) -> Result<&mut Self, BindError> {
        self.sort.order_by(member_path)?;
        Ok(self)
    }

    pub fn order_by_descending(&mut self, member_path: &str) -> Result<&mut Self, BindError> {
        self.sort.order_by_descending(member_path)?;
        Ok(self)
    }

    pub fn then_by(&mut self, member_path: &str) -> Result<&mut Self, BindError> {
        self.sort.then_by(member_path)?;
        Ok(self)
    }

    pub fn then_by_descending(&mut self, member_path: &str) -> Result<&mut Self, BindError> {
        self.sort.then_by_descending(member_path)?;
        Ok(self)
    }

    pub fn add_search_criterion(
        &mut self,
        member_path: &str,
        term: impl Into<String>,
    ) -> Result<&mut Self, BindError> {
        self.search.add(member_path, term)?;
        Ok(self)
    }

    /// One-based page of `page_size` items.
    pub fn set_page(&mut self, page: i64, page_size: i64) -> Result<&mut Self, RangeError> {
        let page_index = at_least("page", page, 1)? - 1;
        let size = at_least("page_size", page_size, 1)?;
        let skip = page_index
            .checked_mul(size)
            .ok_or(RangeError::Overflow { page, page_size })?;

        self.skip = skip;
        self.take = Some(size);
        Ok(self)
    }

    pub fn set_skip(&mut self, skip: i64) -> Result<&mut Self, RangeError> {
        self.skip = at_least("skip", skip, 0)?;
        Ok(self)
    }

    pub fn set_take(&mut self, take: i64) -> Result<&mut Self, RangeError> {
        self.take = Some(at_least("take", take, 1)?);
        Ok(self)
    }

    pub fn clear_take(&mut self) -> &mut Self {
        self.take = None;
        self
    }

    pub fn as_no_tracking(&mut self) -> &mut Self {
        self.flags.as_no_tracking = true;
        self
    }

    pub fn as_split_query(&mut self) -> &mut Self {
        self.flags.as_split_query = true;
        self
    }

    pub fn ignore_query_filters(&mut self) -> &mut Self {
        self.flags.ignore_query_filters = true;
        self
    }

    pub fn set_as_no_tracking(&mut self, value: bool) -> &mut Self {
        self.flags.as_no_tracking = value;
        self
    }

    pub fn set_as_split_query(&mut self, value: bool) -> &mut Self {
        self.flags.as_split_query = value;
        self
    }

    pub fn set_ignore_query_filters(&mut self, value: bool) -> &mut Self {
        self.flags.ignore_query_filters = value;
        self
    }

    pub fn set_flags(&mut self, flags: QueryFlags) -> &mut Self {
        self.flags = flags;
        self
    }

    pub fn set_post_processing<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Vec<T>) -> Vec<T> + Send + Sync + 'static,
    {
        self.post_processing = Some(Arc::new(f));
        self
    }

    pub fn clear_post_processing(&mut self) -> &mut Self {
        self.post_processing = None;
        self
    }

    /// Runs the post-processing step, or returns `items` unchanged.
    pub fn apply_post_processing(&self, items: Vec<T>) -> Vec<T> {
        match &self.post_processing {
            Some(f) => f(items),
            None => items,
        }
    }

    /// Back to the state of [`QuerySpecification::new`].
    pub fn clear(&mut self) -> &mut Self {
        self.filters.clear();
        self.sort.clear();
        self.search.clear();
        self.skip = 0;
        self.take = None;
        self.flags = QueryFlags::default();
        self.post_processing = None;
        self
    }

    pub fn filters(&self) -> &[EntityFilterCriteria<T>] {
        &self.filters
    }

    pub fn sort(&self) -> &SortBuilder<T> {
        &self.sort
    }

    pub fn search(&self) -> &SearchBuilder<T> {
        &self.search
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    pub fn take(&self) -> Option<usize> {
        self.take
    }

    pub fn flags(&self) -> QueryFlags {
        self.flags
    }

    pub fn has_post_processing(&self) -> bool {
        self.post_processing.is_some()
    }

    /// Whether `entity` passes every filter. Search, order and paging are
    /// not consulted.
    pub fn is_satisfied_by(&self, entity: &T) -> Result<bool, EvaluationError> {
        for filter in &self.filters {
            if !filter.matches(entity)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether `entity` passes the search group; true when it is empty.
    pub fn matches_search(&self, entity: &T) -> Result<bool, EvaluationError> {
        self.search.matches(entity)
    }

    /// Attach a projection of each result to `R`.
    pub fn project<R, F>(self, selector: F) -> ProjectedSpecification<T, R>
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        ProjectedSpecification {
            specification: self,
            selector: Arc::new(selector),
            post_processing: None,
        }
    }
}

fn at_least(name: &'static str, value: i64, min: i64) -> Result<usize, RangeError> {
    if value < min {
        return Err(RangeError::BelowMinimum { name, value, min });
    }
    usize::try_from(value).map_err(|_| RangeError::BelowMinimum { name, value, min })
}

impl<T> Clone for QuerySpecification<T> {
    fn clone(&self) -> Self {
        QuerySpecification {
            filters: self.filters.clone(),
            sort: self.sort.clone(),
            search: self.search.clone(),
            skip: self.skip,
            take: self.take,
            flags: self.flags,
            post_processing: self.post_processing.clone(),
        }
    }
}

impl<T: Entity> fmt::Display for QuerySpecification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "QuerySpecification<{}>", T::entity_name())?;
        writeln!(f, "  asNoTracking: {}", self.flags.as_no_tracking)?;
        writeln!(f, "  asSplitQuery: {}", self.flags.as_split_query)?;
        writeln!(f, "  ignoreQueryFilters: {}", self.flags.ignore_query_filters)?;
        writeln!(f, "  skip: {}", self.skip)?;
        match self.take {
            Some(take) => writeln!(f, "  take: {take}")?,
            None => writeln!(f, "  take: none")?,
        }
        writeln!(f, "  filters ({}):", self.filters.len())?;
        for filter in &self.filters {
            writeln!(f, "    {filter}")?;
        }
        writeln!(f, "  orders ({}):", self.sort.len())?;
        for order in self.sort.iter() {
            writeln!(f, "    {order}")?;
        }
        writeln!(f, "  search ({}):", self.search.len())?;
        for criterion in self.search.iter() {
            writeln!(f, "    {criterion}")?;
        }
        write!(f, "  postProcessing: {}", self.post_processing.is_some())
    }
}

impl<T: Entity> fmt::Debug for QuerySpecification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySpecification")
            .field("filters", &self.filters)
            .field("sort", &self.sort)
            .field("search", &self.search)
            .field("skip", &self.skip)
            .field("take", &self.take)
            .field("flags", &self.flags)
            .field("post_processing", &self.post_processing.is_some())
            .finish()
    }
}

/// A specification whose results are mapped through a selector.
pub struct ProjectedSpecification<T, R> {
    specification: QuerySpecification<T>,
    selector: Selector<T, R>,
    post_processing: Option<PostProcess<R>>,
}

impl<T: Entity, R> ProjectedSpecification<T, R> {
    pub fn specification(&self) -> &QuerySpecification<T> {
        &self.specification
    }

    pub fn specification_mut(&mut self) -> &mut QuerySpecification<T> {
        &mut self.specification
    }

    pub fn select(&self, entity: &T) -> R {
        (self.selector)(entity)
    }

    pub fn set_post_processing<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Vec<R>) -> Vec<R> + Send + Sync + 'static,
    {
        self.post_processing = Some(Arc::new(f));
        self
    }

    pub fn apply_post_processing(&self, items: Vec<R>) -> Vec<R> {
        match &self.post_processing {
            Some(f) => f(items),
            None => items,
        }
    }
}

impl<T: Entity, R> fmt::Display for ProjectedSpecification<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.specification)?;
        write!(
            f,
            "  projection: {} (postProcessing: {})",
            std::any::type_name::<R>(),
            self.post_processing.is_some()
        )
    }
}
