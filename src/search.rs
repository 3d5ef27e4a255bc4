//! Free-text search criteria.
//!
//! A term without `%` is a case-insensitive substring match. A term containing
//! `%` is a LIKE pattern over the whole value: `%` matches any run of
//! characters and `_` exactly one.

use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::{
    binder::{self, BindError, BindReason},
    descriptor::{Entity, Member},
    error::EvaluationError,
};

/// Case-insensitive match of one string member against a term.
pub struct SearchCriterion<T> {
    member: Member<T>,
    term: String,
    regex: Regex,
}

impl<T> SearchCriterion<T> {
    pub fn member_path(&self) -> &str {
        self.member.path()
    }

    pub fn term(&self) -> &str {
        &self.term
    }
}

impl<T: Entity> SearchCriterion<T> {
    pub fn new(member_path: &str, term: impl Into<String>) -> Result<Self, BindError> {
        let member = binder::resolve::<T>(member_path)?;
        let term = term.into();
        let fail = |reason| BindError {
            entity: T::entity_name(),
            member_path: member_path.to_string(),
            reason,
        };

        if !member.field_type().is_string() {
            return Err(fail(BindReason::NotSearchable(member.field_type())));
        }
        if term.is_empty() {
            return Err(fail(BindReason::InvalidSearchTerm(
                "term is empty".to_string(),
            )));
        }

        let regex = RegexBuilder::new(&term_pattern(&term))
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| fail(BindReason::InvalidSearchTerm(e.to_string())))?;

        Ok(SearchCriterion {
            member,
            term,
            regex,
        })
    }

    /// An absent (null) value never matches.
    pub fn matches(&self, entity: &T) -> Result<bool, EvaluationError> {
        let value = self.member.get(entity).map_err(|source| EvaluationError {
            entity: T::entity_name(),
            expression: format!("search {self}"),
            source,
        })?;
        Ok(value.as_str().is_some_and(|s| self.regex.is_match(s)))
    }
}

fn term_pattern(term: &str) -> String {
    if !term.contains('%') {
        return regex::escape(term);
    }

    let mut pattern = String::from("^");
    let mut literal = String::new();
    for ch in term.chars() {
        match ch {
            '%' | '_' => {
                pattern.push_str(&regex::escape(&literal));
                literal.clear();
                pattern.push_str(if ch == '%' { ".*" } else { "." });
            }
            c => literal.push(c),
        }
    }
    pattern.push_str(&regex::escape(&literal));
    pattern.push('$');
    pattern
}

impl<T> Clone for SearchCriterion<T> {
    fn clone(&self) -> Self {
        SearchCriterion {
            member: self.member.clone(),
            term: self.term.clone(),
            regex: self.regex.clone(),
        }
    }
}

impl<T> PartialEq for SearchCriterion<T> {
    fn eq(&self, other: &Self) -> bool {
        self.member.path() == other.member.path() && self.term == other.term
    }
}

impl<T> fmt::Display for SearchCriterion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {:?}", self.member.path(), self.term)
    }
}

impl<T> fmt::Debug for SearchCriterion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchCriterion")
            .field("member", &self.member.path())
            .field("term", &self.term)
            .finish()
    }
}

/// Search criteria combined with OR.
pub struct SearchBuilder<T> {
    criteria: Vec<SearchCriterion<T>>,
}

impl<T> Default for SearchBuilder<T> {
    fn default() -> Self {
        SearchBuilder {
            criteria: Vec::new(),
        }
    }
}

impl<T> SearchBuilder<T> {
    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SearchCriterion<T>> {
        self.criteria.iter()
    }

    pub fn clear(&mut self) {
        self.criteria.clear();
    }
}

impl<T: Entity> SearchBuilder<T> {
    pub fn new() -> Self {
        SearchBuilder::default()
    }

    pub fn add(&mut self, member_path: &str, term: impl Into<String>) -> Result<&mut Self, BindError> {
        self.criteria.push(SearchCriterion::new(member_path, term)?);
        Ok(self)
    }

    pub fn push(&mut self, criterion: SearchCriterion<T>) {
        self.criteria.push(criterion);
    }

    /// True when any criterion matches, or when there are none.
    pub fn matches(&self, entity: &T) -> Result<bool, EvaluationError> {
        if self.criteria.is_empty() {
            return Ok(true);
        }
        for criterion in &self.criteria {
            if criterion.matches(entity)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl<T> Clone for SearchBuilder<T> {
    fn clone(&self) -> Self {
        SearchBuilder {
            criteria: self.criteria.clone(),
        }
    }
}

impl<T> fmt::Debug for SearchBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.criteria).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::term_pattern;

    #[test]
    fn plain_terms_are_escaped() {
        assert_eq!(term_pattern("a.b"), r"a\.b");
    }

    #[test]
    fn like_wildcards() {
        assert_eq!(term_pattern("Jo%n_"), r"^Jo.*n.$");
    }
}
