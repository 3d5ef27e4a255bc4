//! JSON wire forms.
//!
//! | value | wire |
//! |---|---|
//! | [`EntityFilterCriteria`] | `{"Filter": "<canonical text>"}` |
//! | [`OrderDescriptor`] | `{"OrderItem": "<path>", "OrderType": 0 \| 1}` |
//! | [`SearchCriterion`] | `{"SearchItem": "<path>", "SearchTerm": "<term>"}` |
//! | [`QuerySpecification`] | `{"filters", "orders", "search", "skip", "take", "asNoTracking", "asSplitQuery", "ignoreQueryFilters"}` |
//!
//! Filters are written in canonical form. Incoming filter text is normalized
//! first (see [`normalize_filter_text`]) so filters written by other producers,
//! e.g. `x => x.Name == 'John'`, read back too. Post-processing steps are code
//! and never cross the wire.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};

use crate::{
    descriptor::Entity,
    entity_filter::EntityFilterCriteria,
    error::Error,
    order::{OrderDescriptor, SortDirection},
    search::SearchCriterion,
    specification::{QueryFlags, QuerySpecification},
};

static LAMBDA_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\(?\s*([A-Za-z_][A-Za-z0-9_]*)\s*\)?\s*=>\s*").expect("valid lambda prefix regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterWire {
    #[serde(rename = "Filter")]
    pub filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWire {
    #[serde(rename = "OrderItem")]
    pub order_item: String,
    #[serde(rename = "OrderType")]
    pub order_type: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchWire {
    #[serde(rename = "SearchItem")]
    pub search_item: String,
    #[serde(rename = "SearchTerm")]
    pub search_term: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecificationWire {
    pub filters: Vec<FilterWire>,
    pub orders: Vec<OrderWire>,
    pub search: Vec<SearchWire>,
    pub skip: i64,
    pub take: Option<i64>,
    #[serde(flatten)]
    pub flags: QueryFlags,
}

/// Rewrite filter text from other producers into the grammar this crate
/// parses:
///
/// - a lambda head `x => ` is dropped along with every `x.` accessor prefix;
/// - single-quoted strings become double-quoted;
/// - one pair of parentheses around the whole expression is removed.
///
/// ```
/// use sieve::serialize::normalize_filter_text;
///
/// assert_eq!(
///     normalize_filter_text("x => (x.Name == 'O\"Neil' && x.Age > 3)"),
///     r#"Name == "O\"Neil" && Age > 3"#
/// );
/// ```
pub fn normalize_filter_text(text: &str) -> String {
    let text = text.trim();
    let (param, body) = match LAMBDA_PREFIX.captures(text) {
        Some(captures) => {
            let end = captures.get(0).map_or(0, |m| m.end());
            (captures.get(1).map(|m| m.as_str()), &text[end..])
        }
        None => (None, text),
    };

    let rewritten = rewrite_outside_strings(body, param);
    strip_enclosing_parens(rewritten.trim()).to_string()
}

/// Drops `param.` prefixes and re-quotes `'...'` strings as `"..."`.
fn rewrite_outside_strings(body: &str, param: Option<&str>) -> String {
    let chars: Vec<char> = body.chars().collect();
    let prefix: Option<Vec<char>> = param.map(|p| p.chars().chain(std::iter::once('.')).collect());
    let mut out = String::with_capacity(body.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '"' => {
                // Double-quoted strings are copied through untouched
                out.push('"');
                i += 1;
                while i < chars.len() {
                    out.push(chars[i]);
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        out.push(chars[i + 1]);
                        i += 2;
                        continue;
                    }
                    i += 1;
                    if chars[i - 1] == '"' {
                        break;
                    }
                }
            }
            '\'' => {
                out.push('"');
                i += 1;
                while i < chars.len() {
                    match chars[i] {
                        '\\' if i + 1 < chars.len() => {
                            match chars[i + 1] {
                                '\'' => out.push('\''),
                                other => {
                                    out.push('\\');
                                    out.push(other);
                                }
                            }
                            i += 2;
                        }
                        '\'' => {
                            out.push('"');
                            i += 1;
                            break;
                        }
                        '"' => {
                            out.push_str("\\\"");
                            i += 1;
                        }
                        c => {
                            out.push(c);
                            i += 1;
                        }
                    }
                }
            }
            c => {
                let at_word_start = i == 0 || !is_path_char(chars[i - 1]);
                if let Some(prefix) = &prefix
                    && at_word_start
                    && chars[i..].starts_with(prefix)
                {
                    i += prefix.len();
                    continue;
                }
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Removes one pair of parentheses when the first one closes at the very end.
fn strip_enclosing_parens(text: &str) -> &str {
    if !(text.starts_with('(') && text.ends_with(')')) {
        return text;
    }

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let last = text.len() - 1;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i != last {
                    return text;
                }
            }
            _ => {}
        }
    }

    text[1..last].trim()
}

impl<T> Serialize for EntityFilterCriteria<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        FilterWire::from(self).serialize(serializer)
    }
}

impl<'de, T: Entity> Deserialize<'de> for EntityFilterCriteria<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = FilterWire::deserialize(deserializer)?;
        EntityFilterCriteria::try_from(wire).map_err(serde::de::Error::custom)
    }
}

impl<T> From<&EntityFilterCriteria<T>> for FilterWire {
    fn from(criteria: &EntityFilterCriteria<T>) -> Self {
        FilterWire {
            filter: criteria.to_string(),
        }
    }
}

impl<T: Entity> TryFrom<FilterWire> for EntityFilterCriteria<T> {
    type Error = Error;

    fn try_from(wire: FilterWire) -> Result<Self, Self::Error> {
        EntityFilterCriteria::parse(&normalize_filter_text(&wire.filter))
    }
}

impl<T> Serialize for OrderDescriptor<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OrderWire::from(self).serialize(serializer)
    }
}

impl<'de, T: Entity> Deserialize<'de> for OrderDescriptor<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = OrderWire::deserialize(deserializer)?;
        OrderDescriptor::try_from(wire).map_err(serde::de::Error::custom)
    }
}

impl<T> From<&OrderDescriptor<T>> for OrderWire {
    fn from(order: &OrderDescriptor<T>) -> Self {
        OrderWire {
            order_item: order.member_path().to_string(),
            order_type: order.direction(),
        }
    }
}

impl<T: Entity> TryFrom<OrderWire> for OrderDescriptor<T> {
    type Error = Error;

    fn try_from(wire: OrderWire) -> Result<Self, Self::Error> {
        Ok(OrderDescriptor::new(&wire.order_item, wire.order_type)?)
    }
}

impl<T> Serialize for SearchCriterion<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SearchWire::from(self).serialize(serializer)
    }
}

impl<'de, T: Entity> Deserialize<'de> for SearchCriterion<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = SearchWire::deserialize(deserializer)?;
        SearchCriterion::try_from(wire).map_err(serde::de::Error::custom)
    }
}

impl<T> From<&SearchCriterion<T>> for SearchWire {
    fn from(criterion: &SearchCriterion<T>) -> Self {
        SearchWire {
            search_item: criterion.member_path().to_string(),
            search_term: criterion.term().to_string(),
        }
    }
}

impl<T: Entity> TryFrom<SearchWire> for SearchCriterion<T> {
    type Error = Error;

    fn try_from(wire: SearchWire) -> Result<Self, Self::Error> {
        Ok(SearchCriterion::new(&wire.search_item, wire.search_term)?)
    }
}

impl<T: Entity> From<&QuerySpecification<T>> for SpecificationWire {
    fn from(spec: &QuerySpecification<T>) -> Self {
        SpecificationWire {
            filters: spec.filters().iter().map(FilterWire::from).collect(),
            orders: spec.sort().iter().map(OrderWire::from).collect(),
            search: spec.search().iter().map(SearchWire::from).collect(),
            skip: i64::try_from(spec.skip()).unwrap_or(i64::MAX),
            take: spec.take().map(|take| i64::try_from(take).unwrap_or(i64::MAX)),
            flags: spec.flags(),
        }
    }
}

/// Rebuilds a specification, validating every filter, member and range.
impl<T: Entity> TryFrom<SpecificationWire> for QuerySpecification<T> {
    type Error = Error;

    fn try_from(wire: SpecificationWire) -> Result<Self, Self::Error> {
        let mut spec = QuerySpecification::new();
        for filter in wire.filters {
            spec.add_filter(EntityFilterCriteria::try_from(filter)?);
        }
        for order in wire.orders {
            spec.add_order(OrderDescriptor::try_from(order)?);
        }
        for search in wire.search {
            spec.add_search_criterion(&search.search_item, search.search_term)?;
        }
        spec.set_skip(wire.skip)?;
        if let Some(take) = wire.take {
            spec.set_take(take)?;
        }
        spec.set_flags(wire.flags);
        Ok(spec)
    }
}

impl<T: Entity> Serialize for QuerySpecification<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SpecificationWire::from(self).serialize(serializer)
    }
}

impl<'de, T: Entity> Deserialize<'de> for QuerySpecification<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = SpecificationWire::deserialize(deserializer)?;
        QuerySpecification::try_from(wire).map_err(serde::de::Error::custom)
    }
}

pub fn to_json<S: Serialize + ?Sized>(value: &S) -> Result<String, Error> {
    Ok(serde_json::to_string(value)?)
}

pub fn to_json_pretty<S: Serialize + ?Sized>(value: &S) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Generic read; every failure is reported as [`Error::Serialization`].
pub fn from_json<D: DeserializeOwned>(json: &str) -> Result<D, Error> {
    Ok(serde_json::from_str(json)?)
}

/// Read a `{"Filter": ...}` object, keeping the kind of a filter error.
pub fn filter_from_json<T: Entity>(json: &str) -> Result<EntityFilterCriteria<T>, Error> {
    let wire: FilterWire = serde_json::from_str(json)?;
    EntityFilterCriteria::try_from(wire)
}

/// Read a specification, keeping the kind of a filter, member or range error.
pub fn specification_from_json<T: Entity>(json: &str) -> Result<QuerySpecification<T>, Error> {
    let wire: SpecificationWire = serde_json::from_str(json)?;
    QuerySpecification::try_from(wire)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enclosing_parens_only() {
        assert_eq!(strip_enclosing_parens("(A && B)"), "A && B");
        assert_eq!(strip_enclosing_parens("(A) && (B)"), "(A) && (B)");
        assert_eq!(strip_enclosing_parens("(Name == \")\")"), "Name == \")\"");
    }

    #[test]
    fn accessor_prefix_only_at_word_start() {
        assert_eq!(
            normalize_filter_text("p => p.Address.City == 'p.x' && p.Tip > 1"),
            r#"Address.City == "p.x" && Tip > 1"#
        );
        assert_eq!(normalize_filter_text("Age > 30"), "Age > 30");
    }

    #[test]
    fn direction_is_an_ordinal() {
        let wire = OrderWire {
            order_item: "Name".into(),
            order_type: SortDirection::Descending,
        };
        assert_eq!(
            serde_json::to_string(&wire).unwrap(),
            r#"{"OrderItem":"Name","OrderType":1}"#
        );
    }
}
