//! Parsed JSON:API query parameters.
//!
//! Recognised families:
//!
//! | Parameter | Meaning |
//! |---|---|
//! | `filter[type][field]=v`, `filter[field]=v` | equality filter, typed or on the primary type |
//! | `sort=a,-b` | ordered sort fields, `-` for descending |
//! | `include=a,a.b` | relationship paths to side-load |
//! | `fields[type]=a,b` | sparse fieldset per type |
//! | `page[offset]=n`, `page[limit]=n` | offset pagination |
//!
//! Unknown families are ignored. A malformed parameter of a known family fails
//! with [`KeystoneError::QueryParameters`].

use std::collections::BTreeMap;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{KeystoneError, KeystoneResult};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Ascending,
    /// Descending order.
    Descending,
}

/// One entry of the `sort` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortField {
    /// Field name.
    pub field: String,
    /// Direction.
    pub direction: SortDirection,
}

/// Offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    /// Number of resources to skip.
    pub offset: Option<usize>,
    /// Maximum number of resources to return.
    pub limit: Option<usize>,
}

impl Pagination {
    /// Returns `true` if neither offset nor limit is set.
    pub fn is_empty(&self) -> bool {
        self.offset.is_none() && self.limit.is_none()
    }
}

/// Parsed query parameters.
///
/// # Example
///
/// ```
/// use keystone_core::{QueryParams, SortDirection};
///
/// let params = QueryParams::from_query_string(
///     "filter[tasks][name]=write&sort=-name&include=project&fields[tasks]=name",
/// )
/// .unwrap();
///
/// assert_eq!(params.filters_for("tasks").get("name").map(String::as_str), Some("write"));
/// assert_eq!(params.sort()[0].direction, SortDirection::Descending);
/// assert!(params.includes().contains("project"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryParams {
    filters: BTreeMap<String, BTreeMap<String, String>>,
    sort: Vec<SortField>,
    includes: IndexSet<String>,
    fields: BTreeMap<String, IndexSet<String>>,
    page: Pagination,
}

/// Key under which filters without a type segment are stored.
const UNTYPED: &str = "";

const KNOWN_FAMILIES: [&str; 5] = ["filter", "sort", "include", "fields", "page"];

impl QueryParams {
    /// Creates empty query parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw (percent-encoded) query string, without the leading `?`.
    ///
    /// # Errors
    ///
    /// Returns [`KeystoneError::QueryParameters`] for malformed parameters.
    pub fn from_query_string(query: &str) -> KeystoneResult<Self> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| KeystoneError::query_parameters(query, e.to_string()))?;
        Self::from_pairs(pairs)
    }

    /// Builds query parameters from decoded key/value pairs.
    ///
    /// # Errors
    ///
    /// Returns [`KeystoneError::QueryParameters`] for malformed parameters.
    pub fn from_pairs<I, K, V>(pairs: I) -> KeystoneResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            params.apply(key.as_ref(), value.as_ref())?;
        }
        Ok(params)
    }

    fn apply(&mut self, key: &str, value: &str) -> KeystoneResult<()> {
        let family = key.split('[').next().unwrap_or(key);
        if !KNOWN_FAMILIES.contains(&family) {
            return Ok(());
        }

        let (family, segments) = split_key(key)?;
        match family {
            "filter" => match segments.as_slice() {
                [field] => self.insert_filter(UNTYPED, field, value),
                [resource_type, field] => self.insert_filter(resource_type, field, value),
                _ => {
                    return Err(KeystoneError::query_parameters(
                        key,
                        "expected filter[field] or filter[type][field]",
                    ))
                }
            },
            "sort" => {
                expect_no_segments(key, &segments)?;
                for item in split_list(key, value)? {
                    let sort = match item.strip_prefix('-') {
                        Some(field) => SortField {
                            field: field.to_string(),
                            direction: SortDirection::Descending,
                        },
                        None => SortField {
                            field: item.to_string(),
                            direction: SortDirection::Ascending,
                        },
                    };
                    if sort.field.is_empty() {
                        return Err(KeystoneError::query_parameters(key, "empty sort field"));
                    }
                    self.sort.push(sort);
                }
            }
            "include" => {
                expect_no_segments(key, &segments)?;
                for path in split_list(key, value)? {
                    if path.split('.').any(str::is_empty) {
                        return Err(KeystoneError::query_parameters(
                            key,
                            format!("malformed include path '{path}'"),
                        ));
                    }
                    self.includes.insert(path.to_string());
                }
            }
            "fields" => match segments.as_slice() {
                [resource_type] => {
                    let names = split_list(key, value)?;
                    self.fields
                        .entry((*resource_type).to_string())
                        .or_default()
                        .extend(names.into_iter().map(str::to_string));
                }
                _ => return Err(KeystoneError::query_parameters(key, "expected fields[type]")),
            },
            "page" => {
                let parse = || {
                    value.parse::<usize>().map_err(|_| {
                        KeystoneError::query_parameters(key, "expected a non-negative integer")
                    })
                };
                match segments.as_slice() {
                    ["offset"] => self.page.offset = Some(parse()?),
                    ["limit"] => self.page.limit = Some(parse()?),
                    _ => {
                        return Err(KeystoneError::query_parameters(
                            key,
                            "expected page[offset] or page[limit]",
                        ))
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn insert_filter(&mut self, resource_type: &str, field: &str, value: &str) {
        self.filters
            .entry(resource_type.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
    }

    /// Adds an equality filter on a resource type.
    #[must_use]
    pub fn with_filter(mut self, resource_type: &str, field: &str, value: impl Into<String>) -> Self {
        self.insert_filter(resource_type, field, &value.into());
        self
    }

    /// Adds a sort field.
    #[must_use]
    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortField {
            field: field.into(),
            direction,
        });
        self
    }

    /// Adds an include path.
    #[must_use]
    pub fn with_include(mut self, path: impl Into<String>) -> Self {
        self.includes.insert(path.into());
        self
    }

    /// Restricts the attributes rendered for a type.
    #[must_use]
    pub fn with_fields<I, S>(mut self, resource_type: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields
            .entry(resource_type.into())
            .or_default()
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Sets pagination.
    #[must_use]
    pub fn with_page(mut self, offset: Option<usize>, limit: Option<usize>) -> Self {
        self.page = Pagination { offset, limit };
        self
    }

    /// Filters declared with an explicit type segment for `resource_type`.
    pub fn filters_for(&self, resource_type: &str) -> BTreeMap<String, String> {
        self.filters.get(resource_type).cloned().unwrap_or_default()
    }

    /// Filters declared without a type segment; they apply to the primary type.
    pub fn untyped_filters(&self) -> BTreeMap<String, String> {
        self.filters.get(UNTYPED).cloned().unwrap_or_default()
    }

    /// Sort fields, in request order.
    pub fn sort(&self) -> &[SortField] {
        &self.sort
    }

    /// Include paths, in request order.
    pub fn includes(&self) -> &IndexSet<String> {
        &self.includes
    }

    /// Sparse fieldset for a type, if one was requested.
    pub fn fields_for(&self, resource_type: &str) -> Option<&IndexSet<String>> {
        self.fields.get(resource_type)
    }

    /// Pagination.
    pub fn page(&self) -> Pagination {
        self.page
    }

    /// Returns `true` if no parameter was set.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
            && self.sort.is_empty()
            && self.includes.is_empty()
            && self.fields.is_empty()
            && self.page.is_empty()
    }
}

/// Splits `family[a][b]` into `("family", ["a", "b"])`.
fn split_key(key: &str) -> KeystoneResult<(&str, Vec<&str>)> {
    let Some(open) = key.find('[') else {
        return Ok((key, Vec::new()));
    };

    let family = &key[..open];
    let mut segments = Vec::new();
    let mut rest = &key[open..];
    while !rest.is_empty() {
        let inner = rest
            .strip_prefix('[')
            .and_then(|r| r.find(']').map(|end| (&r[..end], &r[end + 1..])));
        match inner {
            Some((segment, tail)) if !segment.is_empty() && !segment.contains('[') => {
                segments.push(segment);
                rest = tail;
            }
            _ => return Err(KeystoneError::query_parameters(key, "malformed bracket syntax")),
        }
    }
    Ok((family, segments))
}

fn expect_no_segments(key: &str, segments: &[&str]) -> KeystoneResult<()> {
    if segments.is_empty() {
        Ok(())
    } else {
        Err(KeystoneError::query_parameters(key, "unexpected bracket segment"))
    }
}

fn split_list<'a>(key: &str, value: &'a str) -> KeystoneResult<Vec<&'a str>> {
    let items: Vec<&str> = value.split(',').map(str::trim).collect();
    if items.iter().any(|item| item.is_empty()) {
        return Err(KeystoneError::query_parameters(key, "empty list entry"));
    }
    Ok(items)
}
