//! Paginated list types
//!
//! Mirrors the Django REST Framework page shape consumed by every admin list
//! screen: `{count, next, previous, results}` plus the query that produced it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

use crate::error::{Error, Result};
use crate::{ORDERING_PARAM, PAGE_PARAM, PAGE_SIZE_PARAM, SEARCH_PARAM};

/// Query keys owned by the controller; filters may not use them
pub const RESERVED_PARAMS: [&str; 4] = [PAGE_SIZE_PARAM, PAGE_PARAM, SEARCH_PARAM, ORDERING_PARAM];

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn flipped(self) -> Self {
        match self {
            OrderDirection::Asc => OrderDirection::Desc,
            OrderDirection::Desc => OrderDirection::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "asc",
            OrderDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current sort column and direction
///
/// The backend speaks ordering tokens (`"field"` / `"-field"`); the field part
/// is opaque and passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderingState {
    pub field: String,
    pub direction: OrderDirection,
}

impl OrderingState {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Desc,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.field.is_empty()
    }

    /// Parse an ordering token; an empty token means no ordering
    pub fn from_token(token: &str) -> Self {
        let token = token.trim();
        match token.strip_prefix('-') {
            Some(field) if !field.is_empty() => Self::desc(field),
            Some(_) => Self::none(),
            None if token.is_empty() => Self::none(),
            None => Self::asc(token),
        }
    }

    pub fn to_token(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(match self.direction {
            OrderDirection::Asc => self.field.clone(),
            OrderDirection::Desc => format!("-{}", self.field),
        })
    }

    /// Same field flips the direction, a new field starts ascending
    pub fn toggled(&self, field: &str) -> Self {
        if !self.is_empty() && self.field == field {
            Self {
                field: self.field.clone(),
                direction: self.direction.flipped(),
            }
        } else {
            Self::asc(field)
        }
    }
}

/// One page of results as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<T>,
}

/// Pagination metadata exposed to renderers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub page: u32,
    pub total_pages: u32,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            page: 1,
            total_pages: 1,
        }
    }
}

impl PaginationState {
    pub fn from_page<T>(page: &Page<T>, requested_page: u32, page_size: u32) -> Self {
        Self {
            count: page.count,
            next: page.next.clone(),
            previous: page.previous.clone(),
            page: requested_page.max(1),
            total_pages: total_pages(page.count, page_size),
        }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

/// `ceil(count / page_size)`, never below 1
pub fn total_pages(count: u64, page_size: u32) -> u32 {
    if count == 0 || page_size == 0 {
        return 1;
    }
    let pages = count.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// Declarative description of one list request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub endpoint: String,
    /// Constraints set by the hosting screen; always sent, never overridden
    pub fixed_filters: BTreeMap<String, String>,
    /// User-editable filters (price range, state, brand, dates...)
    pub filters: BTreeMap<String, String>,
    pub page: u32,
    pub page_size: u32,
    pub search: String,
    pub ordering: OrderingState,
}

impl ListQuery {
    pub fn new(endpoint: impl Into<String>, page_size: u32) -> Result<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(Error::InvalidArgument("endpoint must not be empty".to_string()));
        }
        if endpoint.contains('?') || endpoint.contains('#') {
            return Err(Error::InvalidArgument(format!(
                "endpoint must not embed query parameters: {}",
                endpoint
            )));
        }
        if page_size == 0 {
            return Err(Error::InvalidArgument("page_size must be positive".to_string()));
        }

        Ok(Self {
            endpoint,
            fixed_filters: BTreeMap::new(),
            filters: BTreeMap::new(),
            page: 1,
            page_size,
            search: String::new(),
            ordering: OrderingState::none(),
        })
    }

    pub fn with_fixed_filters<K, V, I>(mut self, filters: I) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in filters {
            let key = key.into();
            validate_filter_key(&key)?;
            self.fixed_filters.insert(key, value.into());
        }
        Ok(self)
    }

    pub fn with_ordering(mut self, ordering: OrderingState) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn is_fixed(&self, key: &str) -> bool {
        self.fixed_filters.contains_key(key)
    }

    /// Query pairs in wire order; optional keys are omitted, never sent empty
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![(PAGE_SIZE_PARAM.to_string(), self.page_size.to_string())];

        if self.page > 1 {
            pairs.push((PAGE_PARAM.to_string(), self.page.to_string()));
        }
        if !self.search.is_empty() {
            pairs.push((SEARCH_PARAM.to_string(), self.search.clone()));
        }
        if let Some(token) = self.ordering.to_token() {
            pairs.push((ORDERING_PARAM.to_string(), token));
        }

        for (key, value) in &self.filters {
            if value.is_empty() || self.is_fixed(key) {
                continue;
            }
            pairs.push((key.clone(), value.clone()));
        }
        for (key, value) in &self.fixed_filters {
            pairs.push((key.clone(), value.clone()));
        }

        pairs
    }

    pub fn query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query_pairs())
            .finish()
    }

    /// Full request URL for this query against `base_url`
    pub fn request_url(&self, base_url: &str) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined)
            .map_err(|e| Error::InvalidArgument(format!("invalid URL '{}': {}", joined, e)))?;
        url.query_pairs_mut().extend_pairs(self.query_pairs());
        Ok(url)
    }

    /// Same filters/search/ordering, first page, `cap` rows
    pub fn for_export(&self, cap: u32) -> Self {
        Self {
            page: 1,
            page_size: cap.max(1),
            ..self.clone()
        }
    }

    /// Restore page/search/ordering/filters from a query string
    ///
    /// Keys matching fixed filters are ignored; unknown keys become user
    /// filters. Used to rebuild a list from a shareable URL.
    pub fn apply_query_string(&mut self, query: &str) {
        let query = query.trim_start_matches('?');
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                PAGE_PARAM => self.page = value.parse().unwrap_or(1).max(1),
                PAGE_SIZE_PARAM => {
                    if let Ok(size) = value.parse::<u32>() {
                        if size > 0 {
                            self.page_size = size;
                        }
                    }
                }
                SEARCH_PARAM => self.search = value.into_owned(),
                ORDERING_PARAM => self.ordering = OrderingState::from_token(&value),
                other if self.is_fixed(other) => {}
                other => {
                    if !value.is_empty() {
                        self.filters.insert(other.to_string(), value.into_owned());
                    }
                }
            }
        }
    }
}

/// Reject empty keys and keys the controller manages itself
pub fn validate_filter_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidArgument("filter key must not be empty".to_string()));
    }
    if RESERVED_PARAMS.contains(&key) {
        return Err(Error::InvalidArgument(format!(
            "'{}' is managed by the list controller and cannot be used as a filter",
            key
        )));
    }
    Ok(())
}
