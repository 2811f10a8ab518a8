//! Convenience builder for HTTP query parameters.
//!
//! This module provides a lightweight helper for constructing URL query pairs
//! from optional values, and the pagination options every list endpoint accepts.

use std::fmt::Display;

/// Page size used when walking all pages of a list endpoint.
pub const ALL_PAGES_PER_PAGE: u32 = 50;

/// Builder for assembling query parameter pairs.
#[derive(Debug, Default, Clone)]
pub struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append a key/value pair when the value is present.
    pub fn push_opt<T>(&mut self, key: &'static str, value: Option<T>)
    where
        T: ToString,
    {
        if let Some(value) = value {
            self.pairs.push((key, value.to_string()));
        }
    }

    /// Append a required key/value pair.
    pub fn push<T>(&mut self, key: &'static str, value: T)
    where
        T: Display,
    {
        self.pairs.push((key, value.to_string()));
    }

    /// Append one pair per value, repeating the key.
    pub fn push_all<I, T>(&mut self, key: &'static str, values: I)
    where
        I: IntoIterator<Item = T>,
        T: Display,
    {
        self.pairs
            .extend(values.into_iter().map(|value| (key, value.to_string())));
    }

    /// Append pairs collected elsewhere.
    pub fn extend(&mut self, pairs: impl IntoIterator<Item = (&'static str, String)>) {
        self.pairs.extend(pairs);
    }

    /// Return the collected key/value pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(&'static str, String)> {
        self.pairs
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Pagination and label filtering accepted by every list endpoint.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListOpts {
    /// Page to fetch (1-based).
    pub page: Option<u32>,
    /// Entries per page.
    pub per_page: Option<u32>,
    /// Label selector, e.g. `env=prod,!legacy`.
    pub label_selector: Option<String>,
}

impl ListOpts {
    /// Options selecting a single page.
    #[must_use]
    pub fn page(page: u32, per_page: u32) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            label_selector: None,
        }
    }

    /// Restrict results to resources matching the label selector.
    #[must_use]
    pub fn with_label_selector(mut self, selector: impl Into<String>) -> Self {
        self.label_selector = Some(selector.into());
        self
    }

    /// Convert the options into URL query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        params.push_opt("page", self.page);
        params.push_opt("per_page", self.per_page);
        params.push_opt("label_selector", self.label_selector.as_deref());
        params.into_pairs()
    }
}

/// Name and sort filters accepted by most list endpoints.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListParams {
    /// Only return the resource with this name.
    pub name: Option<String>,
    /// Sort expressions, e.g. `id:asc` or `name:desc`.
    pub sort: Vec<String>,
}

impl ListParams {
    /// Filter by name.
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            sort: Vec::new(),
        }
    }

    /// Convert the filters into URL query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        params.push_opt("name", self.name.as_deref());
        params.push_all("sort", &self.sort);
        params.into_pairs()
    }
}
