use axum::http::header::HeaderMap;
use serde::Serialize;
use utoipa::ToSchema;

use super::error::QueryError;
use super::spec::FilterValues;

/// Page size bounds applied to every listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_per_page: u64,
    pub max_per_page: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_per_page: 20,
            max_per_page: 100,
        }
    }
}

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    /// Read `page` and `per_page` from validated values. A missing `per_page`
    /// takes the configured default and a larger one is clamped to the maximum.
    ///
    /// # Errors
    ///
    /// [`QueryError::Validation`] when either value is zero, or when the page
    /// starts past the largest offset the store accepts.
    pub fn from_values(values: &FilterValues, limits: PageLimits) -> Result<Self, QueryError> {
        let page = values
            .get("page")
            .and_then(super::spec::FieldValue::as_integer)
            .unwrap_or(1);
        if page == 0 {
            return Err(QueryError::validation("page", "must be at least 1"));
        }
        let per_page = values
            .get("per_page")
            .and_then(super::spec::FieldValue::as_integer)
            .unwrap_or(limits.default_per_page);
        if per_page == 0 {
            return Err(QueryError::validation("per_page", "must be at least 1"));
        }
        let per_page = per_page.min(limits.max_per_page.max(1));
        let in_range = (page - 1)
            .checked_mul(per_page)
            .is_some_and(|offset| i64::try_from(offset).is_ok());
        if !in_range {
            return Err(QueryError::validation("page", "is beyond the last addressable row"));
        }
        Ok(Self { page, per_page })
    }

    #[must_use]
    pub const fn offset(self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    #[must_use]
    pub const fn limit(self) -> u64 {
        self.per_page
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let seen = request.offset().saturating_add(items.len() as u64);
        Self {
            has_next: seen < total,
            has_previous: request.page > 1,
            items,
            total,
            page: request.page,
            per_page: request.per_page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

/// Sanitize resource name by removing control characters for HTTP headers
fn sanitize_resource_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect()
}

/// `Content-Range: <resource> <first>-<last>/<total>` for a page.
///
/// An empty page is reported as `<resource> */<total>`.
#[must_use]
pub fn content_range<T>(page: &Page<T>, resource_name: &str) -> HeaderMap {
    let safe_name = sanitize_resource_name(resource_name);
    let offset = (page.page - 1).saturating_mul(page.per_page);
    let content_range = if page.items.is_empty() {
        format!("{safe_name} */{}", page.total)
    } else {
        let last = offset + page.items.len() as u64 - 1;
        format!("{safe_name} {offset}-{last}/{}", page.total)
    };

    let mut headers = HeaderMap::new();
    if let Ok(value) = content_range.parse() {
        headers.insert("Content-Range", value);
    }
    headers
}
