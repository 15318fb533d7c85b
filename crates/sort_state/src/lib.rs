//! Sort-state management driven by the page URL's query string.
//!
//! The sort order of a listing lives only in the URL: `sort_date` or
//! `sort_title` (never both) with `asc`/`desc`, plus an optional `page`.
//! Applying a sort action rewrites the query so exactly one axis is set and
//! the page offset is dropped; navigation to the result is a separate step
//! (see [`Navigator`]).

mod controller;
mod query;

use serde::Serialize;
use shared::{
    domain::{SortAction, SortAxis, SortDirection, PAGE_PARAM, SORT_DATE_PARAM, SORT_TITLE_PARAM},
    protocol::ActiveSort,
};
use tracing::warn;
use url::Url;

pub use controller::{action_for_control, HistoryNavigator, Navigator, SortController, CONTROL_BINDINGS};
pub use query::QueryParams;

/// Rewrites `query` so that `axis` is sorted by `direction`.
///
/// The other axis and `page` are removed; unrelated parameters keep their
/// position. The result has no leading `?`.
pub fn apply_sort(query: &str, axis: SortAxis, direction: SortDirection) -> String {
    let mut params = QueryParams::parse(query);
    params.set(axis.param(), direction.as_str());
    params.delete(axis.other().param());
    params.delete(PAGE_PARAM);
    params.to_query_string()
}

pub fn apply_action(query: &str, action: SortAction) -> String {
    apply_sort(query, action.axis(), action.direction())
}

/// Navigation target for `action` taken on the page at `current`.
pub fn apply_sort_to_url(current: &Url, action: SortAction) -> Url {
    let query = apply_action(current.query().unwrap_or_default(), action);
    let mut target = current.clone();
    if query.is_empty() {
        target.set_query(None);
    } else {
        target.set_query(Some(&query));
    }
    target
}

/// Sort state as read from a query string.
///
/// Values other than `asc`/`desc`, and pages that are not positive integers,
/// read as absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SortState {
    pub sort_date: Option<SortDirection>,
    pub sort_title: Option<SortDirection>,
    pub page: Option<u32>,
}

impl SortState {
    pub fn from_query(query: &str) -> Self {
        Self::from_params(&QueryParams::parse(query))
    }

    pub fn from_url(url: &Url) -> Self {
        Self::from_query(url.query().unwrap_or_default())
    }

    pub fn from_params(params: &QueryParams) -> Self {
        Self {
            sort_date: params
                .get(SORT_DATE_PARAM)
                .and_then(|value| value.parse().ok()),
            sort_title: params
                .get(SORT_TITLE_PARAM)
                .and_then(|value| value.parse().ok()),
            page: params
                .get(PAGE_PARAM)
                .and_then(|value| value.trim().parse::<u32>().ok())
                .filter(|page| *page > 0),
        }
    }

    /// The order to apply. A hand-written URL carrying both axes sorts by
    /// title, with equal titles kept in the requested date order.
    pub fn active(&self) -> Option<ActiveSort> {
        match (self.sort_date, self.sort_title) {
            (Some(date), Some(title)) => {
                warn!(
                    sort_date = %date,
                    sort_title = %title,
                    "query carries both sort axes; using sort_title"
                );
                Some(ActiveSort {
                    then_date: Some(date),
                    ..ActiveSort::new(SortAxis::Title, title)
                })
            }
            (None, Some(direction)) => Some(ActiveSort::new(SortAxis::Title, direction)),
            (Some(direction), None) => Some(ActiveSort::new(SortAxis::Date, direction)),
            (None, None) => None,
        }
    }

    pub fn page_or_first(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    /// True when at most one axis is set and no page offset is carried.
    pub fn is_canonical_sorted(&self) -> bool {
        self.sort_date.is_some() != self.sort_title.is_some() && self.page.is_none()
    }
}

/// Replaces `page` in `query`, keeping every other parameter.
pub fn with_page(query: &str, page: u32) -> String {
    let mut params = QueryParams::parse(query);
    params.set(PAGE_PARAM, &page.to_string());
    params.to_query_string()
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
