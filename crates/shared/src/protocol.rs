use serde::{Deserialize, Serialize};

use crate::domain::{NewsItem, NewsItemId, SortAction, SortAxis, SortDirection};

/// Order applied to a listing.
///
/// `then_date` is only set for a query carrying both axes: items with equal
/// titles keep their date order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSort {
    pub axis: SortAxis,
    pub direction: SortDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then_date: Option<SortDirection>,
}

impl ActiveSort {
    pub fn new(axis: SortAxis, direction: SortDirection) -> Self {
        Self {
            axis,
            direction,
            then_date: None,
        }
    }
}

impl From<SortAction> for ActiveSort {
    fn from(action: SortAction) -> Self {
        Self::new(action.axis(), action.direction())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortLinks {
    pub date_asc: String,
    pub date_desc: String,
    pub title_asc: String,
    pub title_desc: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    pub sort: SortLinks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticlePage {
    pub items: Vec<NewsItem>,
    pub page: u32,
    pub per_page: u32,
    pub total_count: u64,
    pub total_pages: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<ActiveSort>,
    pub sources: Vec<String>,
    pub links: PageLinks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedArticle {
    pub id: NewsItemId,
}
