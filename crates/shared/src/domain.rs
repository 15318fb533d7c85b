use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseSortError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(NewsItemId);

pub const SORT_DATE_PARAM: &str = "sort_date";
pub const SORT_TITLE_PARAM: &str = "sort_title";
pub const PAGE_PARAM: &str = "page";
pub const SOURCE_PARAM: &str = "source";
pub const GOOGLE_SEARCH_PARAM: &str = "google_search";
pub const SEARCH_QUERY_PARAM: &str = "query";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortAxis {
    Date,
    Title,
}

impl SortAxis {
    /// Query parameter that carries the direction for this axis.
    pub fn param(self) -> &'static str {
        match self {
            SortAxis::Date => SORT_DATE_PARAM,
            SortAxis::Title => SORT_TITLE_PARAM,
        }
    }

    pub fn other(self) -> SortAxis {
        match self {
            SortAxis::Date => SortAxis::Title,
            SortAxis::Title => SortAxis::Date,
        }
    }
}

impl FromStr for SortAxis {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(SortAxis::Date),
            "title" => Ok(SortAxis::Title),
            other => Err(ParseSortError::Axis(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(ParseSortError::Direction(other.to_string())),
        }
    }
}

/// One of the four user-triggerable sort actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortAction {
    DateAsc,
    DateDesc,
    TitleAsc,
    TitleDesc,
}

impl SortAction {
    pub const ALL: [SortAction; 4] = [
        SortAction::DateAsc,
        SortAction::DateDesc,
        SortAction::TitleAsc,
        SortAction::TitleDesc,
    ];

    pub fn new(axis: SortAxis, direction: SortDirection) -> Self {
        match (axis, direction) {
            (SortAxis::Date, SortDirection::Asc) => SortAction::DateAsc,
            (SortAxis::Date, SortDirection::Desc) => SortAction::DateDesc,
            (SortAxis::Title, SortDirection::Asc) => SortAction::TitleAsc,
            (SortAxis::Title, SortDirection::Desc) => SortAction::TitleDesc,
        }
    }

    pub fn axis(self) -> SortAxis {
        match self {
            SortAction::DateAsc | SortAction::DateDesc => SortAxis::Date,
            SortAction::TitleAsc | SortAction::TitleDesc => SortAxis::Title,
        }
    }

    pub fn direction(self) -> SortDirection {
        match self {
            SortAction::DateAsc | SortAction::TitleAsc => SortDirection::Asc,
            SortAction::DateDesc | SortAction::TitleDesc => SortDirection::Desc,
        }
    }

    /// Path segment form, e.g. `date-asc`.
    pub fn slug(self) -> &'static str {
        match self {
            SortAction::DateAsc => "date-asc",
            SortAction::DateDesc => "date-desc",
            SortAction::TitleAsc => "title-asc",
            SortAction::TitleDesc => "title-desc",
        }
    }
}

impl fmt::Display for SortAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for SortAction {
    type Err = ParseSortError;

    /// Accepts `date-asc`, `date_asc` and the like.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((axis, direction)) = s.split_once(|c: char| c == '-' || c == '_') else {
            return Err(ParseSortError::Action(s.to_string()));
        };
        let axis = axis
            .parse::<SortAxis>()
            .map_err(|_| ParseSortError::Action(s.to_string()))?;
        let direction = direction
            .parse::<SortDirection>()
            .map_err(|_| ParseSortError::Action(s.to_string()))?;
        Ok(SortAction::new(axis, direction))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsItem {
    pub id: NewsItemId,
    pub source: String,
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_search: Option<String>,
    #[serde(default)]
    pub is_removed_from_display: bool,
    #[serde(default)]
    pub is_selected_for_download: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArticle {
    pub source: String,
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub google_search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_action_slugs_in_both_separators() {
        assert_eq!("date-asc".parse::<SortAction>().unwrap(), SortAction::DateAsc);
        assert_eq!(
            "title_desc".parse::<SortAction>().unwrap(),
            SortAction::TitleDesc
        );
        assert!("date".parse::<SortAction>().is_err());
        assert!("size-asc".parse::<SortAction>().is_err());
        assert!("date-up".parse::<SortAction>().is_err());
    }

    #[test]
    fn action_round_trips_through_axis_and_direction() {
        for action in SortAction::ALL {
            assert_eq!(SortAction::new(action.axis(), action.direction()), action);
            assert_eq!(action.slug().parse::<SortAction>().unwrap(), action);
        }
    }

    #[test]
    fn other_axis_is_the_opposite_parameter() {
        assert_eq!(SortAxis::Date.other().param(), SORT_TITLE_PARAM);
        assert_eq!(SortAxis::Title.other().param(), SORT_DATE_PARAM);
    }
}
