use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A course as stored in the search index. Field names on the wire are
/// camelCase to match the index mapping.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseDocument {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(rename = "type")]
    pub course_type: CourseType,
    pub grade_range: String,
    pub min_age: i32,
    pub max_age: i32,
    pub price: f64,
    pub next_session_date: DateTime<Utc>,
    /// Search-as-you-type copy of the title, populated by the loader.
    #[serde(default)]
    pub title_suggest: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseType {
    OneTime,
    Course,
    Club,
}

impl CourseType {
    /// Parse the wire form (`ONE_TIME`, `COURSE`, `CLUB`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ONE_TIME" => Some(Self::OneTime),
            "COURSE" => Some(Self::Course),
            "CLUB" => Some(Self::Club),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneTime => "ONE_TIME",
            Self::Course => "COURSE",
            Self::Club => "CLUB",
        }
    }
}
