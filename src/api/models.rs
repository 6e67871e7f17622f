use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data_models::{CourseDocument, CourseType};
use crate::search::SearchRequest;

/// Upper bound on `size` to keep result requests bounded.
const MAX_PAGE_SIZE: u32 = 100;

/// Raw query-string parameters for `/api/search`. Everything arrives as an
/// optional string; typed conversion happens in `into_request` so a failure
/// can name the offending parameter instead of crashing the extractor.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    pub min_age: Option<String>,
    pub max_age: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub course_type: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub start_date: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

impl SearchParams {
    /// Convert raw parameters into the internal request shape, applying
    /// defaults (page 0, size 10, sort "upcoming") and clamping `size`.
    pub fn into_request(self) -> Result<SearchRequest, ApiError> {
        let mut request = SearchRequest {
            q: self.q,
            category: self.category,
            ..Default::default()
        };

        request.min_age = parse_opt("minAge", self.min_age)?;
        request.max_age = parse_opt("maxAge", self.max_age)?;
        request.min_price = parse_opt("minPrice", self.min_price)?;
        request.max_price = parse_opt("maxPrice", self.max_price)?;

        if let Some(raw) = self.course_type {
            let course_type = CourseType::parse(&raw)
                .ok_or_else(|| ApiError::invalid_param("type", &raw))?;
            request.course_type = Some(course_type);
        }

        if let Some(raw) = self.start_date {
            request.start_date = Some(parse_start_date(&raw)?);
        }

        if let Some(sort) = self.sort {
            request.sort = sort;
        }
        if let Some(page) = parse_opt("page", self.page)? {
            request.page = page;
        }
        if let Some(size) = parse_opt::<u32>("size", self.size)? {
            request.size = size.min(MAX_PAGE_SIZE);
        }

        Ok(request)
    }
}

fn parse_opt<T: std::str::FromStr>(
    param: &'static str,
    value: Option<String>,
) -> Result<Option<T>, ApiError> {
    match value {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::invalid_param(param, &raw)),
    }
}

/// Accepts RFC 3339 (`2025-08-15T10:00:00Z`) and the offset-less ISO local
/// form (`2025-08-15T10:00:00`), which is read as UTC.
fn parse_start_date(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    Err(ApiError::InvalidDate {
        value: raw.to_string(),
    })
}

/// Raw query-string parameters for `/api/search/suggest`.
#[derive(Debug, Default, Deserialize)]
pub struct SuggestParams {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub total: u64,
    pub courses: Vec<CourseDocument>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Parameter '{param}' has invalid value: {value}")]
    InvalidParam { param: &'static str, value: String },
    #[error("Required parameter '{param}' is missing")]
    MissingParam { param: &'static str },
    #[error("Invalid date '{value}'. Please use ISO-8601 format: yyyy-MM-ddTHH:mm:ss")]
    InvalidDate { value: String },
    #[error("The search backend failed to process the request")]
    Backend(anyhow::Error),
}

impl ApiError {
    fn invalid_param(param: &'static str, value: &str) -> Self {
        Self::InvalidParam {
            param,
            value: value.to_string(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(source: anyhow::Error) -> Self {
        Self::Backend(source)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ApiError::InvalidParam { .. } => (StatusCode::BAD_REQUEST, "Invalid parameter type"),
            ApiError::MissingParam { .. } => (StatusCode::BAD_REQUEST, "Missing parameter"),
            ApiError::InvalidDate { .. } => (StatusCode::BAD_REQUEST, "Invalid date format"),
            ApiError::Backend(source) => {
                // Full detail stays in the log; the caller gets a generic body.
                tracing::error!(error = ?source, "Search backend failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = ErrorBody {
            error: error.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_params_absent() {
        let request = SearchParams::default().into_request().unwrap();
        assert_eq!(request.page, 0);
        assert_eq!(request.size, 10);
        assert_eq!(request.sort, "upcoming");
        assert!(request.q.is_none());
        assert!(request.start_date.is_none());
    }

    #[test]
    fn typed_fields_parse_and_name_the_bad_parameter() {
        let params = SearchParams {
            min_age: Some("9".to_string()),
            max_price: Some("150.5".to_string()),
            course_type: Some("CLUB".to_string()),
            page: Some("3".to_string()),
            ..Default::default()
        };
        let request = params.into_request().unwrap();
        assert_eq!(request.min_age, Some(9));
        assert_eq!(request.max_price, Some(150.5));
        assert_eq!(request.course_type, Some(CourseType::Club));
        assert_eq!(request.page, 3);

        let params = SearchParams {
            min_age: Some("nine".to_string()),
            ..Default::default()
        };
        match params.into_request() {
            Err(ApiError::InvalidParam { param, value }) => {
                assert_eq!(param, "minAge");
                assert_eq!(value, "nine");
            }
            other => panic!("expected InvalidParam, got {other:?}"),
        }
    }

    #[test]
    fn negative_page_is_rejected() {
        let params = SearchParams {
            page: Some("-1".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            params.into_request(),
            Err(ApiError::InvalidParam { param: "page", .. })
        ));
    }

    #[test]
    fn oversized_size_is_clamped() {
        let params = SearchParams {
            size: Some("500".to_string()),
            ..Default::default()
        };
        assert_eq!(params.into_request().unwrap().size, 100);
    }

    #[test]
    fn unknown_course_type_is_rejected() {
        let params = SearchParams {
            course_type: Some("WEEKLY".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            params.into_request(),
            Err(ApiError::InvalidParam { param: "type", .. })
        ));
    }

    #[test]
    fn start_date_accepts_both_iso_forms() {
        let rfc3339 = SearchParams {
            start_date: Some("2025-08-15T10:00:00Z".to_string()),
            ..Default::default()
        };
        let local = SearchParams {
            start_date: Some("2025-08-15T10:00:00".to_string()),
            ..Default::default()
        };
        let expected: DateTime<Utc> = "2025-08-15T10:00:00Z".parse().unwrap();
        assert_eq!(rfc3339.into_request().unwrap().start_date, Some(expected));
        assert_eq!(local.into_request().unwrap().start_date, Some(expected));

        let bad = SearchParams {
            start_date: Some("15/08/2025".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            bad.into_request(),
            Err(ApiError::InvalidDate { .. })
        ));
    }
}
