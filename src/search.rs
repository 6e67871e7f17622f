use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::data_models::{CourseDocument, CourseType};
use crate::es::{EsClient, SearchPage};

/// Raw-hit budget and final cap for autocomplete suggestions.
const SUGGEST_LIMIT: usize = 10;

/// Internal search request shape. All fields are optional constraints;
/// absence means "no constraint". Built by the API mapping layer in one
/// explicit parsing step.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub q: Option<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub category: Option<String>,
    pub course_type: Option<CourseType>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub start_date: Option<DateTime<Utc>>,
    pub sort: String,
    pub page: u32,
    pub size: u32,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            q: None,
            min_age: None,
            max_age: None,
            category: None,
            course_type: None,
            min_price: None,
            max_price: None,
            start_date: None,
            sort: "upcoming".to_string(),
            page: 0,
            size: 10,
        }
    }
}

/// Translate a request into the engine's boolean query.
///
/// The free-text clause is a `must`: when `q` is given, only matching
/// documents are returned. Filters narrow the result set without scoring.
/// Age bounds filter on window overlap, not containment: a requested
/// minimum age keeps courses whose maxAge reaches it, and vice versa.
pub fn build_bool_query(request: &SearchRequest) -> Value {
    let mut must = Vec::new();
    let mut filter = Vec::new();

    if let Some(q) = &request.q {
        let q = q.trim();
        if !q.is_empty() {
            must.push(json!({
                "multi_match": {
                    "query": q,
                    "fields": ["title^2", "description"],
                    "fuzziness": "AUTO"
                }
            }));
        }
    }

    if let Some(min_age) = request.min_age {
        filter.push(json!({ "range": { "maxAge": { "gte": min_age } } }));
    }
    if let Some(max_age) = request.max_age {
        filter.push(json!({ "range": { "minAge": { "lte": max_age } } }));
    }

    if let Some(category) = &request.category {
        if !category.trim().is_empty() {
            filter.push(json!({ "term": { "category": category } }));
        }
    }

    if let Some(course_type) = request.course_type {
        filter.push(json!({ "term": { "type": course_type.as_str() } }));
    }

    if request.min_price.is_some() || request.max_price.is_some() {
        let mut range = serde_json::Map::new();
        if let Some(min_price) = request.min_price {
            range.insert("gte".to_string(), json!(min_price));
        }
        if let Some(max_price) = request.max_price {
            range.insert("lte".to_string(), json!(max_price));
        }
        filter.push(json!({ "range": { "price": range } }));
    }

    if let Some(start_date) = request.start_date {
        let instant = start_date.to_rfc3339_opts(SecondsFormat::Secs, true);
        filter.push(json!({ "range": { "nextSessionDate": { "gte": instant } } }));
    }

    json!({ "bool": { "must": must, "filter": filter } })
}

/// Map a sort keyword to field and direction. Total: anything
/// unrecognized (including empty) falls back to soonest-session-first.
pub fn resolve_sort(sort: &str) -> (&'static str, &'static str) {
    match sort.to_lowercase().as_str() {
        "priceasc" => ("price", "asc"),
        "pricedesc" => ("price", "desc"),
        _ => ("nextSessionDate", "asc"),
    }
}

/// Engine-side sort clause for a sort keyword.
pub fn sort_clause(sort: &str) -> Value {
    let (field, order) = resolve_sort(sort);
    let mut clause = serde_json::Map::new();
    clause.insert(field.to_string(), json!({ "order": order }));
    Value::Array(vec![Value::Object(clause)])
}

/// Drop duplicate titles keeping first-seen order, then cap the list.
pub fn distinct_titles<I>(titles: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    titles
        .into_iter()
        .filter(|title| seen.insert(title.clone()))
        .take(limit)
        .collect()
}

#[test]
fn test_resolve_sort_is_total() {
    assert_eq!(resolve_sort("priceAsc"), ("price", "asc"));
    assert_eq!(resolve_sort("PRICEASC"), ("price", "asc"));
    assert_eq!(resolve_sort("priceDesc"), ("price", "desc"));
    assert_eq!(resolve_sort("upcoming"), ("nextSessionDate", "asc"));
    assert_eq!(resolve_sort(""), ("nextSessionDate", "asc"));
    assert_eq!(resolve_sort("nonsense"), ("nextSessionDate", "asc"));
}

#[test]
fn test_sort_clause_shape() {
    assert_eq!(
        sort_clause("priceDesc"),
        json!([{ "price": { "order": "desc" } }])
    );
    assert_eq!(
        sort_clause("whatever"),
        json!([{ "nextSessionDate": { "order": "asc" } }])
    );
}

#[test]
fn test_distinct_titles_preserves_first_seen_order_and_caps() {
    let titles = vec![
        "Chess Club".to_string(),
        "Art Workshop".to_string(),
        "Chess Club".to_string(),
        "Robotics".to_string(),
    ];
    assert_eq!(
        distinct_titles(titles.clone(), 10),
        vec!["Chess Club", "Art Workshop", "Robotics"]
    );
    assert_eq!(distinct_titles(titles, 2), vec!["Chess Club", "Art Workshop"]);

    let many: Vec<String> = (0..25).map(|i| format!("Course {i}")).collect();
    assert_eq!(distinct_titles(many, 10).len(), 10);
}

/// Search facade over the engine client: builds the boolean query, issues
/// one request per call, and shapes suggestion results.
pub struct SearchService {
    es: EsClient,
}

impl SearchService {
    pub fn new(es: EsClient) -> Self {
        Self { es }
    }

    pub fn es(&self) -> &EsClient {
        &self.es
    }

    /// Run a course search: one `_search` call with the boolean query,
    /// resolved sort, and page offset. Engine order is preserved.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchPage<CourseDocument>> {
        tracing::info!(?request, "Searching courses");

        let body = json!({
            "query": build_bool_query(request),
            "sort": sort_clause(&request.sort),
            "from": u64::from(request.page) * u64::from(request.size),
            "size": request.size,
        });

        let page = self.es.search(&body).await?;
        tracing::info!(
            total = page.total,
            returned = page.docs.len(),
            "Search completed"
        );
        Ok(page)
    }

    /// Autocomplete: match against the suggest-indexed title copy, then
    /// return distinct titles in hit order. Blank input short-circuits to
    /// an empty list without contacting the engine.
    pub async fn suggest(&self, query: &str) -> Result<Vec<String>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({
            "query": { "match": { "titleSuggest": { "query": query } } },
            "size": SUGGEST_LIMIT,
        });

        let page: SearchPage<CourseDocument> = self.es.search(&body).await?;
        Ok(distinct_titles(
            page.docs.into_iter().map(|course| course.title),
            SUGGEST_LIMIT,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_constraints_build_an_empty_bool_query() {
        let query = build_bool_query(&SearchRequest::default());
        assert_eq!(query, json!({ "bool": { "must": [], "filter": [] } }));
    }

    #[test]
    fn free_text_becomes_a_mandatory_multi_match() {
        let request = SearchRequest {
            q: Some("  math  ".to_string()),
            ..Default::default()
        };
        let query = build_bool_query(&request);
        assert_eq!(
            query["bool"]["must"],
            json!([{
                "multi_match": {
                    "query": "math",
                    "fields": ["title^2", "description"],
                    "fuzziness": "AUTO"
                }
            }])
        );
        assert_eq!(query["bool"]["filter"], json!([]));
    }

    #[test]
    fn blank_free_text_adds_no_clause() {
        let request = SearchRequest {
            q: Some("   ".to_string()),
            ..Default::default()
        };
        let query = build_bool_query(&request);
        assert_eq!(query["bool"]["must"], json!([]));
    }

    #[test]
    fn age_bounds_filter_on_window_overlap() {
        let request = SearchRequest {
            min_age: Some(10),
            max_age: Some(13),
            ..Default::default()
        };
        let query = build_bool_query(&request);
        assert_eq!(
            query["bool"]["filter"],
            json!([
                { "range": { "maxAge": { "gte": 10 } } },
                { "range": { "minAge": { "lte": 13 } } }
            ])
        );
    }

    #[test]
    fn category_and_type_are_exact_term_filters() {
        let request = SearchRequest {
            category: Some("Science".to_string()),
            course_type: Some(CourseType::Club),
            ..Default::default()
        };
        let query = build_bool_query(&request);
        assert_eq!(
            query["bool"]["filter"],
            json!([
                { "term": { "category": "Science" } },
                { "term": { "type": "CLUB" } }
            ])
        );
    }

    #[test]
    fn blank_category_is_ignored() {
        let request = SearchRequest {
            category: Some("  ".to_string()),
            ..Default::default()
        };
        let query = build_bool_query(&request);
        assert_eq!(query["bool"]["filter"], json!([]));
    }

    #[test]
    fn price_bounds_share_one_range_clause() {
        let request = SearchRequest {
            min_price: Some(50.0),
            max_price: Some(200.0),
            ..Default::default()
        };
        let query = build_bool_query(&request);
        assert_eq!(
            query["bool"]["filter"],
            json!([{ "range": { "price": { "gte": 50.0, "lte": 200.0 } } }])
        );

        let lower_only = SearchRequest {
            min_price: Some(50.0),
            ..Default::default()
        };
        let query = build_bool_query(&lower_only);
        assert_eq!(
            query["bool"]["filter"],
            json!([{ "range": { "price": { "gte": 50.0 } } }])
        );
    }

    #[test]
    fn start_date_filters_sessions_at_or_after_the_instant() {
        let request = SearchRequest {
            start_date: Some("2025-08-15T10:00:00Z".parse().unwrap()),
            ..Default::default()
        };
        let query = build_bool_query(&request);
        assert_eq!(
            query["bool"]["filter"],
            json!([{ "range": { "nextSessionDate": { "gte": "2025-08-15T10:00:00Z" } } }])
        );
    }

    #[test]
    fn all_filters_combine_in_one_bool_query() {
        let request = SearchRequest {
            q: Some("physics".to_string()),
            min_age: Some(8),
            category: Some("Science".to_string()),
            min_price: Some(10.0),
            ..Default::default()
        };
        let query = build_bool_query(&request);
        assert_eq!(query["bool"]["must"].as_array().unwrap().len(), 1);
        assert_eq!(query["bool"]["filter"].as_array().unwrap().len(), 3);
    }
}
