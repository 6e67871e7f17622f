use anyhow::{Context, Result};

use crate::data_models::CourseDocument;
use crate::es::EsClient;

const SAMPLE_COURSES: &str = include_str!("../data/sample-courses.json");

/// One-shot startup load of the bundled sample corpus. Skips when the
/// index already holds documents, so restarts do not duplicate data.
pub async fn load_sample_courses(es: &EsClient) -> Result<()> {
    tracing::info!("Loading sample course data...");

    let count = es.count().await?;
    if count > 0 {
        tracing::info!("Sample data already loaded. Found {} courses in index.", count);
        return Ok(());
    }

    let courses = sample_courses().context("Failed to parse sample course data")?;
    es.bulk_index(&courses).await?;

    tracing::info!(
        "Successfully loaded {} courses into index {}",
        courses.len(),
        es.index()
    );
    Ok(())
}

/// The embedded corpus with each document's suggest field set from its
/// title, the way the index expects it.
pub fn sample_courses() -> Result<Vec<CourseDocument>> {
    let mut courses: Vec<CourseDocument> = serde_json::from_str(SAMPLE_COURSES)?;
    for course in &mut courses {
        course.title_suggest = Some(course.title.clone());
    }
    Ok(courses)
}
