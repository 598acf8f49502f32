//! Assignment entity and operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use urlencoding::encode;

use crate::client::CanvasClient;
use crate::error::Result;
use crate::pagination::{fetch_listing, Fetch};
use crate::params::{include_query, nested_params, normalize_date_fields, Params};
use crate::resources::submission::Submission;
use crate::resources::{from_records, from_value};

/// A Canvas assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub course_id: Option<u64>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lock_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unlock_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub points_possible: Option<f64>,
    #[serde(default)]
    pub grading_type: Option<String>,
    #[serde(default)]
    pub submission_types: Vec<String>,
    #[serde(default)]
    pub position: Option<u64>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub workflow_state: Option<String>,
    #[serde(flatten)]
    pub extra: Params,
}

/// Filters for listing assignments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssignmentFilters {
    pub bucket: Option<String>,
    pub search_term: Option<String>,
    pub order_by: Option<String>,
    pub include: Vec<String>,
}

impl AssignmentFilters {
    fn into_query(self) -> Params {
        let mut query = Params::new();
        if let Some(bucket) = self.bucket {
            query.insert("bucket".to_string(), Value::String(bucket));
        }
        if let Some(search_term) = self.search_term {
            query.insert("search_term".to_string(), Value::String(search_term));
        }
        if let Some(order_by) = self.order_by {
            query.insert("order_by".to_string(), Value::String(order_by));
        }
        query.append(&mut include_query(&self.include));
        query
    }
}

const DATE_FIELDS: &[(&str, &str)] = &[
    ("dueAt", "due_at"),
    ("lockAt", "lock_at"),
    ("unlockAt", "unlock_at"),
];

/// Create an assignment in a course.
pub async fn create(
    client: &CanvasClient,
    course_id: &str,
    name: &str,
    mut attrs: Params,
) -> Result<Assignment> {
    normalize_date_fields(&mut attrs, DATE_FIELDS);
    attrs.insert("name".to_string(), Value::String(name.to_string()));
    let body = nested_params("assignment", &attrs);

    let value = client
        .post(&format!("/courses/{}/assignments", encode(course_id)), &body)
        .await?;
    from_value(value)
}

/// Get a single assignment.
pub async fn get(
    client: &CanvasClient,
    course_id: &str,
    assignment_id: &str,
    include: &[String],
) -> Result<Assignment> {
    let query = include_query(include);
    let value = client
        .get(
            &format!(
                "/courses/{}/assignments/{}",
                encode(course_id),
                encode(assignment_id)
            ),
            &query,
        )
        .await?;
    from_value(value)
}

/// List the assignments of a course.
pub async fn list(
    client: &CanvasClient,
    course_id: &str,
    filters: AssignmentFilters,
    fetch: Fetch,
) -> Result<Vec<Assignment>> {
    let endpoint = format!("/courses/{}/assignments", encode(course_id));
    let records = fetch_listing(client, &endpoint, filters.into_query(), fetch).await?;
    from_records(records)
}

/// Update an assignment.
pub async fn update(
    client: &CanvasClient,
    course_id: &str,
    assignment_id: &str,
    mut attrs: Params,
) -> Result<Assignment> {
    normalize_date_fields(&mut attrs, DATE_FIELDS);
    let body = nested_params("assignment", &attrs);

    let value = client
        .put(
            &format!(
                "/courses/{}/assignments/{}",
                encode(course_id),
                encode(assignment_id)
            ),
            &body,
        )
        .await?;
    from_value(value)
}

/// Delete an assignment.
pub async fn delete(
    client: &CanvasClient,
    course_id: &str,
    assignment_id: &str,
) -> Result<Value> {
    client
        .delete(
            &format!(
                "/courses/{}/assignments/{}",
                encode(course_id),
                encode(assignment_id)
            ),
            &Params::new(),
        )
        .await
}

/// Duplicate an assignment within its course.
pub async fn duplicate(
    client: &CanvasClient,
    course_id: &str,
    assignment_id: &str,
) -> Result<Assignment> {
    let value = client
        .post(
            &format!(
                "/courses/{}/assignments/{}/duplicate",
                encode(course_id),
                encode(assignment_id)
            ),
            &Params::new(),
        )
        .await?;
    from_value(value)
}

/// List the submissions for an assignment.
pub async fn submissions(
    client: &CanvasClient,
    course_id: &str,
    assignment_id: &str,
    include: &[String],
    fetch: Fetch,
) -> Result<Vec<Submission>> {
    let endpoint = format!(
        "/courses/{}/assignments/{}/submissions",
        encode(course_id),
        encode(assignment_id)
    );
    let records = fetch_listing(client, &endpoint, include_query(include), fetch).await?;
    from_records(records)
}

/// List the date overrides of an assignment.
pub async fn overrides(
    client: &CanvasClient,
    course_id: &str,
    assignment_id: &str,
) -> Result<Value> {
    client
        .get(
            &format!(
                "/courses/{}/assignments/{}/overrides",
                encode(course_id),
                encode(assignment_id)
            ),
            &Params::new(),
        )
        .await
}
