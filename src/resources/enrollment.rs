//! Enrollment entity and operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use urlencoding::encode;

use crate::client::CanvasClient;
use crate::error::Result;
use crate::pagination::{fetch_listing, Fetch};
use crate::params::{include_query, nested_params, normalize_date_fields, Params};
use crate::resources::{from_records, from_value};

/// A course enrollment linking a user to a course in a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: u64,
    #[serde(default)]
    pub course_id: Option<u64>,
    #[serde(default)]
    pub course_section_id: Option<u64>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(rename = "type", default)]
    pub enrollment_type: Option<String>,
    #[serde(default)]
    pub enrollment_state: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub role_id: Option<u64>,
    #[serde(default)]
    pub sis_user_id: Option<String>,
    #[serde(default)]
    pub sis_course_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_activity_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub grades: Option<Grades>,
    #[serde(flatten)]
    pub extra: Params,
}

/// Grade summary attached to an enrollment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Grades {
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub current_grade: Option<String>,
    #[serde(default)]
    pub final_grade: Option<String>,
    #[serde(default)]
    pub current_score: Option<f64>,
    #[serde(default)]
    pub final_score: Option<f64>,
    #[serde(flatten)]
    pub extra: Params,
}

/// Filters for listing enrollments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnrollmentFilters {
    #[serde(rename = "type")]
    pub enrollment_type: Option<String>,
    pub state: Option<String>,
    pub role: Option<String>,
    pub include: Vec<String>,
}

impl EnrollmentFilters {
    pub(crate) fn into_query(self) -> Params {
        let mut query = Params::new();
        if let Some(enrollment_type) = self.enrollment_type {
            query.insert("type".to_string(), Value::String(enrollment_type));
        }
        if let Some(state) = self.state {
            query.insert("state".to_string(), Value::String(state));
        }
        if let Some(role) = self.role {
            query.insert("role".to_string(), Value::String(role));
        }
        query.append(&mut include_query(&self.include));
        query
    }
}

const DATE_FIELDS: &[(&str, &str)] = &[("startAt", "start_at"), ("endAt", "end_at")];

/// Enroll a user in a course.
pub async fn create(
    client: &CanvasClient,
    course_id: &str,
    user_id: &str,
    enrollment_type: &str,
    mut attrs: Params,
) -> Result<Enrollment> {
    normalize_date_fields(&mut attrs, DATE_FIELDS);
    attrs.insert("user_id".to_string(), Value::String(user_id.to_string()));
    attrs.insert(
        "type".to_string(),
        Value::String(enrollment_type.to_string()),
    );
    let body = nested_params("enrollment", &attrs);

    let value = client
        .post(&format!("/courses/{}/enrollments", encode(course_id)), &body)
        .await?;
    from_value(value)
}

/// Get a single enrollment by account.
pub async fn get(
    client: &CanvasClient,
    account_id: &str,
    enrollment_id: &str,
) -> Result<Enrollment> {
    let value = client
        .get(
            &format!(
                "/accounts/{}/enrollments/{}",
                encode(account_id),
                encode(enrollment_id)
            ),
            &Params::new(),
        )
        .await?;
    from_value(value)
}

/// List the enrollments of a course.
pub async fn list(
    client: &CanvasClient,
    course_id: &str,
    filters: EnrollmentFilters,
    fetch: Fetch,
) -> Result<Vec<Enrollment>> {
    let endpoint = format!("/courses/{}/enrollments", encode(course_id));
    let records = fetch_listing(client, &endpoint, filters.into_query(), fetch).await?;
    from_records(records)
}

/// Update an enrollment.
pub async fn update(
    client: &CanvasClient,
    course_id: &str,
    enrollment_id: &str,
    mut attrs: Params,
) -> Result<Enrollment> {
    normalize_date_fields(&mut attrs, DATE_FIELDS);
    let body = nested_params("enrollment", &attrs);

    let value = client
        .put(
            &format!(
                "/courses/{}/enrollments/{}",
                encode(course_id),
                encode(enrollment_id)
            ),
            &body,
        )
        .await?;
    from_value(value)
}

/// Delete, conclude, deactivate, or reset an enrollment depending on `task`.
pub async fn delete(
    client: &CanvasClient,
    course_id: &str,
    enrollment_id: &str,
    task: &str,
) -> Result<Value> {
    let mut body = Params::new();
    body.insert("task".to_string(), Value::String(task.to_string()));
    client
        .delete(
            &format!(
                "/courses/{}/enrollments/{}",
                encode(course_id),
                encode(enrollment_id)
            ),
            &body,
        )
        .await
}

/// Conclude an enrollment (shorthand for `delete` with task `conclude`).
pub async fn conclude(
    client: &CanvasClient,
    course_id: &str,
    enrollment_id: &str,
) -> Result<Value> {
    delete(client, course_id, enrollment_id, "conclude").await
}

/// Reactivate an inactive enrollment.
pub async fn reactivate(
    client: &CanvasClient,
    course_id: &str,
    enrollment_id: &str,
) -> Result<Value> {
    client
        .put(
            &format!(
                "/courses/{}/enrollments/{}/reactivate",
                encode(course_id),
                encode(enrollment_id)
            ),
            &Params::new(),
        )
        .await
}
