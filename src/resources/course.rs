//! Course entity and operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use urlencoding::encode;

use crate::client::CanvasClient;
use crate::error::Result;
use crate::pagination::{fetch_listing, Fetch};
use crate::params::{include_query, nested_params, normalize_date_fields, Params};
use crate::resources::enrollment::{Enrollment, EnrollmentFilters};
use crate::resources::user::User;
use crate::resources::{from_records, from_value};

/// A Canvas course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub account_id: Option<u64>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub workflow_state: Option<String>,
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sis_course_id: Option<String>,
    #[serde(default)]
    pub enrollment_term_id: Option<u64>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub default_view: Option<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
    /// Include-dependent and less common fields.
    #[serde(flatten)]
    pub extra: Params,
}

/// Filters for listing courses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseFilters {
    pub enrollment_type: Option<String>,
    pub enrollment_state: Option<String>,
    pub state: Option<String>,
    pub include: Vec<String>,
}

impl CourseFilters {
    fn into_query(self) -> Params {
        let mut query = Params::new();
        if let Some(enrollment_type) = self.enrollment_type {
            query.insert("enrollment_type".to_string(), Value::String(enrollment_type));
        }
        if let Some(enrollment_state) = self.enrollment_state {
            query.insert(
                "enrollment_state".to_string(),
                Value::String(enrollment_state),
            );
        }
        if let Some(state) = self.state {
            query.insert("state".to_string(), Value::String(state));
        }
        query.append(&mut include_query(&self.include));
        query
    }
}

/// Filters for listing the users of a course.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseUserFilters {
    pub enrollment_type: Option<String>,
    pub enrollment_state: Option<String>,
    pub search_term: Option<String>,
    pub include: Vec<String>,
}

impl CourseUserFilters {
    fn into_query(self) -> Params {
        let mut query = Params::new();
        if let Some(enrollment_type) = self.enrollment_type {
            query.insert("enrollment_type".to_string(), Value::String(enrollment_type));
        }
        if let Some(enrollment_state) = self.enrollment_state {
            query.insert(
                "enrollment_state".to_string(),
                Value::String(enrollment_state),
            );
        }
        if let Some(search_term) = self.search_term {
            query.insert("search_term".to_string(), Value::String(search_term));
        }
        query.append(&mut include_query(&self.include));
        query
    }
}

const DATE_FIELDS: &[(&str, &str)] = &[("startAt", "start_at"), ("endAt", "end_at")];

/// Create a course under an account.
pub async fn create(
    client: &CanvasClient,
    account_id: &str,
    name: &str,
    mut attrs: Params,
) -> Result<Course> {
    normalize_date_fields(&mut attrs, DATE_FIELDS);
    attrs.insert("name".to_string(), Value::String(name.to_string()));
    let body = nested_params("course", &attrs);

    let value = client
        .post(&format!("/accounts/{}/courses", encode(account_id)), &body)
        .await?;
    from_value(value)
}

/// Get a single course.
pub async fn get(client: &CanvasClient, course_id: &str, include: &[String]) -> Result<Course> {
    let query = include_query(include);
    let value = client
        .get(&format!("/courses/{}", encode(course_id)), &query)
        .await?;
    from_value(value)
}

/// List courses visible to the caller.
pub async fn list(
    client: &CanvasClient,
    filters: CourseFilters,
    fetch: Fetch,
) -> Result<Vec<Course>> {
    let records = fetch_listing(client, "/courses", filters.into_query(), fetch).await?;
    from_records(records)
}

/// Update a course.
pub async fn update(client: &CanvasClient, course_id: &str, mut attrs: Params) -> Result<Course> {
    normalize_date_fields(&mut attrs, DATE_FIELDS);
    let body = nested_params("course", &attrs);

    let value = client
        .put(&format!("/courses/{}", encode(course_id)), &body)
        .await?;
    from_value(value)
}

/// Delete a course.
pub async fn delete(client: &CanvasClient, course_id: &str) -> Result<Value> {
    let mut body = Params::new();
    body.insert("event".to_string(), Value::String("delete".to_string()));
    client
        .delete(&format!("/courses/{}", encode(course_id)), &body)
        .await
}

/// Conclude a course without deleting it.
pub async fn conclude(client: &CanvasClient, course_id: &str) -> Result<Value> {
    let mut body = Params::new();
    body.insert("event".to_string(), Value::String("conclude".to_string()));
    client
        .delete(&format!("/courses/{}", encode(course_id)), &body)
        .await
}

/// Reset course content, returning the replacement course.
pub async fn reset(client: &CanvasClient, course_id: &str) -> Result<Value> {
    client
        .post(
            &format!("/courses/{}/reset_content", encode(course_id)),
            &Params::new(),
        )
        .await
}

/// Copy a course into another via a content migration.
pub async fn copy(
    client: &CanvasClient,
    source_course_id: &str,
    destination_course_id: &str,
    copy_options: Params,
) -> Result<Value> {
    let mut settings = copy_options;
    settings.insert(
        "source_course".to_string(),
        Value::String(source_course_id.to_string()),
    );

    let mut body = Params::new();
    body.insert(
        "migration_type".to_string(),
        Value::String("course_copy_importer".to_string()),
    );
    body.insert("settings".to_string(), Value::Object(settings));

    client
        .post(
            &format!(
                "/courses/{}/content_migrations",
                encode(destination_course_id)
            ),
            &body,
        )
        .await
}

/// List the users enrolled in a course.
pub async fn users(
    client: &CanvasClient,
    course_id: &str,
    filters: CourseUserFilters,
    fetch: Fetch,
) -> Result<Vec<User>> {
    let endpoint = format!("/courses/{}/users", encode(course_id));
    let records = fetch_listing(client, &endpoint, filters.into_query(), fetch).await?;
    from_records(records)
}

/// List the enrollments of a course.
pub async fn enrollments(
    client: &CanvasClient,
    course_id: &str,
    filters: EnrollmentFilters,
    fetch: Fetch,
) -> Result<Vec<Enrollment>> {
    let endpoint = format!("/courses/{}/enrollments", encode(course_id));
    let records = fetch_listing(client, &endpoint, filters.into_query(), fetch).await?;
    from_records(records)
}
