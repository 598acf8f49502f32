//! Submission entity and operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use urlencoding::encode;

use crate::client::CanvasClient;
use crate::error::Result;
use crate::pagination::{fetch_listing, Fetch};
use crate::params::{include_query, nested_params, Params};
use crate::resources::from_value;
use crate::upload::{upload_file, FileUpload};

/// A submission of an assignment by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: u64,
    #[serde(default)]
    pub assignment_id: Option<u64>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub attempt: Option<u64>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub entered_grade: Option<String>,
    #[serde(default)]
    pub entered_score: Option<f64>,
    #[serde(default)]
    pub submission_type: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub graded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub late: Option<bool>,
    #[serde(default)]
    pub missing: Option<bool>,
    #[serde(default)]
    pub excused: Option<bool>,
    #[serde(default)]
    pub late_policy_status: Option<String>,
    #[serde(default)]
    pub workflow_state: Option<String>,
    #[serde(flatten)]
    pub extra: Params,
}

/// Filters for listing submissions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmissionFilters {
    pub include: Vec<String>,
    pub grouped_by_student: Option<bool>,
}

impl SubmissionFilters {
    fn into_query(self) -> Params {
        let mut query = include_query(&self.include);
        if let Some(grouped) = self.grouped_by_student {
            query.insert("grouped".to_string(), Value::Bool(grouped));
        }
        query
    }
}

/// Grading changes applied to a submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradeChange {
    pub posted_grade: Option<Value>,
    pub excuse: Option<bool>,
    pub late_policy_status: Option<String>,
}

/// Get a user's submission for an assignment.
pub async fn get(
    client: &CanvasClient,
    course_id: &str,
    assignment_id: &str,
    user_id: &str,
    include: &[String],
) -> Result<Submission> {
    let query = include_query(include);
    let value = client
        .get(&submission_path(course_id, assignment_id, user_id), &query)
        .await?;
    from_value(value)
}

/// List the submissions for an assignment.
///
/// Records stay untyped here: `grouped_by_student` changes the response
/// shape to per-student groupings.
pub async fn list(
    client: &CanvasClient,
    course_id: &str,
    assignment_id: &str,
    filters: SubmissionFilters,
    fetch: Fetch,
) -> Result<Vec<Value>> {
    let endpoint = format!(
        "/courses/{}/assignments/{}/submissions",
        encode(course_id),
        encode(assignment_id)
    );
    fetch_listing(client, &endpoint, filters.into_query(), fetch).await
}

/// Submit an assignment on behalf of a user.
pub async fn create(
    client: &CanvasClient,
    course_id: &str,
    assignment_id: &str,
    user_id: &str,
    submission_type: &str,
    mut options: Params,
) -> Result<Submission> {
    options.insert(
        "submission_type".to_string(),
        Value::String(submission_type.to_string()),
    );
    let body = nested_params("submission", &options);

    let mut query = Params::new();
    query.insert(
        "as_user_id".to_string(),
        Value::String(user_id.to_string()),
    );

    let endpoint = format!(
        "/courses/{}/assignments/{}/submissions",
        encode(course_id),
        encode(assignment_id)
    );
    let value = client
        .request(reqwest::Method::POST, &endpoint, &body, &query)
        .await?;
    from_value(value)
}

/// Grade or update a submission.
pub async fn grade(
    client: &CanvasClient,
    course_id: &str,
    assignment_id: &str,
    user_id: &str,
    change: GradeChange,
) -> Result<Submission> {
    let mut fields = Params::new();
    if let Some(posted_grade) = change.posted_grade {
        fields.insert("posted_grade".to_string(), posted_grade);
    }
    if let Some(excuse) = change.excuse {
        fields.insert("excuse".to_string(), Value::Bool(excuse));
    }
    if let Some(status) = change.late_policy_status {
        fields.insert("late_policy_status".to_string(), Value::String(status));
    }
    let body = nested_params("submission", &fields);

    let value = client
        .put(&submission_path(course_id, assignment_id, user_id), &body)
        .await?;
    from_value(value)
}

/// Add a text comment to a submission.
pub async fn add_comment(
    client: &CanvasClient,
    course_id: &str,
    assignment_id: &str,
    user_id: &str,
    comment: &str,
    group_comment: bool,
) -> Result<Value> {
    let mut body = Params::new();
    body.insert(
        "comment[text_comment]".to_string(),
        Value::String(comment.to_string()),
    );
    body.insert(
        "comment[group_comment]".to_string(),
        Value::Bool(group_comment),
    );

    client
        .put(&submission_path(course_id, assignment_id, user_id), &body)
        .await
}

/// Upload a file into a user's submission.
pub async fn upload(
    client: &CanvasClient,
    course_id: &str,
    assignment_id: &str,
    user_id: &str,
    file: FileUpload,
) -> Result<Value> {
    let endpoint = format!(
        "{}/files",
        submission_path(course_id, assignment_id, user_id)
    );
    upload_file(client, &endpoint, file).await
}

fn submission_path(course_id: &str, assignment_id: &str, user_id: &str) -> String {
    format!(
        "/courses/{}/assignments/{}/submissions/{}",
        encode(course_id),
        encode(assignment_id),
        encode(user_id)
    )
}
