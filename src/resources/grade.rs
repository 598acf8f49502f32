//! Grade-centric operations: enrollment grade listings, grade updates,
//! grading periods, and grading standards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use urlencoding::encode;

use crate::client::CanvasClient;
use crate::error::Result;
use crate::pagination::{fetch_listing, Fetch};
use crate::params::{include_query, nested_params, Params};
use crate::resources::enrollment::Enrollment;
use crate::resources::submission::Submission;
use crate::resources::{from_records, from_value};

/// A grading period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingPeriod {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub close_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub is_closed: Option<bool>,
    #[serde(flatten)]
    pub extra: Params,
}

/// A grading standard (letter-grade scheme).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingStandard {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub context_id: Option<u64>,
    #[serde(default)]
    pub context_type: Option<String>,
    #[serde(default)]
    pub grading_scheme: Vec<Value>,
    #[serde(flatten)]
    pub extra: Params,
}

/// Filters for listing grades (course enrollments with grade data).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradeFilters {
    pub student_id: Option<String>,
    pub assignment_id: Option<String>,
    pub grading_period_id: Option<String>,
    pub scope: Option<String>,
    pub include: Vec<String>,
}

impl GradeFilters {
    fn into_query(self) -> Params {
        let mut query = Params::new();
        if let Some(student_id) = self.student_id {
            query.insert(
                "student_ids".to_string(),
                Value::Array(vec![Value::String(student_id)]),
            );
        }
        if let Some(assignment_id) = self.assignment_id {
            query.insert(
                "assignment_ids".to_string(),
                Value::Array(vec![Value::String(assignment_id)]),
            );
        }
        if let Some(grading_period_id) = self.grading_period_id {
            query.insert(
                "grading_period_id".to_string(),
                Value::String(grading_period_id),
            );
        }
        if let Some(scope) = self.scope {
            let state = if scope == "students" {
                "active".to_string()
            } else {
                scope
            };
            query.insert("enrollment_state".to_string(), Value::String(state));
        }
        query.append(&mut include_query(&self.include));
        query
    }
}

/// Changes applied when updating a grade.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradeUpdate {
    pub comment: Option<String>,
    pub excuse: Option<bool>,
    pub late_policy_status: Option<String>,
}

/// List grades for a course as enrollments carrying grade summaries.
pub async fn list(
    client: &CanvasClient,
    course_id: &str,
    filters: GradeFilters,
    fetch: Fetch,
) -> Result<Vec<Enrollment>> {
    let endpoint = format!("/courses/{}/enrollments", encode(course_id));
    let records = fetch_listing(client, &endpoint, filters.into_query(), fetch).await?;
    from_records(records)
}

/// Post a grade for a student's submission.
pub async fn update(
    client: &CanvasClient,
    course_id: &str,
    assignment_id: &str,
    student_id: &str,
    grade: &str,
    changes: GradeUpdate,
) -> Result<Submission> {
    let mut fields = Params::new();
    fields.insert(
        "posted_grade".to_string(),
        Value::String(grade.to_string()),
    );
    if let Some(comment) = changes.comment {
        fields.insert("comment[text_comment]".to_string(), Value::String(comment));
    }
    if let Some(excuse) = changes.excuse {
        fields.insert("excuse".to_string(), Value::Bool(excuse));
    }
    if let Some(status) = changes.late_policy_status {
        fields.insert("late_policy_status".to_string(), Value::String(status));
    }
    let body = nested_params("submission", &fields);

    let value = client
        .put(
            &format!(
                "/courses/{}/assignments/{}/submissions/{}",
                encode(course_id),
                encode(assignment_id),
                encode(student_id)
            ),
            &body,
        )
        .await?;
    from_value(value)
}

/// List grading periods for a course, or for an account when given.
///
/// Canvas wraps the list in a `grading_periods` envelope, so records stay
/// untyped.
pub async fn grading_periods(
    client: &CanvasClient,
    course_id: &str,
    account_id: Option<&str>,
    fetch: Fetch,
) -> Result<Vec<Value>> {
    let endpoint = match account_id {
        Some(account_id) => format!("/accounts/{}/grading_periods", encode(account_id)),
        None => format!("/courses/{}/grading_periods", encode(course_id)),
    };
    fetch_listing(client, &endpoint, Params::new(), fetch).await
}

/// List grading standards for a course, or for an account when given.
pub async fn grading_standards(
    client: &CanvasClient,
    course_id: &str,
    account_id: Option<&str>,
    fetch: Fetch,
) -> Result<Vec<GradingStandard>> {
    let endpoint = match account_id {
        Some(account_id) => format!("/accounts/{}/grading_standards", encode(account_id)),
        None => format!("/courses/{}/grading_standards", encode(course_id)),
    };
    let records = fetch_listing(client, &endpoint, Params::new(), fetch).await?;
    from_records(records)
}
