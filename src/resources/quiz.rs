//! Quiz entities and operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use urlencoding::encode;

use crate::client::CanvasClient;
use crate::error::Result;
use crate::pagination::{fetch_listing, Fetch};
use crate::params::{include_query, nested_params, normalize_date_fields, Params};
use crate::resources::{from_records, from_value};

/// A classic Canvas quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quiz_type: Option<String>,
    #[serde(default)]
    pub time_limit: Option<u64>,
    #[serde(default)]
    pub shuffle_answers: Option<bool>,
    #[serde(default)]
    pub allowed_attempts: Option<i64>,
    #[serde(default)]
    pub question_count: Option<u64>,
    #[serde(default)]
    pub points_possible: Option<f64>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lock_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unlock_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(flatten)]
    pub extra: Params,
}

/// A question within a quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: u64,
    #[serde(default)]
    pub quiz_id: Option<u64>,
    #[serde(default)]
    pub position: Option<u64>,
    #[serde(default)]
    pub question_name: Option<String>,
    #[serde(default)]
    pub question_type: Option<String>,
    #[serde(default)]
    pub question_text: Option<String>,
    #[serde(default)]
    pub points_possible: Option<f64>,
    #[serde(flatten)]
    pub extra: Params,
}

/// A new quiz question.
#[derive(Debug, Clone)]
pub struct NewQuizQuestion {
    pub question_name: String,
    pub question_type: String,
    pub question_text: String,
    pub points_possible: f64,
    /// Extra question attributes; an `answers` value given as a JSON
    /// string is decoded before sending.
    pub options: Params,
}

const DATE_FIELDS: &[(&str, &str)] = &[
    ("dueAt", "due_at"),
    ("lockAt", "lock_at"),
    ("unlockAt", "unlock_at"),
];

/// Create a quiz in a course.
pub async fn create(
    client: &CanvasClient,
    course_id: &str,
    title: &str,
    mut attrs: Params,
) -> Result<Quiz> {
    normalize_date_fields(&mut attrs, DATE_FIELDS);
    attrs.insert("title".to_string(), Value::String(title.to_string()));
    let body = nested_params("quiz", &attrs);

    let value = client
        .post(&format!("/courses/{}/quizzes", encode(course_id)), &body)
        .await?;
    from_value(value)
}

/// Get a single quiz.
pub async fn get(client: &CanvasClient, course_id: &str, quiz_id: &str) -> Result<Quiz> {
    let value = client
        .get(&quiz_path(course_id, quiz_id), &Params::new())
        .await?;
    from_value(value)
}

/// List the quizzes of a course.
pub async fn list(
    client: &CanvasClient,
    course_id: &str,
    search_term: Option<&str>,
    fetch: Fetch,
) -> Result<Vec<Quiz>> {
    let mut query = Params::new();
    if let Some(search_term) = search_term {
        query.insert(
            "search_term".to_string(),
            Value::String(search_term.to_string()),
        );
    }

    let endpoint = format!("/courses/{}/quizzes", encode(course_id));
    let records = fetch_listing(client, &endpoint, query, fetch).await?;
    from_records(records)
}

/// Update a quiz.
pub async fn update(
    client: &CanvasClient,
    course_id: &str,
    quiz_id: &str,
    mut attrs: Params,
) -> Result<Quiz> {
    normalize_date_fields(&mut attrs, DATE_FIELDS);
    let body = nested_params("quiz", &attrs);

    let value = client.put(&quiz_path(course_id, quiz_id), &body).await?;
    from_value(value)
}

/// Delete a quiz.
pub async fn delete(client: &CanvasClient, course_id: &str, quiz_id: &str) -> Result<Value> {
    client
        .delete(&quiz_path(course_id, quiz_id), &Params::new())
        .await
}

/// List the questions of a quiz.
pub async fn questions(
    client: &CanvasClient,
    course_id: &str,
    quiz_id: &str,
    fetch: Fetch,
) -> Result<Vec<QuizQuestion>> {
    let endpoint = format!("{}/questions", quiz_path(course_id, quiz_id));
    let records = fetch_listing(client, &endpoint, Params::new(), fetch).await?;
    from_records(records)
}

/// Add a question to a quiz.
pub async fn create_question(
    client: &CanvasClient,
    course_id: &str,
    quiz_id: &str,
    question: NewQuizQuestion,
) -> Result<QuizQuestion> {
    let mut fields = question.options;
    fields.insert(
        "question_name".to_string(),
        Value::String(question.question_name),
    );
    fields.insert(
        "question_type".to_string(),
        Value::String(question.question_type),
    );
    fields.insert(
        "question_text".to_string(),
        Value::String(question.question_text),
    );
    fields.insert(
        "points_possible".to_string(),
        Value::from(question.points_possible),
    );

    // Answers may arrive as a JSON-encoded string; decode before sending.
    if let Some(answers) = fields.get("answers").and_then(Value::as_str) {
        let decoded: Value = serde_json::from_str(answers)?;
        fields.insert("answers".to_string(), decoded);
    }

    let body = nested_params("question", &fields);
    let value = client
        .post(&format!("{}/questions", quiz_path(course_id, quiz_id)), &body)
        .await?;
    from_value(value)
}

/// List the submissions of a quiz.
///
/// Canvas wraps quiz submissions in an envelope object, so records stay
/// untyped here.
pub async fn submissions(
    client: &CanvasClient,
    course_id: &str,
    quiz_id: &str,
    include: &[String],
    fetch: Fetch,
) -> Result<Vec<Value>> {
    let endpoint = format!("{}/submissions", quiz_path(course_id, quiz_id));
    fetch_listing(client, &endpoint, include_query(include), fetch).await
}

fn quiz_path(course_id: &str, quiz_id: &str) -> String {
    format!("/courses/{}/quizzes/{}", encode(course_id), encode(quiz_id))
}
