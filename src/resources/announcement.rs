//! Announcement entity and operations.
//!
//! Announcements are discussion topics flagged `is_announcement`; single-item
//! operations go through the discussion-topics endpoints while listing uses
//! the dedicated `/announcements` endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use urlencoding::encode;

use crate::client::CanvasClient;
use crate::error::Result;
use crate::pagination::{fetch_listing, Fetch};
use crate::params::{format_date, normalize_date_fields, Params};
use crate::resources::{from_records, from_value};

/// An announcement posted in a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delayed_post_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lock_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub context_code: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(flatten)]
    pub extra: Params,
}

/// Filters for listing announcements.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnouncementFilters {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub active_only: Option<bool>,
    pub latest_only: Option<bool>,
}

impl AnnouncementFilters {
    fn into_query(self, course_id: &str) -> Params {
        let mut query = Params::new();
        query.insert("only_announcements".to_string(), Value::Bool(true));
        query.insert(
            "context_codes".to_string(),
            Value::Array(vec![Value::String(format!("course_{course_id}"))]),
        );
        if let Some(start_date) = self.start_date {
            let formatted = format_date(&start_date).unwrap_or(start_date);
            query.insert("start_date".to_string(), Value::String(formatted));
        }
        if let Some(end_date) = self.end_date {
            let formatted = format_date(&end_date).unwrap_or(end_date);
            query.insert("end_date".to_string(), Value::String(formatted));
        }
        if let Some(active_only) = self.active_only {
            query.insert("active_only".to_string(), Value::Bool(active_only));
        }
        if let Some(latest_only) = self.latest_only {
            query.insert("latest_only".to_string(), Value::Bool(latest_only));
        }
        query
    }
}

const DATE_FIELDS: &[(&str, &str)] = &[
    ("delayedPostAt", "delayed_post_at"),
    ("lockAt", "lock_at"),
];

/// Create an announcement in a course.
pub async fn create(
    client: &CanvasClient,
    course_id: &str,
    title: &str,
    message: &str,
    mut attrs: Params,
) -> Result<Announcement> {
    normalize_date_fields(&mut attrs, DATE_FIELDS);
    attrs.insert("title".to_string(), Value::String(title.to_string()));
    attrs.insert("message".to_string(), Value::String(message.to_string()));
    attrs.insert("is_announcement".to_string(), Value::Bool(true));

    let value = client
        .post(
            &format!("/courses/{}/discussion_topics", encode(course_id)),
            &attrs,
        )
        .await?;
    from_value(value)
}

/// Get a single announcement.
pub async fn get(
    client: &CanvasClient,
    course_id: &str,
    announcement_id: &str,
) -> Result<Announcement> {
    let value = client
        .get(
            &announcement_path(course_id, announcement_id),
            &Params::new(),
        )
        .await?;
    from_value(value)
}

/// List the announcements of a course.
pub async fn list(
    client: &CanvasClient,
    course_id: &str,
    filters: AnnouncementFilters,
    fetch: Fetch,
) -> Result<Vec<Announcement>> {
    let query = filters.into_query(course_id);
    let records = fetch_listing(client, "/announcements", query, fetch).await?;
    from_records(records)
}

/// Update an announcement.
pub async fn update(
    client: &CanvasClient,
    course_id: &str,
    announcement_id: &str,
    mut attrs: Params,
) -> Result<Announcement> {
    normalize_date_fields(&mut attrs, DATE_FIELDS);
    let value = client
        .put(&announcement_path(course_id, announcement_id), &attrs)
        .await?;
    from_value(value)
}

/// Delete an announcement.
pub async fn delete(
    client: &CanvasClient,
    course_id: &str,
    announcement_id: &str,
) -> Result<Value> {
    client
        .delete(
            &announcement_path(course_id, announcement_id),
            &Params::new(),
        )
        .await
}

fn announcement_path(course_id: &str, announcement_id: &str) -> String {
    format!(
        "/courses/{}/discussion_topics/{}",
        encode(course_id),
        encode(announcement_id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_query_scopes_to_course() {
        let query = AnnouncementFilters::default().into_query("101");
        assert_eq!(query["only_announcements"], json!(true));
        assert_eq!(query["context_codes"], json!(["course_101"]));
    }

    #[test]
    fn test_list_query_formats_date_bounds() {
        let filters = AnnouncementFilters {
            start_date: Some("2025-01-15".to_string()),
            end_date: Some("not a date".to_string()),
            active_only: Some(true),
            latest_only: None,
        };
        let query = filters.into_query("101");
        assert_eq!(query["start_date"], json!("2025-01-15T00:00:00.000Z"));
        // Unparseable values pass through for the server to reject.
        assert_eq!(query["end_date"], json!("not a date"));
        assert_eq!(query["active_only"], json!(true));
        assert!(!query.contains_key("latest_only"));
    }
}
