//! Discussion-topic entity and operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use urlencoding::encode;

use crate::client::CanvasClient;
use crate::error::Result;
use crate::pagination::{fetch_listing, Fetch};
use crate::params::{include_query, normalize_date_fields, Params};
use crate::resources::{from_records, from_value};

/// A discussion topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discussion {
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
    pub discussion_type: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(default)]
    pub pinned: Option<bool>,
    #[serde(default)]
    pub read_state: Option<String>,
    #[serde(default)]
    pub unread_count: Option<u64>,
    #[serde(default)]
    pub discussion_subentry_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Params,
}

/// Filters for listing discussion topics.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscussionFilters {
    pub order_by: Option<String>,
    pub scope: Option<String>,
    pub only_announcements: Option<bool>,
    pub search_term: Option<String>,
    pub include: Vec<String>,
}

impl DiscussionFilters {
    fn into_query(self) -> Params {
        let mut query = Params::new();
        if let Some(order_by) = self.order_by {
            query.insert("order_by".to_string(), Value::String(order_by));
        }
        if let Some(scope) = self.scope {
            query.insert("scope".to_string(), Value::String(scope));
        }
        if let Some(only_announcements) = self.only_announcements {
            query.insert(
                "only_announcements".to_string(),
                Value::Bool(only_announcements),
            );
        }
        if let Some(search_term) = self.search_term {
            query.insert("search_term".to_string(), Value::String(search_term));
        }
        query.append(&mut include_query(&self.include));
        query
    }
}

const DATE_FIELDS: &[(&str, &str)] = &[
    ("delayedPostAt", "delayed_post_at"),
    ("lockAt", "lock_at"),
];

/// Create a discussion topic in a course.
///
/// Discussion bodies are flat, not `prefix[field]`-nested.
pub async fn create(
    client: &CanvasClient,
    course_id: &str,
    title: &str,
    mut attrs: Params,
) -> Result<Discussion> {
    normalize_date_fields(&mut attrs, DATE_FIELDS);
    if let Some(is_announcement) = attrs.remove("isAnnouncement") {
        attrs.insert("is_announcement".to_string(), is_announcement);
    }
    attrs.insert("title".to_string(), Value::String(title.to_string()));

    let value = client
        .post(
            &format!("/courses/{}/discussion_topics", encode(course_id)),
            &attrs,
        )
        .await?;
    from_value(value)
}

/// Get a single discussion topic.
pub async fn get(
    client: &CanvasClient,
    course_id: &str,
    topic_id: &str,
    include: &[String],
) -> Result<Discussion> {
    let query = include_query(include);
    let value = client.get(&topic_path(course_id, topic_id), &query).await?;
    from_value(value)
}

/// List the discussion topics of a course.
pub async fn list(
    client: &CanvasClient,
    course_id: &str,
    filters: DiscussionFilters,
    fetch: Fetch,
) -> Result<Vec<Discussion>> {
    let endpoint = format!("/courses/{}/discussion_topics", encode(course_id));
    let records = fetch_listing(client, &endpoint, filters.into_query(), fetch).await?;
    from_records(records)
}

/// Update a discussion topic.
pub async fn update(
    client: &CanvasClient,
    course_id: &str,
    topic_id: &str,
    mut attrs: Params,
) -> Result<Discussion> {
    normalize_date_fields(&mut attrs, DATE_FIELDS);
    let value = client.put(&topic_path(course_id, topic_id), &attrs).await?;
    from_value(value)
}

/// Delete a discussion topic.
pub async fn delete(client: &CanvasClient, course_id: &str, topic_id: &str) -> Result<Value> {
    client
        .delete(&topic_path(course_id, topic_id), &Params::new())
        .await
}

/// List the entries of a discussion topic.
pub async fn entries(
    client: &CanvasClient,
    course_id: &str,
    topic_id: &str,
    fetch: Fetch,
) -> Result<Vec<Value>> {
    let endpoint = format!("{}/entries", topic_path(course_id, topic_id));
    fetch_listing(client, &endpoint, Params::new(), fetch).await
}

/// Post an entry (or a reply, when a parent entry is given).
pub async fn create_entry(
    client: &CanvasClient,
    course_id: &str,
    topic_id: &str,
    message: &str,
    parent_entry_id: Option<&str>,
) -> Result<Value> {
    let endpoint = match parent_entry_id {
        Some(parent) => format!(
            "{}/entries/{}/replies",
            topic_path(course_id, topic_id),
            encode(parent)
        ),
        None => format!("{}/entries", topic_path(course_id, topic_id)),
    };

    let mut body = Params::new();
    body.insert("message".to_string(), Value::String(message.to_string()));
    client.post(&endpoint, &body).await
}

/// Mark every entry of a topic as read.
pub async fn mark_all_read(
    client: &CanvasClient,
    course_id: &str,
    topic_id: &str,
) -> Result<Value> {
    client
        .put(
            &format!("{}/read_all", topic_path(course_id, topic_id)),
            &Params::new(),
        )
        .await
}

fn topic_path(course_id: &str, topic_id: &str) -> String {
    format!(
        "/courses/{}/discussion_topics/{}",
        encode(course_id),
        encode(topic_id)
    )
}
