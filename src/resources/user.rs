//! User entity and operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use urlencoding::encode;

use crate::client::CanvasClient;
use crate::error::Result;
use crate::pagination::{fetch_listing, Fetch};
use crate::params::{include_query, nested_params, Params};
use crate::resources::course::Course;
use crate::resources::enrollment::Enrollment;
use crate::resources::{from_records, from_value};

/// A Canvas user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sortable_name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub login_id: Option<String>,
    #[serde(default)]
    pub sis_user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Params,
}

/// Filters for listing account users.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserFilters {
    pub search_term: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub include: Vec<String>,
}

impl UserFilters {
    fn into_query(self) -> Params {
        let mut query = Params::new();
        if let Some(search_term) = self.search_term {
            query.insert("search_term".to_string(), Value::String(search_term));
        }
        if let Some(sort) = self.sort {
            query.insert("sort".to_string(), Value::String(sort));
        }
        if let Some(order) = self.order {
            query.insert("order".to_string(), Value::String(order));
        }
        query.append(&mut include_query(&self.include));
        query
    }
}

/// Filters for listing a user's enrollments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserEnrollmentFilters {
    #[serde(rename = "type")]
    pub enrollment_type: Option<String>,
    pub state: Option<String>,
}

impl UserEnrollmentFilters {
    fn into_query(self) -> Params {
        let mut query = Params::new();
        if let Some(enrollment_type) = self.enrollment_type {
            query.insert("type".to_string(), Value::String(enrollment_type));
        }
        if let Some(state) = self.state {
            query.insert("state".to_string(), Value::String(state));
        }
        query
    }
}

/// Filters for listing a user's courses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserCourseFilters {
    pub enrollment_state: Option<String>,
    pub include: Vec<String>,
}

impl UserCourseFilters {
    fn into_query(self) -> Params {
        let mut query = Params::new();
        if let Some(enrollment_state) = self.enrollment_state {
            query.insert(
                "enrollment_state".to_string(),
                Value::String(enrollment_state),
            );
        }
        query.append(&mut include_query(&self.include));
        query
    }
}

/// Create a user under an account.
///
/// Login-related attributes (`password`, `sisUserId`) go into the
/// `pseudonym` parameter group; everything else is a `user` attribute.
pub async fn create(
    client: &CanvasClient,
    account_id: &str,
    name: &str,
    email: &str,
    mut attrs: Params,
) -> Result<User> {
    attrs.insert("name".to_string(), Value::String(name.to_string()));

    let mut pseudonym = Params::new();
    pseudonym.insert("unique_id".to_string(), Value::String(email.to_string()));
    if let Some(password) = attrs.remove("password") {
        pseudonym.insert("password".to_string(), password);
    }
    if let Some(sis_user_id) = attrs.remove("sisUserId") {
        pseudonym.insert("sis_user_id".to_string(), sis_user_id);
    }

    let mut body = nested_params("user", &attrs);
    body.append(&mut nested_params("pseudonym", &pseudonym));

    let value = client
        .post(&format!("/accounts/{}/users", encode(account_id)), &body)
        .await?;
    from_value(value)
}

/// Get a single user.
pub async fn get(client: &CanvasClient, user_id: &str, include: &[String]) -> Result<User> {
    let query = include_query(include);
    let value = client
        .get(&format!("/users/{}", encode(user_id)), &query)
        .await?;
    from_value(value)
}

/// List the users of an account.
pub async fn list(
    client: &CanvasClient,
    account_id: &str,
    filters: UserFilters,
    fetch: Fetch,
) -> Result<Vec<User>> {
    let endpoint = format!("/accounts/{}/users", encode(account_id));
    let records = fetch_listing(client, &endpoint, filters.into_query(), fetch).await?;
    from_records(records)
}

/// Update a user.
pub async fn update(client: &CanvasClient, user_id: &str, attrs: Params) -> Result<User> {
    let body = nested_params("user", &attrs);
    let value = client
        .put(&format!("/users/{}", encode(user_id)), &body)
        .await?;
    from_value(value)
}

/// Delete a user from an account.
pub async fn delete(client: &CanvasClient, account_id: &str, user_id: &str) -> Result<Value> {
    client
        .delete(
            &format!("/accounts/{}/users/{}", encode(account_id), encode(user_id)),
            &Params::new(),
        )
        .await
}

/// List a user's enrollments.
pub async fn enrollments(
    client: &CanvasClient,
    user_id: &str,
    filters: UserEnrollmentFilters,
    fetch: Fetch,
) -> Result<Vec<Enrollment>> {
    let endpoint = format!("/users/{}/enrollments", encode(user_id));
    let records = fetch_listing(client, &endpoint, filters.into_query(), fetch).await?;
    from_records(records)
}

/// List a user's courses.
pub async fn courses(
    client: &CanvasClient,
    user_id: &str,
    filters: UserCourseFilters,
    fetch: Fetch,
) -> Result<Vec<Course>> {
    let endpoint = format!("/users/{}/courses", encode(user_id));
    let records = fetch_listing(client, &endpoint, filters.into_query(), fetch).await?;
    from_records(records)
}

/// Get a user's profile.
pub async fn profile(client: &CanvasClient, user_id: &str) -> Result<Value> {
    client
        .get(&format!("/users/{}/profile", encode(user_id)), &Params::new())
        .await
}

/// Apply a previously uploaded avatar to a user.
pub async fn update_avatar(
    client: &CanvasClient,
    user_id: &str,
    avatar_token: &str,
) -> Result<User> {
    let mut body = Params::new();
    body.insert(
        "user[avatar][token]".to_string(),
        Value::String(avatar_token.to_string()),
    );
    let value = client
        .put(&format!("/users/{}", encode(user_id)), &body)
        .await?;
    from_value(value)
}

/// Read a user's custom data under a scope.
pub async fn custom_data(client: &CanvasClient, user_id: &str, scope: &str) -> Result<Value> {
    client
        .get(
            &format!("/users/{}/custom_data/{}", encode(user_id), scope),
            &Params::new(),
        )
        .await
}
