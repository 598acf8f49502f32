//! Module and module-item entities and operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use urlencoding::encode;

use crate::client::CanvasClient;
use crate::error::Result;
use crate::pagination::{fetch_listing, Fetch};
use crate::params::{include_query, nested_params, normalize_date_fields, Params};
use crate::resources::{from_records, from_value};

/// A course module: an ordered grouping of course content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<u64>,
    #[serde(default)]
    pub unlock_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub workflow_state: Option<String>,
    #[serde(default)]
    pub require_sequential_progress: Option<bool>,
    #[serde(default)]
    pub prerequisite_module_ids: Vec<u64>,
    #[serde(default)]
    pub items_count: Option<u64>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(flatten)]
    pub extra: Params,
}

/// An item inside a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleItem {
    pub id: u64,
    #[serde(default)]
    pub module_id: Option<u64>,
    #[serde(default)]
    pub position: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub indent: Option<u64>,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub content_id: Option<u64>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(flatten)]
    pub extra: Params,
}

/// Filters for listing modules.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleFilters {
    pub search_term: Option<String>,
    pub include: Vec<String>,
}

impl ModuleFilters {
    fn into_query(self) -> Params {
        let mut query = Params::new();
        if let Some(search_term) = self.search_term {
            query.insert("search_term".to_string(), Value::String(search_term));
        }
        query.append(&mut include_query(&self.include));
        query
    }
}

const DATE_FIELDS: &[(&str, &str)] = &[("unlockAt", "unlock_at")];

/// Create a module in a course.
pub async fn create(
    client: &CanvasClient,
    course_id: &str,
    name: &str,
    mut attrs: Params,
) -> Result<Module> {
    normalize_date_fields(&mut attrs, DATE_FIELDS);
    attrs.insert("name".to_string(), Value::String(name.to_string()));
    let body = nested_params("module", &attrs);

    let value = client
        .post(&format!("/courses/{}/modules", encode(course_id)), &body)
        .await?;
    from_value(value)
}

/// Get a single module.
pub async fn get(
    client: &CanvasClient,
    course_id: &str,
    module_id: &str,
    include: &[String],
) -> Result<Module> {
    let query = include_query(include);
    let value = client
        .get(&module_path(course_id, module_id), &query)
        .await?;
    from_value(value)
}

/// List the modules of a course.
pub async fn list(
    client: &CanvasClient,
    course_id: &str,
    filters: ModuleFilters,
    fetch: Fetch,
) -> Result<Vec<Module>> {
    let endpoint = format!("/courses/{}/modules", encode(course_id));
    let records = fetch_listing(client, &endpoint, filters.into_query(), fetch).await?;
    from_records(records)
}

/// Update a module.
pub async fn update(
    client: &CanvasClient,
    course_id: &str,
    module_id: &str,
    mut attrs: Params,
) -> Result<Module> {
    normalize_date_fields(&mut attrs, DATE_FIELDS);
    let body = nested_params("module", &attrs);

    let value = client.put(&module_path(course_id, module_id), &body).await?;
    from_value(value)
}

/// Delete a module.
pub async fn delete(client: &CanvasClient, course_id: &str, module_id: &str) -> Result<Value> {
    client
        .delete(&module_path(course_id, module_id), &Params::new())
        .await
}

/// List the items of a module.
pub async fn items(
    client: &CanvasClient,
    course_id: &str,
    module_id: &str,
    include: &[String],
    fetch: Fetch,
) -> Result<Vec<ModuleItem>> {
    let endpoint = format!("{}/items", module_path(course_id, module_id));
    let records = fetch_listing(client, &endpoint, include_query(include), fetch).await?;
    from_records(records)
}

/// Add an item to a module.
pub async fn create_item(
    client: &CanvasClient,
    course_id: &str,
    module_id: &str,
    item_type: &str,
    mut options: Params,
) -> Result<ModuleItem> {
    options.insert("type".to_string(), Value::String(item_type.to_string()));
    let body = nested_params("module_item", &options);

    let value = client
        .post(&format!("{}/items", module_path(course_id, module_id)), &body)
        .await?;
    from_value(value)
}

/// Mark a module item done for the calling user.
pub async fn mark_item_done(
    client: &CanvasClient,
    course_id: &str,
    module_id: &str,
    item_id: &str,
) -> Result<Value> {
    client
        .post(
            &format!(
                "{}/items/{}/mark_done",
                module_path(course_id, module_id),
                encode(item_id)
            ),
            &Params::new(),
        )
        .await
}

/// Publish a module.
pub async fn publish(client: &CanvasClient, course_id: &str, module_id: &str) -> Result<Module> {
    let mut body = Params::new();
    body.insert("module[published]".to_string(), Value::Bool(true));

    let value = client.put(&module_path(course_id, module_id), &body).await?;
    from_value(value)
}

fn module_path(course_id: &str, module_id: &str) -> String {
    format!(
        "/courses/{}/modules/{}",
        encode(course_id),
        encode(module_id)
    )
}
