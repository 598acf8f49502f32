//! File and folder entities and operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use urlencoding::encode;

use crate::client::CanvasClient;
use crate::error::Result;
use crate::pagination::{fetch_listing, Fetch};
use crate::params::Params;
use crate::resources::{from_records, from_value};
use crate::upload::{upload_file, FileUpload};

/// A file stored in Canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasFile {
    pub id: u64,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub folder_id: Option<u64>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(rename = "content-type", default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(default)]
    pub hidden: Option<bool>,
    #[serde(flatten)]
    pub extra: Params,
}

/// A folder in the Canvas file hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub parent_folder_id: Option<u64>,
    #[serde(default)]
    pub context_id: Option<u64>,
    #[serde(default)]
    pub context_type: Option<String>,
    #[serde(default)]
    pub files_count: Option<u64>,
    #[serde(default)]
    pub folders_count: Option<u64>,
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(default)]
    pub hidden: Option<bool>,
    #[serde(flatten)]
    pub extra: Params,
}

/// The container whose files or folders are being addressed.
#[derive(Debug, Clone)]
pub enum FileContext {
    Course(String),
    Group(String),
    User(String),
    Folder(String),
}

impl FileContext {
    fn files_endpoint(&self) -> String {
        match self {
            FileContext::Course(id) => format!("/courses/{}/files", encode(id)),
            FileContext::Group(id) => format!("/groups/{}/files", encode(id)),
            FileContext::User(id) => format!("/users/{}/files", encode(id)),
            FileContext::Folder(id) => format!("/folders/{}/files", encode(id)),
        }
    }

    fn folders_endpoint(&self) -> String {
        match self {
            FileContext::Course(id) => format!("/courses/{}/folders", encode(id)),
            FileContext::Group(id) => format!("/groups/{}/folders", encode(id)),
            FileContext::User(id) => format!("/users/{}/folders", encode(id)),
            FileContext::Folder(id) => format!("/folders/{}/folders", encode(id)),
        }
    }
}

/// Get a single file by id.
pub async fn get(client: &CanvasClient, file_id: &str) -> Result<CanvasFile> {
    let value = client.get(&file_path(file_id), &Params::new()).await?;
    from_value(value)
}

/// List the files of a context.
pub async fn list(
    client: &CanvasClient,
    context: &FileContext,
    search_term: Option<&str>,
    fetch: Fetch,
) -> Result<Vec<CanvasFile>> {
    let mut query = Params::new();
    if let Some(search_term) = search_term {
        query.insert(
            "search_term".to_string(),
            Value::String(search_term.to_string()),
        );
    }

    let records = fetch_listing(client, &context.files_endpoint(), query, fetch).await?;
    from_records(records)
}

/// Update a file's attributes (name, lock state, parent folder).
pub async fn update(client: &CanvasClient, file_id: &str, attrs: Params) -> Result<CanvasFile> {
    let value = client.put(&file_path(file_id), &attrs).await?;
    from_value(value)
}

/// Delete a file.
pub async fn delete(client: &CanvasClient, file_id: &str) -> Result<Value> {
    client.delete(&file_path(file_id), &Params::new()).await
}

/// Resolve a file's download URL and filename.
pub async fn download(client: &CanvasClient, file_id: &str) -> Result<Value> {
    let value = client.get(&file_path(file_id), &Params::new()).await?;
    let file: CanvasFile = from_value(value)?;
    Ok(json!({
        "url": file.url,
        "filename": file.filename,
    }))
}

/// Upload a file into a context.
pub async fn upload(
    client: &CanvasClient,
    context: &FileContext,
    file: FileUpload,
) -> Result<Value> {
    upload_file(client, &context.files_endpoint(), file).await
}

/// List the folders of a context.
pub async fn folders(
    client: &CanvasClient,
    context: &FileContext,
    fetch: Fetch,
) -> Result<Vec<Folder>> {
    let records =
        fetch_listing(client, &context.folders_endpoint(), Params::new(), fetch).await?;
    from_records(records)
}

/// Create a folder inside a context.
pub async fn create_folder(
    client: &CanvasClient,
    context: &FileContext,
    name: &str,
    parent_folder_id: Option<&str>,
) -> Result<Folder> {
    let mut body = Params::new();
    body.insert("name".to_string(), Value::String(name.to_string()));
    if let Some(parent) = parent_folder_id {
        body.insert(
            "parent_folder_id".to_string(),
            Value::String(parent.to_string()),
        );
    }

    let value = client.post(&context.folders_endpoint(), &body).await?;
    from_value(value)
}

fn file_path(file_id: &str) -> String {
    format!("/files/{}", encode(file_id))
}
