//! Canvas file upload protocol.
//!
//! Uploads are a three-step handshake:
//! 1. POST the file metadata to a Canvas endpoint, which answers with a
//!    pre-signed storage URL and the form fields it requires.
//! 2. POST a multipart body (the pre-signed fields plus the file payload)
//!    to that URL. The URL carries its own authorization; no bearer token.
//! 3. If the transfer response carries a `location` pointer, GET it with
//!    the bearer token to confirm; its body is the final file metadata.
//!
//! Failures at every step are normalized into [`CanvasError::Api`] the same
//! way ordinary API calls are.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::client::CanvasClient;
use crate::error::{CanvasError, Result};
use crate::params::Params;

/// A file payload plus the negotiation parameters Canvas accepts
/// (`parent_folder_id`, `on_duplicate`, ...).
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
    pub additional_params: Params,
}

impl FileUpload {
    /// Create an upload with no extra negotiation parameters.
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
            additional_params: Params::new(),
        }
    }
}

/// Run the upload handshake against a Canvas upload endpoint
/// (e.g. `/courses/{id}/files`) and return the confirmed file metadata.
///
/// # Errors
///
/// Returns an error if any step fails, or if the negotiation response is
/// missing its upload target.
#[tracing::instrument(skip(client, upload), fields(file_name = %upload.file_name, size = upload.data.len()))]
pub async fn upload_file(
    client: &CanvasClient,
    endpoint: &str,
    upload: FileUpload,
) -> Result<Value> {
    // Step 1: negotiate the upload target.
    let mut request = Params::new();
    request.insert("name".to_string(), Value::String(upload.file_name.clone()));
    request.insert("size".to_string(), Value::from(upload.data.len() as u64));
    request.insert(
        "content_type".to_string(),
        Value::String(upload.content_type.clone()),
    );
    for (key, value) in &upload.additional_params {
        request.insert(key.clone(), value.clone());
    }

    let negotiation = client.post(endpoint, &request).await?;

    let upload_url = negotiation
        .get("upload_url")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            CanvasError::UploadNegotiation("response did not contain an upload_url".to_string())
        })?;
    let upload_params = negotiation
        .get("upload_params")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            CanvasError::UploadNegotiation("response did not contain upload_params".to_string())
        })?;

    // Step 2: transfer the bytes to the pre-signed URL.
    let mut form = Form::new();
    for (key, value) in upload_params {
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        form = form.text(key.clone(), text);
    }
    let part = Part::bytes(upload.data.to_vec())
        .file_name(upload.file_name.clone())
        .mime_str(&upload.content_type)
        .map_err(CanvasError::Http)?;
    form = form.part("file", part);

    let response = client
        .http()
        .post(upload_url)
        .multipart(form)
        .send()
        .await
        .map_err(CanvasError::Http)?;
    if !response.status().is_success() {
        return Err(CanvasClient::normalize_failure(response).await);
    }
    let transfer: Value = match response.text().await.map_err(CanvasError::Http)? {
        body if body.is_empty() => Value::Null,
        body => serde_json::from_str(&body)?,
    };

    // Step 3: follow the confirmation pointer when present.
    if let Some(location) = transfer.get("location").and_then(Value::as_str) {
        return client.get_url(location).await;
    }

    Ok(transfer)
}
