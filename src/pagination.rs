//! Link-header pagination for Canvas API responses.
//!
//! Canvas paginates list endpoints with RFC-5988 `Link` response headers;
//! the `next` relation carries a fully-qualified URL that already encodes
//! all query state. The driver here follows that chain sequentially and
//! concatenates page records in server order.

use std::collections::HashMap;

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{CanvasClient, RequestTarget};
use crate::error::{CanvasError, Result};
use crate::params::Params;

/// Default page size requested when the caller did not set one.
pub const DEFAULT_PER_PAGE: u64 = 100;

/// Defensive cap on pages followed per listing. The server's `next` chain
/// is finite by contract; hitting this cap is reported as an error rather
/// than looping forever.
const MAX_PAGES: u32 = 1000;

/// Parse an RFC-5988-style `Link` header into a relation → URL map.
///
/// Each comma-separated segment must look like `<URL>; rel="TOKEN"`
/// (whitespace-tolerant); segments that don't match are skipped. A repeated
/// relation keeps the last occurrence.
pub fn parse_link_header(header: &str) -> HashMap<String, String> {
    let mut links = HashMap::new();
    if header.is_empty() {
        return links;
    }

    for part in header.split(',') {
        let part = part.trim();
        let Some(url_end) = part.find('>') else {
            continue;
        };
        if !part.starts_with('<') {
            continue;
        }
        let url = &part[1..url_end];

        let rest = &part[url_end + 1..];
        let Some(rel_start) = rest.find("rel=\"") else {
            continue;
        };
        let rel = &rest[rel_start + 5..];
        let Some(rel_end) = rel.find('"') else {
            continue;
        };

        links.insert(rel[..rel_end].to_string(), url.to_string());
    }

    links
}

fn next_link(headers: &HeaderMap) -> Option<String> {
    let header = headers.get("link")?.to_str().ok()?;
    parse_link_header(header).remove("next")
}

/// A page body resolved once at the fetch boundary: either a record list
/// or a single record. Canvas list endpoints normally return arrays, but
/// some actions hand back one object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageBody {
    Records(Vec<Value>),
    Single(Value),
}

impl From<Value> for PageBody {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(records) => PageBody::Records(records),
            other => PageBody::Single(other),
        }
    }
}

impl PageBody {
    /// Flatten into an ordered record list.
    pub fn into_records(self) -> Vec<Value> {
        match self {
            PageBody::Records(records) => records,
            PageBody::Single(record) => vec![record],
        }
    }

    /// Number of records in this page.
    pub fn len(&self) -> usize {
        match self {
            PageBody::Records(records) => records.len(),
            PageBody::Single(_) => 1,
        }
    }

    /// Returns true if this page carries no records.
    pub fn is_empty(&self) -> bool {
        matches!(self, PageBody::Records(records) if records.is_empty())
    }
}

/// How many records a listing should fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    /// Follow the `next` chain until exhausted.
    All,
    /// One request with `per_page` set to the limit.
    Limit(u64),
}

/// Fetch every page of a listing and return the concatenated records.
///
/// `per_page` defaults to 100 when the query does not set it. Follow-up
/// pages are requested at the exact `next` URL with an empty query, since
/// that URL already encodes the pagination state.
///
/// # Errors
///
/// Returns an error if any page request fails, or if the `next` chain
/// exceeds the defensive page cap.
pub async fn fetch_all_items(
    client: &CanvasClient,
    method: Method,
    endpoint: &str,
    body: &Params,
    query: &Params,
) -> Result<Vec<Value>> {
    let mut query = query.clone();
    query
        .entry("per_page".to_string())
        .or_insert_with(|| Value::from(DEFAULT_PER_PAGE));

    let (value, headers) = client
        .request_with_headers(method.clone(), RequestTarget::Endpoint(endpoint), body, &query)
        .await?;

    let mut records = PageBody::from(value).into_records();
    let mut next = next_link(&headers);
    let mut pages = 1u32;

    while let Some(url) = next {
        if pages >= MAX_PAGES {
            return Err(CanvasError::PageLimitExceeded { pages: MAX_PAGES });
        }

        let (value, headers) = client
            .request_with_headers(
                method.clone(),
                RequestTarget::Url(&url),
                body,
                &Params::new(),
            )
            .await?;

        records.extend(PageBody::from(value).into_records());
        next = next_link(&headers);
        pages += 1;
    }

    Ok(records)
}

/// Fetch a GET listing honoring the caller's return-all/limit choice.
pub async fn fetch_listing(
    client: &CanvasClient,
    endpoint: &str,
    query: Params,
    fetch: Fetch,
) -> Result<Vec<Value>> {
    match fetch {
        Fetch::All => fetch_all_items(client, Method::GET, endpoint, &Params::new(), &query).await,
        Fetch::Limit(limit) => {
            let mut query = query;
            query.insert("per_page".to_string(), Value::from(limit));
            let value = client.get(endpoint, &query).await?;
            Ok(PageBody::from(value).into_records())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_link_header_multiple_relations() {
        let header = "<https://canvas.instructure.com/api/v1/courses?page=2>; rel=\"next\", <https://canvas.instructure.com/api/v1/courses?page=5>; rel=\"last\"";
        let links = parse_link_header(header);
        assert_eq!(links.len(), 2);
        assert_eq!(
            links["next"],
            "https://canvas.instructure.com/api/v1/courses?page=2"
        );
        assert_eq!(
            links["last"],
            "https://canvas.instructure.com/api/v1/courses?page=5"
        );
    }

    #[test]
    fn test_parse_link_header_empty() {
        assert!(parse_link_header("").is_empty());
    }

    #[test]
    fn test_parse_link_header_single() {
        let links =
            parse_link_header("<https://canvas.instructure.com/api/v1/courses?page=2>; rel=\"next\"");
        assert_eq!(
            links["next"],
            "https://canvas.instructure.com/api/v1/courses?page=2"
        );
    }

    #[test]
    fn test_parse_link_header_skips_malformed_segments() {
        let header = "garbage, <https://x/next>; rel=\"next\", <no-rel>";
        let links = parse_link_header(header);
        assert_eq!(links.len(), 1);
        assert_eq!(links["next"], "https://x/next");
    }

    #[test]
    fn test_parse_link_header_whitespace_tolerant() {
        let links = parse_link_header("  <https://x/a>;   rel=\"prev\" ");
        assert_eq!(links["prev"], "https://x/a");
    }

    #[test]
    fn test_parse_link_header_duplicate_relation_last_wins() {
        let links = parse_link_header("<https://x/1>; rel=\"next\", <https://x/2>; rel=\"next\"");
        assert_eq!(links["next"], "https://x/2");
    }

    #[test]
    fn test_page_body_resolution() {
        let list = PageBody::from(json!([{"id": 1}, {"id": 2}]));
        assert_eq!(list.len(), 2);
        assert_eq!(list.into_records(), vec![json!({"id": 1}), json!({"id": 2})]);

        let single = PageBody::from(json!({"id": 3}));
        assert_eq!(single.len(), 1);
        assert!(!single.is_empty());
        assert_eq!(single.into_records(), vec![json!({"id": 3})]);

        assert!(PageBody::from(json!([])).is_empty());
    }
}
