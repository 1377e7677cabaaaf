//! Cloud drive backend
//!
//! Talks to the Markwright drive REST API. Identities are opaque object
//! ids assigned by the server; overwriting a file replaces its content
//! while preserving the id. Parent resolution is a live round-trip on
//! every call — an object can be moved remotely between two calls, so the
//! answer is never cached here.
//!
//! Auth: `Authorization: Bearer {token}` on every request.
//! Listing: page-based (`page` + `per_page`), drained fully.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::StorageError;
use crate::storage::{
    filter_and_sort, Capabilities, DirectoryEntry, EntryId, ProviderKind, StorageProvider,
};

const PER_PAGE: u32 = 100;

/// Connection settings for the cloud drive.
pub struct CloudConfig {
    /// API base, e.g. `https://drive.example.com/api/v1`.
    pub base_url: String,
    /// Bearer credential attached to every request.
    pub api_token: SecretString,
    /// Drive root id, when known ahead of time. Resolved from the API
    /// otherwise.
    pub root_folder_id: Option<String>,
}

impl CloudConfig {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: SecretString::new(api_token.into()),
            root_folder_id: None,
        }
    }
}

// ─── API response types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EntryPayload {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: String, // "file" or "folder"
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    entries: Vec<EntryPayload>,
    #[serde(default)]
    last_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FilePayload {
    #[allow(dead_code)]
    id: String,
    #[allow(dead_code)]
    name: Option<String>,
    #[serde(default)]
    parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedPayload {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RootPayload {
    id: String,
}

// ─── Provider ────────────────────────────────────────────────────────────

/// Storage provider backed by the cloud drive API.
pub struct CloudProvider {
    config: CloudConfig,
    client: reqwest::Client,
}

impl CloudProvider {
    pub fn new(config: CloudConfig) -> Self {
        let mut default_headers = reqwest::header::HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .connect_timeout(std::time::Duration::from_secs(15))
            .default_headers(default_headers)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn token(&self) -> &str {
        self.config.api_token.expose_secret()
    }

    /// Fail unless the response is a success, mapping the status onto the
    /// error taxonomy.
    async fn check(resp: reqwest::Response, context: &str) -> Result<reqwest::Response, StorageError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(status_error(status, context, &body))
    }

    fn transport(context: &str, err: reqwest::Error) -> StorageError {
        StorageError::Io(format!("{context}: {err}"))
    }

    async fn fetch_entries(&self, folder: &EntryId) -> Result<Vec<DirectoryEntry>, StorageError> {
        let mut entries = Vec::new();
        let mut page = 1u32;

        loop {
            let url = format!(
                "{}?page={}&per_page={}",
                self.url(&format!("/folders/{}/entries", folder)),
                page,
                PER_PAGE
            );
            let resp = self
                .client
                .get(&url)
                .bearer_auth(self.token())
                .send()
                .await
                .map_err(|err| Self::transport("list folder", err))?;
            let resp = Self::check(resp, "list folder").await?;

            let parsed: ListResponse = resp
                .json()
                .await
                .map_err(|err| StorageError::Io(format!("parse folder listing: {err}")))?;

            entries.extend(parsed.entries.into_iter().map(|entry| DirectoryEntry {
                id: EntryId::new(entry.id),
                is_directory: entry.kind == "folder",
                name: entry.name,
            }));

            let last_page = parsed.last_page.unwrap_or(1);
            if page >= last_page {
                break;
            }
            page += 1;
        }

        Ok(entries)
    }
}

/// Map an HTTP status onto the storage error taxonomy. Credential
/// problems must stay distinguishable from plain I/O failures.
fn status_error(status: StatusCode, context: &str, body: &str) -> StorageError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StorageError::Auth(format!("{context} ({status})"))
        }
        StatusCode::NOT_FOUND => StorageError::NotFound(context.to_string()),
        _ => StorageError::Io(format!("{context} ({status}): {}", short_body(body))),
    }
}

/// Collapse an API error body into one short log-safe line.
fn short_body(body: &str) -> String {
    let line: String = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.len() > 200 {
        let mut end = 200;
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &line[..end])
    } else {
        line
    }
}

#[async_trait]
impl StorageProvider for CloudProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Cloud
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            read: true,
            write: true,
            create: true,
            create_folder: true,
            parent_lookup: true,
            root_folder: true,
            // Target selection for cloud saves goes through the app's own
            // picker, not a native dialog.
            open_dialog: false,
            save_dialog: false,
        }
    }

    async fn list_directory(&self, folder: &EntryId) -> Result<Vec<DirectoryEntry>, StorageError> {
        let entries = self.fetch_entries(folder).await?;
        Ok(filter_and_sort(entries))
    }

    async fn read_file(&self, id: &EntryId) -> Result<String, StorageError> {
        let resp = self
            .client
            .get(self.url(&format!("/files/{id}/content")))
            .bearer_auth(self.token())
            .send()
            .await
            .map_err(|err| Self::transport("download file", err))?;
        let resp = Self::check(resp, "download file").await?;

        resp.text()
            .await
            .map_err(|err| Self::transport("download file", err))
    }

    async fn write_file(&self, id: &EntryId, content: &str) -> Result<(), StorageError> {
        let resp = self
            .client
            .put(self.url(&format!("/files/{id}/content")))
            .bearer_auth(self.token())
            .header(CONTENT_TYPE, "text/markdown")
            .body(content.to_string())
            .send()
            .await
            .map_err(|err| Self::transport("upload file", err))?;
        Self::check(resp, "upload file").await?;

        tracing::info!("Uploaded file: {id}");
        Ok(())
    }

    async fn create_file(
        &self,
        parent: &EntryId,
        name: &str,
        content: &str,
    ) -> Result<EntryId, StorageError> {
        let resp = self
            .client
            .post(self.url(&format!("/folders/{parent}/files")))
            .bearer_auth(self.token())
            .json(&serde_json::json!({ "name": name, "content": content }))
            .send()
            .await
            .map_err(|err| Self::transport("create file", err))?;
        let resp = Self::check(resp, "create file").await?;

        let created: CreatedPayload = resp
            .json()
            .await
            .map_err(|err| StorageError::Io(format!("parse create response: {err}")))?;
        Ok(EntryId::new(created.id))
    }

    async fn create_folder(&self, parent: &EntryId, name: &str) -> Result<EntryId, StorageError> {
        let resp = self
            .client
            .post(self.url(&format!("/folders/{parent}/folders")))
            .bearer_auth(self.token())
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .map_err(|err| Self::transport("create folder", err))?;
        let resp = Self::check(resp, "create folder").await?;

        let created: CreatedPayload = resp
            .json()
            .await
            .map_err(|err| StorageError::Io(format!("parse create response: {err}")))?;
        Ok(EntryId::new(created.id))
    }

    async fn parent_folder(&self, id: &EntryId) -> Result<Option<EntryId>, StorageError> {
        let resp = self
            .client
            .get(self.url(&format!("/files/{id}")))
            .bearer_auth(self.token())
            .send()
            .await
            .map_err(|err| Self::transport("resolve parent", err))?;
        let resp = Self::check(resp, "resolve parent").await?;

        let meta: FilePayload = resp
            .json()
            .await
            .map_err(|err| StorageError::Io(format!("parse file metadata: {err}")))?;
        Ok(meta.parent_id.map(EntryId::new))
    }

    async fn root_folder(&self) -> Result<EntryId, StorageError> {
        if let Some(ref id) = self.config.root_folder_id {
            return Ok(EntryId::new(id.clone()));
        }

        let resp = self
            .client
            .get(self.url("/drive/root"))
            .bearer_auth(self.token())
            .send()
            .await
            .map_err(|err| Self::transport("resolve drive root", err))?;
        let resp = Self::check(resp, "resolve drive root").await?;

        let root: RootPayload = resp
            .json()
            .await
            .map_err(|err| StorageError::Io(format!("parse drive root: {err}")))?;
        Ok(EntryId::new(root.id))
    }
}
