//! Request handling at the boundary
//!
//! Turns HTTP-shaped requests for the tree and file resources into `DriveApi`
//! calls, and results into framed responses. Success bodies carry the
//! configured anti-script-inclusion prefix; errors are plain text whose
//! detail depends on `server.debug`.

use crate::api::{DriveApi, OwnerScope};
use crate::config::ServerConfig;
use crate::error::{ApiError, ErrorKind};
use crate::types::{BlobId, OwnerId};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Tree,
    File,
}

/// An inbound request, already routed to a resource
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub resource: Resource,
    /// Owner segment of the request target
    pub owner: String,
    pub query: HashMap<String, String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: Method, resource: Resource, owner: impl Into<String>) -> Self {
        Self {
            method,
            resource,
            owner: owner.into(),
            query: HashMap::new(),
            content_type: None,
            body: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.insert(key.to_string(), value.into());
        self
    }

    /// Attach a JSON body with the matching content type
    pub fn with_json(mut self, body: &serde_json::Value) -> Self {
        self.content_type = Some("application/json; charset=utf-8".to_string());
        self.body = body.to_string().into_bytes();
        self
    }

    fn query(&self, key: &str) -> &str {
        self.query.get(key).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct TextPayload {
    #[serde(rename = "#text", default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewFilePayload {
    content: String,
    #[serde(rename = "#text", default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentPayload {
    content: String,
}

pub struct DriveHandler {
    api: Arc<DriveApi>,
    server: ServerConfig,
}

impl DriveHandler {
    pub fn new(api: Arc<DriveApi>, server: ServerConfig) -> Self {
        Self { api, server }
    }

    /// Handle one request on behalf of `caller`
    pub fn handle(&self, caller: &OwnerId, request: &Request) -> Response {
        match self.dispatch(caller, request) {
            Ok(body) => Response {
                status: 200,
                content_type: "application/json",
                headers: Vec::new(),
                body: format!("{}{}", self.server.xssi_prefix, body),
            },
            Err(err) => self.error_response(request, &err),
        }
    }

    fn dispatch(&self, caller: &OwnerId, request: &Request) -> Result<String, ApiError> {
        let scope = self.api.authorize(caller, &request.owner)?;
        if matches!(request.method, Method::Post | Method::Put) {
            check_json_content_type(request)?;
        }

        match (request.resource, request.method) {
            (Resource::Tree, Method::Get) => self.api.fetch_tree_document(&scope),
            (Resource::Tree, Method::Post) => {
                let payload: TextPayload = decode_body(request)?;
                let created = self
                    .api
                    .create_folder(&scope, request.query("path"), payload.text)?;
                encode(&created)
            }
            (Resource::Tree, Method::Put) => {
                let payload: TextPayload = decode_body(request)?;
                self.api
                    .update_text(&scope, request.query("path"), payload.text)?;
                Ok(json!({}).to_string())
            }
            (Resource::Tree, Method::Delete) => {
                self.api.delete_entry(&scope, request.query("path"))?;
                Ok(json!({}).to_string())
            }
            (Resource::File, Method::Get) => {
                let id = file_id(request)?;
                let content = self.api.fetch_file(&scope, id)?;
                Ok(json!({ "content": content }).to_string())
            }
            (Resource::File, Method::Post) => {
                let payload: NewFilePayload = decode_body(request)?;
                let created = self.api.create_file(
                    &scope,
                    request.query("path"),
                    payload.content,
                    payload.text,
                )?;
                encode(&created)
            }
            (Resource::File, Method::Put) => self.update_file(&scope, request),
            (Resource::File, Method::Delete) => Err(ApiError::NotImplemented(
                "files are deleted through their tree entry".to_string(),
            )),
        }
    }

    fn update_file(&self, scope: &OwnerScope, request: &Request) -> Result<String, ApiError> {
        let payload: ContentPayload = decode_body(request)?;
        let id = file_id(request)?;
        self.api.update_file(scope, id, payload.content)?;
        Ok(json!({}).to_string())
    }

    fn error_response(&self, request: &Request, err: &ApiError) -> Response {
        let kind = err.kind();
        if kind == ErrorKind::Internal {
            error!(owner = %request.owner, resource = ?request.resource, method = ?request.method, "Request failed: {}", err);
        } else {
            debug!(owner = %request.owner, resource = ?request.resource, method = ?request.method, "Request rejected: {}", err);
        }

        let mut headers = Vec::new();
        if let ApiError::RootNotAllowed { allow } = err {
            headers.push(("Allow", allow.to_string()));
        }
        let body = if self.server.debug {
            format!("HTTP ERROR : STATUS {} : {}", kind.status_code(), err)
        } else {
            "Error".to_string()
        };
        Response {
            status: kind.status_code(),
            content_type: "text/plain",
            headers,
            body,
        }
    }
}

fn check_json_content_type(request: &Request) -> Result<(), ApiError> {
    match &request.content_type {
        Some(content_type) if content_type.contains("application/json") => Ok(()),
        other => Err(ApiError::UnsupportedContentType(other.clone())),
    }
}

fn decode_body<T: DeserializeOwned>(request: &Request) -> Result<T, ApiError> {
    serde_json::from_slice(&request.body).map_err(|e| ApiError::InvalidPayload(e.to_string()))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::Internal(format!("encode failed: {}", e)))
}

/// Blob id from the `id` query parameter; a missing id resolves to nothing
fn file_id(request: &Request) -> Result<BlobId, ApiError> {
    match request.query.get("id").map(|id| id.trim()) {
        None | Some("") => Err(ApiError::NotFound("file id missing".to_string())),
        Some(raw) => raw
            .parse::<u64>()
            .map(BlobId)
            .map_err(|_| ApiError::InvalidPayload(format!("invalid file id {:?}", raw))),
    }
}
