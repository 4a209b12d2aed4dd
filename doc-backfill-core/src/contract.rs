//! # contract: seams between the migration pipeline and the outside world
//!
//! This module defines the two traits the pipeline talks to and the plain data
//! that crosses them:
//! - [`KeyLister`]: one page of an object-storage key listing per call.
//! - [`BackfillSink`]: one backfill request per call.
//!
//! Production implementations (S3 and the HTTP backfill client) live in the CLI
//! crate. Both traits are annotated for `mockall` so the pipeline can be driven
//! deterministically in tests.
//!
//! The wire shape of a backfill request is owned here through serde attributes:
//!
//! ```json
//! { "document_list": [ { "user_id": 42, "document_type": "GST", "s3_key": "seller/42/..." } ] }
//! ```

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A classified storage object, ready for the document registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub seller_id: Option<i64>,
    pub document_type: String,
    /// The verbatim key that produced this document.
    #[serde(rename = "s3_key")]
    pub storage_key: String,
}

impl Document {
    /// A document with no owner identifiers.
    pub fn new(document_type: impl Into<String>, storage_key: impl Into<String>) -> Self {
        Self {
            user_id: None,
            seller_id: None,
            document_type: document_type.into(),
            storage_key: storage_key.into(),
        }
    }
}

/// Body of one backfill call: every document classified from one listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillRequest {
    #[serde(rename = "document_list")]
    pub documents: Vec<Document>,
}

/// Request for a single page of keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPageRequest {
    pub bucket: String,
    pub prefix: String,
    /// Upper bound on the number of keys returned.
    pub max_keys: i32,
    /// Cursor from the previous page; `None` starts at the beginning of the prefix.
    pub continuation_token: Option<String>,
}

/// One page of a key listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPage {
    pub keys: Vec<String>,
    pub is_truncated: bool,
    pub next_continuation_token: Option<String>,
}

impl KeyPage {
    /// The cursor for the next page, if the listing says there is one.
    ///
    /// A truncated page without a token is treated as the last page.
    pub fn next_cursor(&self) -> Option<&str> {
        if self.is_truncated {
            self.next_continuation_token.as_deref()
        } else {
            None
        }
    }
}

/// Failure reported by a [`KeyLister`].
#[derive(Debug, Error)]
#[error("listing s3://{bucket}/{prefix} failed: {message}")]
pub struct ListError {
    pub bucket: String,
    pub prefix: String,
    pub message: String,
}

impl ListError {
    pub fn new(request: &ListPageRequest, message: impl std::fmt::Display) -> Self {
        Self {
            bucket: request.bucket.clone(),
            prefix: request.prefix.clone(),
            message: message.to_string(),
        }
    }
}

/// Failure reported by a [`BackfillSink`].
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("backfill request could not be sent: {0}")]
    Transport(String),
    #[error("backfill rejected with HTTP status {code}: {body}")]
    Status { code: u16, body: String },
    #[error("backfill request could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Paged listing of object-storage keys.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait KeyLister: Send + Sync {
    /// Fetch one page of keys under `request.prefix`, resuming at the request's cursor.
    async fn list_page(&self, request: ListPageRequest) -> Result<KeyPage, ListError>;
}

/// Destination for classified documents.
///
/// One call delivers one batch in a single network request. Implementors must
/// not retry internally; the caller decides what a failure means for the run.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait BackfillSink: Send + Sync {
    async fn submit(&self, request: &BackfillRequest) -> Result<(), SubmitError>;
}
