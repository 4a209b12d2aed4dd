//! # S3 key listing
//!
//! [`KeyLister`] backed by `ListObjectsV2`. Each call maps to exactly one
//! request; the driver owns the continuation token between calls.

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use aws_sdk_s3::Client;
use doc_backfill_core::contract::{KeyLister, KeyPage, ListError, ListPageRequest};

use crate::load_config::StorageSection;

pub struct S3KeyLister {
    client: Client,
}

impl S3KeyLister {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the storage section, falling back to the default
    /// AWS credential and region chain for anything left unset.
    pub async fn connect(storage: &StorageSection) -> Self {
        // The driver owns failure policy; the SDK must not retry on its own.
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).retry_config(RetryConfig::disabled());

        if let Some(region) = &storage.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &storage.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let (Some(access_key), Some(secret_key)) = (&storage.access_key, &storage.secret_key) {
            let credentials = aws_sdk_s3::config::Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "doc-backfill",
            );
            loader = loader.credentials_provider(credentials);
        }

        let sdk_config = loader.load().await;
        let builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        // Custom endpoints (LocalStack, test servers) need path-style URLs.
        let s3_config = if storage.endpoint.is_some() {
            builder.force_path_style(true).build()
        } else {
            builder.build()
        };

        tracing::info!(
            bucket = %storage.bucket,
            region = ?storage.region,
            endpoint = ?storage.endpoint,
            "Initialized S3 client"
        );
        Self::new(Client::from_conf(s3_config))
    }
}

/// Convert a `ListObjectsV2` response into a [`KeyPage`], keeping key order.
pub fn key_page_from_output(output: &ListObjectsV2Output) -> KeyPage {
    KeyPage {
        keys: output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_owned))
            .collect(),
        is_truncated: output.is_truncated().unwrap_or(false),
        next_continuation_token: output.next_continuation_token().map(str::to_owned),
    }
}

#[async_trait]
impl KeyLister for S3KeyLister {
    async fn list_page(&self, request: ListPageRequest) -> Result<KeyPage, ListError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&request.bucket)
            .prefix(&request.prefix)
            .max_keys(request.max_keys)
            .set_continuation_token(request.continuation_token.clone())
            .send()
            .await
            .map_err(|e| {
                let err = ListError::new(&request, DisplayErrorContext(&e));
                tracing::error!(error = %err, "Failed to list objects");
                err
            })?;

        let page = key_page_from_output(&output);
        tracing::debug!(
            bucket = %request.bucket,
            prefix = %request.prefix,
            keys = page.keys.len(),
            truncated = page.is_truncated,
            "Listed page"
        );
        Ok(page)
    }
}
