#![doc = "doc-backfill-core: key classification and paginated backfill submission."]

//! This crate holds the decision logic of the document backfill: turning legacy
//! storage keys into registry documents and driving a listing through the
//! backfill endpoint page by page.
//! Network adapters (S3, HTTP) live in the `doc-backfill` binary crate.
//!
//! # Usage
//! Build a [`classify::KeyClassifier`], provide a [`contract::KeyLister`] and a
//! [`contract::BackfillSink`], then call [`migrate::migrate`].

pub mod classify;
pub mod config;
pub mod contract;
pub mod migrate;
