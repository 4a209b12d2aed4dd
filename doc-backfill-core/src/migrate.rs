//! Pagination driver: list → classify → submit, one page at a time.
//!
//! A run walks the key listing under a prefix and, for every page:
//!   - lists up to `page_size` keys, resuming from the current cursor
//!   - classifies each key with [`KeyClassifier`], dropping skips
//!   - submits the surviving documents as exactly one [`BackfillRequest`], even when empty
//!   - follows the listing's continuation token, or stops when the listing is exhausted
//!
//! # Responsibilities
//! - Strictly sequential: the next page is only listed after the current batch was submitted
//! - A listing failure always ends the run
//! - A submission failure ends the run under [`SubmitFailurePolicy::Abort`] and is
//!   recorded in the report under [`SubmitFailurePolicy::Continue`]
//! - Nothing is checkpointed; an aborted run reports the cursor of the failed page
//!   so an operator can resume with `start_token`
//!
//! # Navigation
//! - Main entrypoint: [`migrate`]
//! - Supporting types: [`MigrationReport`], [`FailedPage`], [`MigrateError`]

use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::classify::KeyClassifier;
use crate::config::{MigrateConfig, SubmitFailurePolicy, MAX_PAGE_SIZE};
use crate::contract::{
    BackfillRequest, BackfillSink, KeyLister, ListError, ListPageRequest, SubmitError,
};

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub run_id: Uuid,
    pub pages: usize,
    pub keys_seen: usize,
    pub keys_skipped: usize,
    pub documents_submitted: usize,
    /// Pages whose batch was rejected; only populated under [`SubmitFailurePolicy::Continue`].
    pub failed_pages: Vec<FailedPage>,
}

impl MigrationReport {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            pages: 0,
            keys_seen: 0,
            keys_skipped: 0,
            documents_submitted: 0,
            failed_pages: Vec::new(),
        }
    }
}

/// A page whose batch the backfill endpoint did not accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPage {
    /// 1-based page number within the run.
    pub page: usize,
    /// Token that lists this page again.
    pub continuation_token: Option<String>,
    pub documents: usize,
    pub error: String,
}

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("invalid migration config: {0}")]
    InvalidConfig(String),
    #[error("listing page {page} failed: {source}")]
    Listing {
        page: usize,
        #[source]
        source: ListError,
    },
    #[error("submitting page {page} failed (resume token: {resume_token:?}): {source}")]
    Submission {
        page: usize,
        resume_token: Option<String>,
        #[source]
        source: SubmitError,
    },
}

/// Classify one page of keys into a single backfill request, preserving key order.
pub fn classify_page(classifier: &KeyClassifier, keys: &[String]) -> BackfillRequest {
    BackfillRequest {
        documents: keys
            .iter()
            .filter_map(|key| classifier.classify(key).into_document())
            .collect(),
    }
}

/// Run a full migration over `config.prefix`.
///
/// Each run executes inside its own `migrate` span tagged with a fresh run id.
pub async fn migrate<L, S>(
    config: &MigrateConfig,
    classifier: &KeyClassifier,
    lister: &L,
    sink: &S,
) -> Result<MigrationReport, MigrateError>
where
    L: KeyLister + ?Sized,
    S: BackfillSink + ?Sized,
{
    if !(1..=MAX_PAGE_SIZE).contains(&config.page_size) {
        return Err(MigrateError::InvalidConfig(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
            config.page_size
        )));
    }

    let run_id = Uuid::new_v4();
    let span = info_span!("migrate", %run_id, bucket = %config.bucket, prefix = %config.prefix);
    run_pages(config, classifier, lister, sink, MigrationReport::new(run_id))
        .instrument(span)
        .await
}

async fn run_pages<L, S>(
    config: &MigrateConfig,
    classifier: &KeyClassifier,
    lister: &L,
    sink: &S,
    mut report: MigrationReport,
) -> Result<MigrationReport, MigrateError>
where
    L: KeyLister + ?Sized,
    S: BackfillSink + ?Sized,
{
    info!(resume_token = ?config.start_token, "Starting migration run");
    let mut cursor = config.start_token.clone();

    loop {
        let page_no = report.pages + 1;
        info!(page = page_no, "Retrieving page");

        let request = ListPageRequest {
            bucket: config.bucket.clone(),
            prefix: config.prefix.clone(),
            max_keys: config.page_size,
            continuation_token: cursor.clone(),
        };
        let page = match lister.list_page(request).await {
            Ok(page) => page,
            Err(source) => {
                error!(page = page_no, error = %source, "Failed to list objects");
                return Err(MigrateError::Listing {
                    page: page_no,
                    source,
                });
            }
        };
        report.pages = page_no;
        report.keys_seen += page.keys.len();

        let batch = classify_page(classifier, &page.keys);
        let skipped = page.keys.len() - batch.documents.len();
        report.keys_skipped += skipped;

        match sink.submit(&batch).await {
            Ok(()) => {
                report.documents_submitted += batch.documents.len();
                info!(
                    page = page_no,
                    keys = page.keys.len(),
                    documents = batch.documents.len(),
                    skipped,
                    "Processed key list successfully"
                );
            }
            Err(source) => match config.on_submit_failure {
                SubmitFailurePolicy::Abort => {
                    error!(page = page_no, keys = ?page.keys, error = %source, "Backfill failed, aborting run");
                    return Err(MigrateError::Submission {
                        page: page_no,
                        resume_token: cursor,
                        source,
                    });
                }
                SubmitFailurePolicy::Continue => {
                    warn!(page = page_no, keys = ?page.keys, error = %source, "Backfill failed, continuing with next page");
                    report.failed_pages.push(FailedPage {
                        page: page_no,
                        continuation_token: cursor.clone(),
                        documents: batch.documents.len(),
                        error: source.to_string(),
                    });
                }
            },
        }

        match page.next_cursor() {
            Some(next) => {
                info!(page = page_no, "More pages to fetch");
                cursor = Some(next.to_owned());
            }
            None => {
                info!(
                    pages = report.pages,
                    keys_seen = report.keys_seen,
                    documents_submitted = report.documents_submitted,
                    failed_pages = report.failed_pages.len(),
                    "All objects have been listed"
                );
                return Ok(report);
            }
        }
    }
}
