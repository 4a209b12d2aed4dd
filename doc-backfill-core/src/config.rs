use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Keys requested per listing page, and therefore the largest possible batch.
pub const DEFAULT_PAGE_SIZE: i32 = 20;
/// S3 never returns more than this many keys per page.
pub const MAX_PAGE_SIZE: i32 = 1000;

/// What a run does when the backfill endpoint rejects a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitFailurePolicy {
    /// Stop the run; no further pages are listed.
    #[default]
    Abort,
    /// Record the failed page and move on to the next one.
    Continue,
}

/// Parameters for one migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateConfig {
    pub bucket: String,
    pub prefix: String,
    pub page_size: i32,
    pub on_submit_failure: SubmitFailurePolicy,
    /// Continuation token captured from an earlier run, to resume mid-listing.
    pub start_token: Option<String>,
}

impl MigrateConfig {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            page_size: DEFAULT_PAGE_SIZE,
            on_submit_failure: SubmitFailurePolicy::default(),
            start_token: None,
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            bucket = %self.bucket,
            prefix = %self.prefix,
            page_size = self.page_size,
            on_submit_failure = ?self.on_submit_failure,
            resuming = self.start_token.is_some(),
            "Loaded MigrateConfig"
        );
        debug!(?self, "MigrateConfig loaded (full debug)");
    }
}
