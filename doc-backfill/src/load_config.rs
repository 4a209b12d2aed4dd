/// `load_config` module: loads the static YAML run configuration and applies environment overrides.
///
/// This is the only place where the YAML file is parsed and mapped onto the core
/// [`MigrateConfig`] plus the connection settings of the two network adapters.
///
/// # Responsibilities
/// - Parse the YAML file into typed sections (`storage`, `backfill`, `migration`)
/// - Apply `BACKFILL_PREFIX` and `BACKFILL_BASE_URL` from the environment
/// - Validate what the adapters cannot recover from (empty bucket, empty base URL, page size)
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
///
/// Example file:
///
/// ```yaml
/// storage:
///   bucket: legacy-seller-docs
///   region: us-west-2
/// backfill:
///   base_url: http://localhost:8080
/// migration:
///   prefix: search_insights/
///   page_size: 20
///   on_submit_failure: abort
/// ```
use anyhow::{bail, Result};
use doc_backfill_core::config::{
    MigrateConfig, SubmitFailurePolicy, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const PREFIX_ENV: &str = "BACKFILL_PREFIX";
pub const BASE_URL_ENV: &str = "BACKFILL_BASE_URL";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
pub struct CliConfig {
    pub storage: StorageSection,
    pub backfill: BackfillSection,
    #[serde(default)]
    pub migration: MigrationSection,
}

/// Where the legacy keys live.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    pub bucket: String,
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint, e.g. LocalStack. Switches the client to path-style addressing.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackfillSection {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MigrationSection {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: i32,
    #[serde(default)]
    pub on_submit_failure: SubmitFailurePolicy,
}

impl Default for MigrationSection {
    fn default() -> Self {
        Self {
            prefix: None,
            page_size: DEFAULT_PAGE_SIZE,
            on_submit_failure: SubmitFailurePolicy::default(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_page_size() -> i32 {
    DEFAULT_PAGE_SIZE
}

/// Run-time overrides given on the command line.
#[derive(Debug, Default)]
pub struct RunOverrides {
    pub prefix: Option<String>,
    pub start_token: Option<String>,
    pub continue_on_error: bool,
}

impl CliConfig {
    /// Build the core run configuration. The prefix is taken from the command
    /// line, then the environment/file, and must be present in one of them.
    pub fn migrate_config(&self, overrides: RunOverrides) -> Result<MigrateConfig> {
        let prefix = match overrides.prefix.or_else(|| self.migration.prefix.clone()) {
            Some(prefix) => prefix,
            None => {
                error!("No key prefix configured");
                bail!(
                    "No key prefix given: pass --prefix, set {PREFIX_ENV}, or set migration.prefix"
                );
            }
        };

        let on_submit_failure = if overrides.continue_on_error {
            SubmitFailurePolicy::Continue
        } else {
            self.migration.on_submit_failure
        };

        Ok(MigrateConfig {
            bucket: self.storage.bucket.clone(),
            prefix,
            page_size: self.migration.page_size,
            on_submit_failure,
            start_token: overrides.start_token,
        })
    }
}

/// Loads the YAML config file and applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let Ok(prefix) = std::env::var(PREFIX_ENV) {
        info!(prefix = %prefix, "Using key prefix from {PREFIX_ENV}");
        config.migration.prefix = Some(prefix);
    }
    if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
        info!(base_url = %base_url, "Using backfill base URL from {BASE_URL_ENV}");
        config.backfill.base_url = base_url;
    }

    validate(&config)?;

    info!(
        bucket = %config.storage.bucket,
        base_url = %config.backfill.base_url,
        page_size = config.migration.page_size,
        "Config loaded and merged successfully"
    );
    Ok(config)
}

fn validate(config: &CliConfig) -> Result<()> {
    if config.storage.bucket.trim().is_empty() {
        error!("storage.bucket is empty");
        bail!("storage.bucket must not be empty");
    }
    if config.backfill.base_url.trim().is_empty() {
        error!("backfill.base_url is empty");
        bail!("backfill.base_url must not be empty");
    }
    let page_size = config.migration.page_size;
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        error!(page_size, "migration.page_size out of range");
        bail!("migration.page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}");
    }
    Ok(())
}
