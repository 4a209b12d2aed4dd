///
/// This module implements the CLI interface for doc-backfill: command parsing,
/// wiring the S3 lister and backfill client into the core pipeline, and
/// user-visible output.
///
/// All classification and pagination logic lives in [`doc-backfill-core`].
/// This module is strictly for CLI glue.
///
/// ## How To Use
/// - `doc-backfill migrate --config run.yaml --prefix seller/`
/// - `doc-backfill classify seller/42/kyc/GST/gst.pdf reports/soa/88/file.csv`
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`doc-backfill-core`]: ../../doc-backfill-core/
use crate::backfill::BackfillClient;
use crate::listing::S3KeyLister;
use crate::load_config::{load_config, RunOverrides};
use anyhow::Result;
use clap::{Parser, Subcommand};
use doc_backfill_core::classify::{Classification, KeyClassifier};
use doc_backfill_core::migrate::migrate;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;

/// CLI for doc-backfill: migrate legacy S3 keys into the seller document registry.
#[derive(Parser)]
#[clap(
    name = "doc-backfill",
    version,
    about = "Classify legacy S3 keys and backfill them into the seller document registry"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every key under a prefix, classify it and submit it page by page
    Migrate {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Key prefix to migrate (overrides BACKFILL_PREFIX and the config file)
        #[clap(long)]
        prefix: Option<String>,
        /// Continuation token reported by an aborted run, to resume from its failed page
        #[clap(long)]
        start_token: Option<String>,
        /// Record rejected batches and keep going instead of aborting the run
        #[clap(long)]
        continue_on_error: bool,
    },
    /// Classify keys offline and print one JSON line per key
    Classify {
        #[clap(required = true)]
        keys: Vec<String>,
    },
}

/// JSON line describing how a key was classified.
pub fn classification_line(key: &str, classification: &Classification) -> serde_json::Value {
    match classification {
        Classification::Document(doc) => json!(doc),
        Classification::Skip(reason) => json!({ "s3_key": key, "skipped": reason.to_string() }),
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Migrate {
            config,
            prefix,
            start_token,
            continue_on_error,
        } => {
            let config = load_config(config)?;
            let migrate_config = config.migrate_config(RunOverrides {
                prefix,
                start_token,
                continue_on_error,
            })?;
            migrate_config.trace_loaded();
            tracing::info!(command = "migrate", "Starting migration");

            let lister = S3KeyLister::connect(&config.storage).await;
            let sink = BackfillClient::new(
                &config.backfill.base_url,
                Duration::from_secs(config.backfill.timeout_secs),
            )
            .map_err(|e| anyhow::anyhow!("Failed to construct backfill client: {e}"))?;

            match migrate(&migrate_config, &KeyClassifier::default(), &lister, &sink).await {
                Ok(report) => {
                    tracing::info!(command = "migrate", ?report, "Migration complete");
                    println!("Migration complete.\nReport:");
                    println!("{:#?}", report);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "migrate", error = %e, "Migration failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
        Commands::Classify { keys } => {
            let classifier = KeyClassifier::default();
            for key in &keys {
                let line = classification_line(key, &classifier.classify(key));
                println!("{line}");
            }
            Ok(())
        }
    }
}
