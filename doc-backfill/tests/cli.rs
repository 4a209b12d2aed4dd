use assert_cmd::Command;
use predicates::prelude::*;
use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

use doc_backfill::{run, Cli, Commands};

fn doc_backfill() -> Command {
    let mut cmd = Command::cargo_bin("doc-backfill").expect("Binary exists");
    cmd.env_remove("BACKFILL_PREFIX")
        .env_remove("BACKFILL_BASE_URL");
    cmd
}

#[test]
fn classify_prints_one_json_line_per_key() {
    let assert = doc_backfill()
        .args(["classify", "seller/42/kyc/GST/gst.pdf", "tax/2023/a.pdf"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).expect("each line is JSON"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["user_id"], 42);
    assert_eq!(lines[0]["document_type"], "GST");
    assert_eq!(lines[0]["s3_key"], "seller/42/kyc/GST/gst.pdf");
    assert_eq!(lines[1]["s3_key"], "tax/2023/a.pdf");
    assert!(lines[1]["skipped"].as_str().unwrap().contains("excluded"));
}

#[test]
fn classify_requires_at_least_one_key() {
    doc_backfill()
        .arg("classify")
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEYS"));
}

#[test]
fn migrate_fails_on_missing_config() {
    doc_backfill()
        .args(["migrate", "--config", "does/not/exist.yaml", "--prefix", "seller/"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn migrate_without_prefix_is_refused() {
    let config = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(
        config.path(),
        "storage:\n  bucket: b\nbackfill:\n  base_url: http://127.0.0.1:1\n",
    )
    .unwrap();

    doc_backfill()
        .args(["migrate", "--config"])
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("prefix"));
}

/// Collects the debug rendering of every event emitted.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{event:?}"));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = Registry::default().with(EventCollector {
        events: events.clone(),
    });
    let _guard = tracing::subscriber::set_default(subscriber);

    let cli = Cli {
        command: Commands::Classify {
            keys: vec!["iocc/doc.pdf".into()],
        },
    };
    run(cli).await.expect("classify should succeed");

    let events = events.lock().unwrap();
    assert!(
        events.iter().any(|e| e.contains("trace_initialised")),
        "missing trace_initialised in {events:?}"
    );
}
