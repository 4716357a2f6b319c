//! Plans replayed through sessions.

use std::sync::Arc;

use provkit_lib::download::DownloadError;
use provkit_lib::{ExecuteError, Mode, Plan, PlanError};
use tracing_test::traced_test;

use super::common::{BrokenConfig, Harness, RecordingDownloader, entry_count};

fn plan_for(h: &Harness) -> Plan {
  let root = h.root().display().to_string();
  let json = serde_json::json!({
    "steps": [
      { "op": "mkdirAll", "path": format!("{root}/etc") },
      { "op": "writeFileWithMode", "path": format!("{root}/etc/token"), "content": "abc", "mode": "0600" },
      { "op": "streamToFile", "path": format!("{root}/etc/conf"), "chunks": ["a=1\n", "b=2"] },
      { "op": "ensureBinary", "name": "kwok", "source": "https://h/kwok.tgz#kwok" }
    ]
  });
  serde_json::from_value(json).unwrap()
}

#[tokio::test]
async fn simulated_plan_renders_every_step() {
  let h = Harness::new();
  let session = h.session(Mode::SIMULATE);
  let root = h.root().display().to_string();

  let report = plan_for(&h).run(&session).await.unwrap();

  assert_eq!(report.steps, 4);
  assert_eq!(report.binaries, vec![h.root().join("work/bin/kwok")]);
  assert_eq!(entry_count(h.root()), 0);

  let entries = h.transcript.entries();
  assert_eq!(entries.len(), 4);
  assert_eq!(entries[0], format!("mkdir -p {root}/etc"));
  assert_eq!(
    entries[1],
    format!("cat <<EOF >{root}/etc/token\nabc\nEOF\nchmod 0600 {root}/etc/token")
  );
  assert_eq!(entries[2], format!("cat <<EOF >{root}/etc/conf\na=1\nb=2\nEOF"));
  assert!(entries[3].contains("https://h/kwok.tgz"), "got {}", entries[3]);
}

#[tokio::test]
async fn applied_plan_provisions_files() {
  let h = Harness::new();
  let session = h.session(Mode::APPLY);

  let report = plan_for(&h).run(&session).await.unwrap();

  assert_eq!(report.steps, 4);
  assert_eq!(std::fs::read_to_string(h.root().join("etc/conf")).unwrap(), "a=1\nb=2");
  assert_eq!(std::fs::read_to_string(h.root().join("work/bin/kwok")).unwrap(), "downloaded");
  assert!(h.transcript.is_empty());
}

#[tokio::test]
#[traced_test]
async fn failing_step_stops_the_plan() {
  let h = Harness::with_downloader(RecordingDownloader::failing(404));
  let session = h.session(Mode::APPLY);
  let plan: Plan = serde_json::from_value(serde_json::json!({
    "steps": [
      { "op": "ensureBinary", "name": "etcd", "source": "https://h/etcd" },
      { "op": "mkdirAll", "path": h.root().join("never").display().to_string() }
    ]
  }))
  .unwrap();

  let err = plan.run(&session).await.unwrap_err();

  let PlanError::Step { index, op, source } = &err else {
    panic!("expected step error, got {err:?}");
  };
  assert_eq!(*index, 0);
  assert_eq!(*op, "ensureBinary");
  assert!(matches!(source, ExecuteError::Download(DownloadError::Http { status: 404, .. })));
  assert!(!h.root().join("never").exists());
  assert!(logs_contain("running plan"));
}

#[tokio::test]
async fn config_failure_surfaces_from_download_step() {
  let h = Harness::new();
  let session = h.session_with_config(Mode::SIMULATE, Arc::new(BrokenConfig));
  let plan: Plan = serde_json::from_value(serde_json::json!({
    "steps": [ { "op": "download", "source": "https://h/x", "dest": "/tmp/x" } ]
  }))
  .unwrap();

  let err = plan.run(&session).await.unwrap_err();

  assert_eq!(
    err.to_string(),
    "step 0 (download) failed: config unavailable: config store offline"
  );
  assert!(h.transcript.is_empty());
}

#[test]
fn load_reports_missing_file() {
  let h = Harness::new();
  let path = h.root().join("missing.json");

  let err = Plan::load(&path).unwrap_err();

  assert!(matches!(err, PlanError::Read { .. }), "got {err:?}");
}

#[test]
fn load_reports_malformed_json() {
  let h = Harness::new();
  let path = h.root().join("plan.json");
  std::fs::write(&path, "{ not json").unwrap();

  let err = Plan::load(&path).unwrap_err();

  assert!(matches!(err, PlanError::Parse { .. }), "got {err:?}");
}
