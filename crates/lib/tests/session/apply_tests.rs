//! Apply mode: operations reach the real collaborators.

use std::io::Write;
use std::sync::Arc;

use provkit_lib::download::CacheDownloader;
use provkit_lib::pki::{self, PkiError, RcgenPki};
use provkit_lib::transcript::MemorySink;
use provkit_lib::{Collaborators, ExecuteError, Mode, Session, SessionOptions};

use super::common::{Harness, entry_count};

#[test]
fn file_operations_touch_disk_and_emit_nothing() {
  let h = Harness::new();
  let session = h.session(Mode::APPLY);
  let dir = h.root().join("app");

  session.mkdir_all(&dir).unwrap();
  session.create_file(&dir.join("empty")).unwrap();
  session.write_file(&dir.join("conf"), b"k=v\n").unwrap();
  session.append_to_file(&dir.join("conf"), b"x=y\n").unwrap();
  session.copy_file(&dir.join("conf"), &dir.join("conf.bak")).unwrap();
  session.rename_file(&dir.join("conf.bak"), &dir.join("conf.old")).unwrap();
  session.remove(&dir.join("empty")).unwrap();

  assert_eq!(std::fs::read_to_string(dir.join("conf")).unwrap(), "k=v\nx=y\n");
  assert_eq!(std::fs::read_to_string(dir.join("conf.old")).unwrap(), "k=v\nx=y\n");
  assert!(!dir.join("empty").exists());
  assert!(!dir.join("conf.bak").exists());
  assert!(h.transcript.is_empty());

  session.remove_all(&dir).unwrap();
  assert_eq!(entry_count(h.root()), 0);
}

#[test]
#[cfg(unix)]
fn write_with_mode_applies_permissions() {
  use std::os::unix::fs::PermissionsExt;

  let h = Harness::new();
  let session = h.session(Mode::APPLY);
  let key = h.root().join("keys/app.key");

  session.write_file_with_mode(&key, b"secret", 0o600).unwrap();

  let mode = std::fs::metadata(&key).unwrap().permissions().mode();
  assert_eq!(mode & 0o777, 0o600);
}

#[test]
#[cfg(unix)]
fn write_file_matches_its_transcript_on_existing_script() {
  use std::os::unix::fs::PermissionsExt;

  let h = Harness::new();
  let path = h.root().join("run.sh");
  std::fs::write(&path, b"#!/bin/sh\n").unwrap();
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

  h.session(Mode::SIMULATE).write_file(&path, b"echo hi").unwrap();
  let entries = h.transcript.entries();
  assert_eq!(entries.len(), 1);
  assert!(!entries[0].contains("chmod"), "got {}", entries[0]);

  h.session(Mode::APPLY).write_file(&path, b"echo hi").unwrap();

  let mode = std::fs::metadata(&path).unwrap().permissions().mode();
  assert_eq!(mode & 0o777, 0o755);
  assert_eq!(std::fs::read_to_string(&path).unwrap(), "echo hi");
}

#[test]
fn streamed_write_lands_on_disk() {
  let h = Harness::new();
  let session = h.session(Mode::APPLY);
  let path = h.root().join("out/stream.txt");

  let mut writer = session.open_file(&path).unwrap();
  writer.write_all(b"a").unwrap();
  writer.write_all(b"b").unwrap();
  writer.close().unwrap();
  writer.close().unwrap();

  assert_eq!(std::fs::read_to_string(&path).unwrap(), "ab");
  assert!(h.transcript.is_empty());
}

#[test]
fn filesystem_errors_pass_through() {
  let h = Harness::new();
  let session = h.session(Mode::APPLY);
  let missing = h.root().join("missing");

  let err = session.remove(&missing).unwrap_err();

  let ExecuteError::Fs(fs_err) = &err else {
    panic!("expected filesystem error, got {err:?}");
  };
  assert_eq!(fs_err.path, missing);
  assert_eq!(fs_err.source.kind(), std::io::ErrorKind::NotFound);
  assert_eq!(err.to_string(), fs_err.to_string());
}

#[test]
fn pki_is_delegated_with_sans() {
  let h = Harness::new();
  let session = h.session(Mode::APPLY);
  let path = h.root().join("pki");
  let sans = vec!["node-1".to_string(), "10.0.0.2".to_string()];

  session.generate_pki(&path, &sans).unwrap();

  assert_eq!(h.pki.calls(), vec![(path, sans)]);
  assert!(h.transcript.is_empty());
}

fn rcgen_session(h: &Harness, transcript: &MemorySink) -> Session {
  Session::with_collaborators(
    SessionOptions {
      workdir: h.root().join("work"),
      mode: Mode::APPLY,
    },
    Collaborators {
      config: Arc::new(h.options()),
      transcript: Arc::new(transcript.clone()),
      downloader: Arc::new(CacheDownloader::new()),
      pki: Arc::new(RcgenPki),
    },
  )
}

#[test]
fn real_pki_writes_bundle() {
  let h = Harness::new();
  let transcript = MemorySink::new();
  let session = rcgen_session(&h, &transcript);
  let path = h.root().join("pki");

  session.generate_pki(&path, &["kwok-controller".to_string()]).unwrap();

  for name in [pki::CA_CERT, pki::CA_KEY, pki::ADMIN_CERT, pki::ADMIN_KEY] {
    assert!(path.join(name).is_file(), "missing {name}");
  }
}

#[test]
fn invalid_san_error_is_returned_unchanged() {
  let h = Harness::new();
  let transcript = MemorySink::new();
  let session = rcgen_session(&h, &transcript);
  let path = h.root().join("pki");

  let err = session
    .generate_pki(&path, &["not\u{e9}valid".to_string()])
    .unwrap_err();

  assert!(matches!(err, ExecuteError::Pki(PkiError::Generate(_))), "got {err:?}");
  assert!(err.to_string().starts_with("failed to generate certificate"));
  assert!(transcript.is_empty(), "no transcript on failure");
  assert!(!path.exists(), "no partial bundle on failure");
}
