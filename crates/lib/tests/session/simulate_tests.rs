//! Simulate mode: every operation renders a transcript and touches nothing.

use std::io::Write;
use std::path::Path;

use provkit_lib::Mode;
use provkit_lib::transcript::render;

use super::common::{BrokenConfig, Harness, entry_count};

#[tokio::test]
async fn full_operation_set_leaves_scratch_empty() {
  let h = Harness::new();
  let session = h.session(Mode::SIMULATE);
  let root = h.root().to_path_buf();
  let a = root.join("a");
  let b = root.join("b");

  session.mkdir_all(&root.join("dir/sub")).unwrap();
  session.create_file(&a).unwrap();
  session.write_file(&a, b"content").unwrap();
  session.write_file_with_mode(&a, b"secret", 0o600).unwrap();
  session.append_to_file(&a, b"more").unwrap();
  session.copy_file(&a, &b).unwrap();
  session.rename_file(&b, &root.join("c")).unwrap();
  session.remove(&a).unwrap();
  session.remove_all(&root.join("dir")).unwrap();
  let mut writer = session.open_file(&root.join("stream")).unwrap();
  writer.write_all(b"streamed").unwrap();
  writer.close().unwrap();
  session
    .download_with_cache(&root.join("cache"), "https://h/plain", &root.join("plain"), 0o750, true)
    .await
    .unwrap();
  session
    .download_with_cache(&root.join("cache"), "https://h/a.tgz#bin/tool", &root.join("tool"), 0o750, true)
    .await
    .unwrap();
  session.generate_pki(&root.join("pki"), &["node".to_string()]).unwrap();
  session.ensure_binary("etcd", "https://h/etcd").await.unwrap();

  assert_eq!(entry_count(&root), 0, "simulate mode must not touch the filesystem");
  assert!(h.downloader.calls().is_empty());
  assert!(h.pki.calls().is_empty());
  assert_eq!(h.transcript.entries().len(), 14);
}

#[test]
fn transcript_uses_shell_vocabulary() {
  let h = Harness::new();
  let session = h.session(Mode::SIMULATE);

  session.mkdir_all(Path::new("/opt/app")).unwrap();
  session.create_file(Path::new("/opt/app/log")).unwrap();
  session.copy_file(Path::new("/opt/app/a"), Path::new("/opt/app/b")).unwrap();
  session.rename_file(Path::new("/opt/app/b"), Path::new("/opt/app/c")).unwrap();
  session.append_to_file(Path::new("/opt/app/log"), b"line").unwrap();
  session.write_file(Path::new("/opt/app/conf"), b"k=v").unwrap();
  session
    .write_file_with_mode(Path::new("/opt/app/key"), b"s", 0o600)
    .unwrap();
  session.remove(Path::new("/opt/app/c")).unwrap();
  session.remove_all(Path::new("/opt/app")).unwrap();
  session.generate_pki(Path::new("/opt/pki"), &[]).unwrap();

  assert_eq!(
    h.transcript.entries(),
    vec![
      "mkdir -p /opt/app",
      "touch /opt/app/log",
      "cp /opt/app/a /opt/app/b",
      "mv /opt/app/b /opt/app/c",
      "cat <<EOF >>/opt/app/log\nline\nEOF",
      "cat <<EOF >/opt/app/conf\nk=v\nEOF",
      "cat <<EOF >/opt/app/key\ns\nEOF\nchmod 0600 /opt/app/key",
      "rm /opt/app/c",
      "rm -rf /opt/app",
      "# Generate PKI to /opt/pki",
    ]
  );
}

#[test]
fn identical_inputs_render_identically() {
  let first = Harness::new();
  let second = Harness::new();
  for h in [&first, &second] {
    let session = h.session(Mode::SIMULATE);
    session.write_file_with_mode(Path::new("/x"), b"payload", 0o640).unwrap();
    session.append_to_file(Path::new("/x"), b"tail").unwrap();
  }
  assert_eq!(first.transcript.entries(), second.transcript.entries());
}

#[test]
fn streamed_write_matches_single_write() {
  let h = Harness::new();
  let session = h.session(Mode::SIMULATE);

  let mut writer = session.open_file(Path::new("/tmp/x")).unwrap();
  writer.write_all(b"a").unwrap();
  writer.write_all(b"b").unwrap();
  writer.close().unwrap();
  writer.close().unwrap();
  drop(writer);
  session.write_file(Path::new("/tmp/x"), b"ab").unwrap();

  let entries = h.transcript.entries();
  assert_eq!(entries.len(), 2, "double close must emit once: {entries:?}");
  assert_eq!(entries[0], entries[1]);
  assert_eq!(entries[0], render::write_file(Path::new("/tmp/x"), b"ab"));
}

#[tokio::test]
async fn simulated_downloads_render_source_and_member() {
  let h = Harness::new();
  let session = h.session(Mode::SIMULATE);

  session
    .download_with_cache(Path::new("/cache"), "http://h/plain", Path::new("/w/plain"), 0o750, false)
    .await
    .unwrap();
  session
    .download_with_cache(Path::new("/cache"), "http://h/a.tgz#bin/tool", Path::new("/w/tool"), 0o750, false)
    .await
    .unwrap();

  assert_eq!(
    h.transcript.entries(),
    vec![
      "# Download http://h/plain to /w/plain",
      "# Download http://h/a.tgz and extract bin/tool to /w/tool",
    ]
  );
}

#[tokio::test]
async fn ensure_binary_returns_path_without_file() {
  let h = Harness::new();
  let session = h.session(Mode::SIMULATE);

  let path = session.ensure_binary("kwok", "https://h/kwok").await.unwrap();

  assert_eq!(path, h.root().join("work/bin/kwok"));
  assert!(!path.exists());
  assert_eq!(
    h.transcript.entries(),
    vec![format!("# Download https://h/kwok to {}", path.display())]
  );
}

#[tokio::test]
async fn config_failure_is_fatal_even_when_simulating() {
  let h = Harness::new();
  let session = h.session_with_config(Mode::SIMULATE, std::sync::Arc::new(BrokenConfig));

  let err = session.ensure_binary("etcd", "https://h/etcd").await.unwrap_err();

  assert_eq!(err.to_string(), "config unavailable: config store offline");
  assert!(h.transcript.is_empty());
}
