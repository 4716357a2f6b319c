//! Shell-vocabulary renderings of operations.
//!
//! Each operation kind has exactly one rendering here. Renderings carry every
//! parameter that changes the outcome of the real operation.
//!
//! File content is rendered as a heredoc when it is UTF-8. Other bytes go
//! through a `printf` line with octal escapes so no byte is lost.

use std::path::Path;

pub fn create_file(path: &Path) -> String {
  format!("touch {}", path.display())
}

pub fn copy_file(from: &Path, to: &Path) -> String {
  format!("cp {} {}", from.display(), to.display())
}

pub fn rename_file(from: &Path, to: &Path) -> String {
  format!("mv {} {}", from.display(), to.display())
}

pub fn append_to_file(path: &Path, content: &[u8]) -> String {
  redirect(">>", path, content)
}

pub fn remove(path: &Path) -> String {
  format!("rm {}", path.display())
}

pub fn remove_all(path: &Path) -> String {
  format!("rm -rf {}", path.display())
}

pub fn write_file(path: &Path, content: &[u8]) -> String {
  redirect(">", path, content)
}

/// Heredoc overwrite followed by `chmod` with a zero-prefixed octal mode.
pub fn write_file_with_mode(path: &Path, content: &[u8], mode: u32) -> String {
  format!("{}\n{}", write_file(path, content), chmod(path, mode))
}

pub fn chmod(path: &Path, mode: u32) -> String {
  format!("chmod 0{:03o} {}", mode & 0o7777, path.display())
}

pub fn mkdir_all(path: &Path) -> String {
  format!("mkdir -p {}", path.display())
}

pub fn download(source: &str, dest: &Path) -> String {
  format!("# Download {} to {}", source, dest.display())
}

pub fn download_and_extract(source: &str, member: &str, dest: &Path) -> String {
  format!("# Download {} and extract {} to {}", source, member, dest.display())
}

pub fn generate_pki(path: &Path) -> String {
  format!("# Generate PKI to {}", path.display())
}

fn redirect(op: &str, path: &Path, content: &[u8]) -> String {
  match std::str::from_utf8(content) {
    Ok(text) => format!("cat <<EOF {}{}\n{}\nEOF", op, path.display(), text),
    Err(_) => format!("printf '{}' {}{}", printf_escape(content), op, path.display()),
  }
}

/// Escape bytes for a single-quoted `printf` format string.
fn printf_escape(content: &[u8]) -> String {
  let mut out = String::with_capacity(content.len() * 2);
  for &byte in content {
    match byte {
      b'\\' => out.push_str("\\\\"),
      b'%' => out.push_str("%%"),
      b'\'' => out.push_str("\\047"),
      0x20..=0x7e => out.push(byte as char),
      _ => out.push_str(&format!("\\{:03o}", byte)),
    }
  }
  out
}
