//! Host platform detection and directory resolution.

pub mod os;
pub mod paths;

use os::Os;

/// Returns the executable suffix for the host (e.g. `.exe` on Windows).
///
/// Unsupported operating systems are treated like Unix and get no suffix.
pub fn binary_suffix() -> &'static str {
  Os::current().map(|os| os.binary_suffix()).unwrap_or("")
}
