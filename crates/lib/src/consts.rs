/// Application name used for platform directories.
pub const APP_NAME: &str = "provkit";

/// Environment variable overriding the download cache directory.
pub const CACHE_DIR_ENV: &str = "PROVKIT_CACHE_DIR";

/// Permission bits for binaries installed by `ensure_binary`.
pub const BINARY_MODE: u32 = 0o750;

/// Permission bits for directories created by the filesystem collaborator.
pub const DIR_MODE: u32 = 0o750;

/// Permission bits for regular files written without an explicit mode.
pub const FILE_MODE: u32 = 0o640;

/// Permission bits for private key material.
pub const KEY_MODE: u32 = 0o600;

/// Subdirectory of the session working directory that receives binaries.
pub const BIN_DIR: &str = "bin";
