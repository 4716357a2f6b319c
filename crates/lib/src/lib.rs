//! provkit-lib: dual-mode provisioning operations
//!
//! This crate provides the operations a provisioning run performs and the
//! machinery to either apply them or simulate them as a shell transcript:
//! - `Session`: the mode flags and configuration of one run
//! - `Executor`: the apply/simulate strategies behind every operation
//! - `transcript`: shell-like renderings and where they are written
//! - `download`, `files`, `pki`: the real collaborators used in apply mode
//! - `Plan`: a JSON list of operations replayed through a session

pub mod config;
pub mod consts;
pub mod download;
pub mod execute;
pub mod files;
pub mod pki;
pub mod plan;
pub mod platform;
pub mod session;
pub mod transcript;

pub use config::{ConfigError, ConfigFile, ConfigOptions, ConfigProvider};
pub use execute::{ExecuteError, Executor, RealExecutor, SimulatingExecutor};
pub use plan::{Operation, Plan, PlanError, PlanReport};
pub use session::{Collaborators, Mode, Session, SessionOptions};
