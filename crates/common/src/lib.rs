// # -----------------------------
// # crates/common/src/lib.rs
// # -----------------------------
//! Event logger shared by the `benchlog` hooks and reports.
//!
//! Hooks receive one JSON payload from the host and append structured records
//! to `<log_dir>/<session_id>.jsonl`, one line per event.

pub mod config;
pub mod errors;
pub mod event;
pub mod fs;
pub mod hooks;
pub mod journal;
pub mod payload;
pub mod session;
pub mod summary;

pub use config::{BenchlogConfig, ConfigOverrides};
pub use errors::{BenchlogError, BenchlogResult};
pub use event::{ContextUsage, EventKind, EventRecord};
pub use hooks::{EventLogger, HookKind};
pub use journal::SessionJournal;
pub use payload::HookPayload;
pub use session::SessionId;
