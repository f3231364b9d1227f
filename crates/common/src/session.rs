use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{BenchlogError, BenchlogResult};

pub const LOG_EXTENSION: &str = "jsonl";

/// Opaque session key. Only used to name the session's log file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<id>.jsonl`, provided the id stays inside the log directory.
    pub fn file_name(&self) -> BenchlogResult<String> {
        let id = self.0.as_str();
        let escapes = id.is_empty()
            || id == "."
            || id == ".."
            || id.contains(['/', '\\', '\0']);
        if escapes {
            return Err(BenchlogError::InvalidSessionId {
                session_id: self.0.clone(),
            });
        }
        Ok(format!("{id}.{LOG_EXTENSION}"))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
