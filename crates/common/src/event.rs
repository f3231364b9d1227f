//! Event records written to session logs.
//!
//! One record is one JSON line: `{"event":"tool","tool":"Read","input_size":13,"ts":1718000000000}`.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Discriminated payload of a record; `event` carries the discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    /// A tool invocation observed by the host
    Tool { tool: String, input_size: usize },
    /// Token usage snapshot
    Tokens { input: u64, output: u64, total: u64 },
    /// Final token counts captured when the session stops
    SessionEnd {
        context_input: u64,
        context_output: u64,
    },
}

impl EventKind {
    pub fn tool(name: impl Into<String>, input_size: usize) -> Self {
        EventKind::Tool {
            tool: name.into(),
            input_size,
        }
    }

    pub fn tokens(usage: ContextUsage) -> Self {
        EventKind::Tokens {
            input: usage.input,
            output: usage.output,
            total: usage.total(),
        }
    }

    pub fn session_end(usage: ContextUsage) -> Self {
        EventKind::SessionEnd {
            context_input: usage.input,
            context_output: usage.output,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Tool { .. } => "tool",
            EventKind::Tokens { .. } => "tokens",
            EventKind::SessionEnd { .. } => "session_end",
        }
    }
}

/// A timestamped record. `ts` is assigned by the logger, never by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(flatten)]
    pub kind: EventKind,
    /// Milliseconds since the Unix epoch
    pub ts: i64,
}

impl EventRecord {
    pub fn now(kind: EventKind) -> Self {
        Self {
            kind,
            ts: Utc::now().timestamp_millis(),
        }
    }

    /// Serialized form without the trailing newline.
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind.name(), self.ts)
    }
}

/// Input/output token counts reported by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextUsage {
    pub input: u64,
    pub output: u64,
}

impl ContextUsage {
    pub fn new(input: u64, output: u64) -> Self {
        Self { input, output }
    }

    pub fn total(&self) -> u64 {
        self.input.saturating_add(self.output)
    }
}
