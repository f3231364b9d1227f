//! Lifecycle hook handlers.
//!
//! Translates host payloads into journal records. Handlers return errors like
//! any other library call; the binary is responsible for discarding them and
//! acknowledging the host anyway.

use serde_json::{json, Value};
use tracing::debug;

use crate::errors::BenchlogResult;
use crate::event::{EventKind, EventRecord};
use crate::journal::SessionJournal;
use crate::payload::HookPayload;

/// Hook entry points exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    /// Tool use callbacks; also records token snapshots carried by the payload
    Tool,
    /// Stop callback
    SessionEnd,
}

impl HookKind {
    /// Body written to stdout once the hook finishes, whatever the outcome.
    pub fn acknowledgment(self) -> Value {
        match self {
            HookKind::Tool => json!({ "continue": true }),
            HookKind::SessionEnd => json!({}),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventLogger {
    journal: SessionJournal,
    default_session: String,
}

impl EventLogger {
    pub fn new(journal: SessionJournal, default_session: impl Into<String>) -> Self {
        Self {
            journal,
            default_session: default_session.into(),
        }
    }

    pub fn journal(&self) -> &SessionJournal {
        &self.journal
    }

    /// Parses raw stdin and dispatches it.
    pub fn handle_raw(&self, kind: HookKind, input: &str) -> BenchlogResult<Vec<EventRecord>> {
        let payload = HookPayload::parse(input)?;
        self.handle(kind, &payload)
    }

    pub fn handle(&self, kind: HookKind, payload: &HookPayload) -> BenchlogResult<Vec<EventRecord>> {
        match kind {
            HookKind::Tool => {
                let mut records = Vec::with_capacity(2);
                records.extend(self.handle_tool_invocation(payload)?);
                records.extend(self.handle_token_usage(payload)?);
                Ok(records)
            }
            HookKind::SessionEnd => Ok(self.handle_session_end(payload)?.into_iter().collect()),
        }
    }

    /// Records a `tool` event when the payload names a tool.
    pub fn handle_tool_invocation(&self, payload: &HookPayload) -> BenchlogResult<Option<EventRecord>> {
        let Some(tool) = payload.tool_name() else {
            return Ok(None);
        };
        let session = payload.session_id(&self.default_session);
        let kind = EventKind::tool(tool, payload.tool_input_size());
        self.journal.append(&session, kind).map(Some)
    }

    /// Records a `tokens` snapshot when the payload carries a context object.
    pub fn handle_token_usage(&self, payload: &HookPayload) -> BenchlogResult<Option<EventRecord>> {
        let Some(usage) = payload.context_usage() else {
            return Ok(None);
        };
        let session = payload.session_id(&self.default_session);
        self.journal.append(&session, EventKind::tokens(usage)).map(Some)
    }

    /// Closes out a session that already has a log. Sessions without one are
    /// left alone: no file is created for them.
    pub fn handle_session_end(&self, payload: &HookPayload) -> BenchlogResult<Option<EventRecord>> {
        let session = payload.session_id(&self.default_session);
        let usage = payload.context_usage_or_default();
        let record = self
            .journal
            .append_existing(&session, EventKind::session_end(usage))?;
        if record.is_none() {
            debug!(session = %session, "session end ignored");
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ContextUsage;
    use crate::session::SessionId;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn logger() -> (TempDir, EventLogger) {
        let dir = tempdir().unwrap();
        let logger = EventLogger::new(SessionJournal::new(dir.path().join("ck-benchmark")), "default");
        (dir, logger)
    }

    fn lines(logger: &EventLogger, session: &str) -> Vec<Value> {
        let path = logger.journal().path_for(&SessionId::from(session)).unwrap();
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn tool_payload_appends_one_tool_record() {
        let (_dir, logger) = logger();
        let records = logger
            .handle_raw(
                HookKind::Tool,
                r#"{"session_id":"s1","tool_name":"Read","tool_input":{"path":"/a"}}"#,
            )
            .unwrap();

        assert_eq!(records.len(), 1);
        let logged = lines(&logger, "s1");
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0]["event"], "tool");
        assert_eq!(logged[0]["tool"], "Read");
        assert_eq!(logged[0]["input_size"], r#"{"path":"/a"}"#.len());
        assert!(logged[0]["ts"].is_i64());
    }

    #[test]
    fn context_payload_appends_tokens_with_total() {
        let (_dir, logger) = logger();
        logger
            .handle_raw(
                HookKind::Tool,
                r#"{"session_id":"s1","context":{"input":100,"output":50}}"#,
            )
            .unwrap();

        let logged = lines(&logger, "s1");
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0]["event"], "tokens");
        assert_eq!(logged[0]["input"], 100);
        assert_eq!(logged[0]["output"], 50);
        assert_eq!(logged[0]["total"], 150);
    }

    #[test]
    fn tool_and_context_in_one_payload_log_tool_first() {
        let (_dir, logger) = logger();
        let records = logger
            .handle_raw(
                HookKind::Tool,
                r#"{"session_id":"s3","tool_name":"Bash","context":{"output":7}}"#,
            )
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, EventKind::tool("Bash", 2));
        assert_eq!(records[1].kind, EventKind::tokens(ContextUsage::new(0, 7)));
    }

    #[test]
    fn payload_without_tool_or_context_logs_nothing() {
        let (dir, logger) = logger();
        let records = logger.handle_raw(HookKind::Tool, r#"{"session_id":"s1"}"#).unwrap();
        assert!(records.is_empty());
        assert!(!dir.path().join("ck-benchmark/s1.jsonl").exists());
    }

    #[test]
    fn missing_session_goes_to_default_log() {
        let (_dir, logger) = logger();
        logger
            .handle_raw(HookKind::Tool, r#"{"tool_name":"Glob"}"#)
            .unwrap();
        assert_eq!(lines(&logger, "default").len(), 1);
    }

    #[test]
    fn session_end_without_log_is_a_silent_no_op() {
        let (dir, logger) = logger();
        let records = logger
            .handle_raw(HookKind::SessionEnd, r#"{"session_id":"s2"}"#)
            .unwrap();
        assert!(records.is_empty());
        assert!(!dir.path().join("ck-benchmark/s2.jsonl").exists());
    }

    #[test]
    fn session_end_appends_after_existing_lines() {
        let (_dir, logger) = logger();
        logger
            .handle_raw(HookKind::Tool, r#"{"session_id":"s1","tool_name":"Read"}"#)
            .unwrap();
        logger
            .handle_raw(HookKind::Tool, r#"{"session_id":"s1","tool_name":"Edit"}"#)
            .unwrap();
        let before = lines(&logger, "s1");

        logger
            .handle_raw(HookKind::SessionEnd, r#"{"session_id":"s1"}"#)
            .unwrap();

        let after = lines(&logger, "s1");
        assert_eq!(after.len(), 3);
        assert_eq!(&after[..2], &before[..]);
        assert_eq!(after[2]["event"], "session_end");
        assert_eq!(after[2]["context_input"], 0);
        assert_eq!(after[2]["context_output"], 0);
    }

    #[test]
    fn session_end_captures_context_counts() {
        let (_dir, logger) = logger();
        logger
            .handle_raw(HookKind::Tool, r#"{"session_id":"s4","tool_name":"Read"}"#)
            .unwrap();
        let records = logger
            .handle_raw(
                HookKind::SessionEnd,
                r#"{"session_id":"s4","context":{"input":1200,"output":300}}"#,
            )
            .unwrap();
        assert_eq!(
            records[0].kind,
            EventKind::session_end(ContextUsage::new(1200, 300))
        );
    }

    #[test]
    fn malformed_input_is_an_error_and_writes_nothing() {
        let (dir, logger) = logger();
        assert!(logger.handle_raw(HookKind::Tool, "").is_err());
        assert!(logger.handle_raw(HookKind::Tool, "{\"tool_name\":").is_err());
        assert!(!dir.path().join("ck-benchmark").exists());
    }

    #[test]
    fn array_payload_records_nothing() {
        let (dir, logger) = logger();
        let result = logger.handle_raw(HookKind::Tool, r#"["s1","Read",{"path":"/a"}]"#);
        assert_eq!(result.unwrap_err().error_code(), "E_INVALID_PAYLOAD");
        assert!(!dir.path().join("ck-benchmark/s1.jsonl").exists());
        assert!(!dir.path().join("ck-benchmark").exists());
    }

    #[test]
    fn acknowledgments_match_hook_kind() {
        assert_eq!(HookKind::Tool.acknowledgment().to_string(), r#"{"continue":true}"#);
        assert_eq!(HookKind::SessionEnd.acknowledgment().to_string(), "{}");
    }
}
