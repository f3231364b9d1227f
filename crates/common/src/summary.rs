//! Session summaries and run-group statistics for benchmark reports.

use std::collections::BTreeMap;
use std::fs;

use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::{BenchlogError, BenchlogResult};
use crate::event::{EventKind, EventRecord};
use crate::journal::SessionJournal;
use crate::session::SessionId;

/// Suffix of the files listing the sessions of a run group.
pub const GROUP_FILE_SUFFIX: &str = "-sessions.txt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub tool_count: usize,
    pub tool_breakdown: BTreeMap<String, usize>,
    pub duration_ms: u64,
    pub tokens_input: u64,
    pub tokens_output: u64,
    pub tokens_total: u64,
}

impl SessionSummary {
    /// Duration spans the first and last record in file order. Token figures
    /// come from the last `session_end` record, else the last `tokens` one.
    pub fn from_records(session: &SessionId, records: &[EventRecord]) -> Self {
        let mut tool_breakdown = BTreeMap::new();
        let mut last_tokens = None;
        let mut last_end = None;

        for record in records {
            match &record.kind {
                EventKind::Tool { tool, .. } => {
                    *tool_breakdown.entry(tool.clone()).or_insert(0) += 1;
                }
                EventKind::Tokens { input, output, .. } => last_tokens = Some((*input, *output)),
                EventKind::SessionEnd {
                    context_input,
                    context_output,
                } => last_end = Some((*context_input, *context_output)),
            }
        }

        let duration_ms = match (records.first(), records.last()) {
            (Some(first), Some(last)) => u64::try_from(last.ts.saturating_sub(first.ts)).unwrap_or(0),
            _ => 0,
        };
        let (tokens_input, tokens_output) = last_end.or(last_tokens).unwrap_or((0, 0));

        Self {
            session_id: session.to_string(),
            tool_count: tool_breakdown.values().sum(),
            tool_breakdown,
            duration_ms,
            tokens_input,
            tokens_output,
            tokens_total: tokens_input.saturating_add(tokens_output),
        }
    }
}

/// avg / sample standard deviation / min / max of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Stats {
    pub avg: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let avg = values.iter().sum::<f64>() / n;
        let std = if values.len() > 1 {
            let var = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (n - 1.0);
            var.sqrt()
        } else {
            0.0
        };
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self { avg, std, min, max }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunGroup {
    pub name: String,
    pub runs: Vec<SessionSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupStats {
    pub tokens: Stats,
    pub duration_ms: Stats,
    pub tools: Stats,
}

impl RunGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runs: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn stats(&self) -> GroupStats {
        let series = |f: fn(&SessionSummary) -> f64| self.runs.iter().map(f).collect::<Vec<_>>();
        GroupStats {
            tokens: Stats::of(&series(|r| r.tokens_total as f64)),
            duration_ms: Stats::of(&series(|r| r.duration_ms as f64)),
            tools: Stats::of(&series(|r| r.tool_count as f64)),
        }
    }
}

/// Relative difference of one metric between two groups, in percent of `b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricDiff {
    pub a: f64,
    pub b: f64,
    pub diff_pct: f64,
}

impl MetricDiff {
    fn between(a: f64, b: f64) -> Self {
        let diff_pct = if b == 0.0 { 0.0 } else { (a - b) / b * 100.0 };
        Self { a, b, diff_pct }
    }

    /// Lower is better for every compared metric.
    pub fn favors_a(&self) -> bool {
        self.diff_pct < 0.0
    }
}

/// Averages of two groups side by side. Group `b` is the baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub a: String,
    pub b: String,
    pub tokens: MetricDiff,
    pub duration_ms: MetricDiff,
    pub tools: MetricDiff,
    pub a_wins: usize,
    pub b_wins: usize,
    pub winner: String,
}

impl Comparison {
    pub const METRICS: usize = 3;

    pub fn between(a: &RunGroup, b: &RunGroup) -> Self {
        let (sa, sb) = (a.stats(), b.stats());
        let tokens = MetricDiff::between(sa.tokens.avg, sb.tokens.avg);
        let duration_ms = MetricDiff::between(sa.duration_ms.avg, sb.duration_ms.avg);
        let tools = MetricDiff::between(sa.tools.avg, sb.tools.avg);

        let a_wins = [tokens, duration_ms, tools]
            .iter()
            .filter(|metric| metric.favors_a())
            .count();
        let b_wins = Self::METRICS - a_wins;
        let winner = if a_wins > b_wins { &a.name } else { &b.name };

        Self {
            a: a.name.clone(),
            b: b.name.clone(),
            tokens,
            duration_ms,
            tools,
            a_wins,
            b_wins,
            winner: winner.clone(),
        }
    }

    /// Only two non-empty groups can be compared.
    pub fn of_groups(groups: &[RunGroup]) -> Option<Self> {
        match groups {
            [a, b] if !a.is_empty() && !b.is_empty() => Some(Self::between(a, b)),
            _ => None,
        }
    }
}

/// Summary of one session, `None` when its log is missing or holds no records.
pub fn summarize_session(
    journal: &SessionJournal,
    session: &SessionId,
) -> BenchlogResult<Option<SessionSummary>> {
    if !journal.exists(session) {
        return Ok(None);
    }
    let records = journal.read(session)?;
    if records.is_empty() {
        debug!(session = %session, "log has no records");
        return Ok(None);
    }
    Ok(Some(SessionSummary::from_records(session, &records)))
}

/// Builds a group out of explicit session ids, skipping those without data.
pub fn collect_group(
    journal: &SessionJournal,
    name: &str,
    sessions: &[SessionId],
) -> BenchlogResult<RunGroup> {
    let mut group = RunGroup::new(name);
    for session in sessions {
        match summarize_session(journal, session) {
            Ok(Some(summary)) => group.runs.push(summary),
            Ok(None) => warn!(group = name, session = %session, "no log data for session"),
            Err(BenchlogError::InvalidSessionId { session_id }) => {
                warn!(group = name, session = %session_id, "invalid session id skipped")
            }
            Err(err) => return Err(err),
        }
    }
    Ok(group)
}

/// Loads the group listed in `<log_dir>/<name>-sessions.txt`, one id per line.
pub fn load_group(journal: &SessionJournal, name: &str) -> BenchlogResult<RunGroup> {
    let path = journal.dir().join(format!("{name}{GROUP_FILE_SUFFIX}"));
    let listing = match fs::read_to_string(&path) {
        Ok(listing) => listing,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(group = name, path = %path.display(), "session list not found");
            return Ok(RunGroup::new(name));
        }
        Err(source) => return Err(BenchlogError::ReadFailed { path, source }),
    };

    let sessions: Vec<SessionId> = listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(SessionId::from)
        .collect();
    collect_group(journal, name, &sessions)
}

/// Every session log in the directory as a single group.
pub fn load_all(journal: &SessionJournal, name: &str) -> BenchlogResult<RunGroup> {
    let sessions = journal.sessions()?;
    collect_group(journal, name, &sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ContextUsage;
    use tempfile::tempdir;

    fn rec(kind: EventKind, ts: i64) -> EventRecord {
        EventRecord { kind, ts }
    }

    #[test]
    fn summary_counts_tools_and_spans_timestamps() {
        let records = vec![
            rec(EventKind::tool("Read", 10), 1_000),
            rec(EventKind::tool("Edit", 40), 1_500),
            rec(EventKind::tool("Read", 12), 2_000),
            rec(EventKind::tokens(ContextUsage::new(100, 50)), 2_100),
            rec(EventKind::tokens(ContextUsage::new(400, 90)), 3_250),
        ];
        let summary = SessionSummary::from_records(&"s1".into(), &records);

        assert_eq!(summary.tool_count, 3);
        assert_eq!(summary.tool_breakdown["Read"], 2);
        assert_eq!(summary.tool_breakdown["Edit"], 1);
        assert_eq!(summary.duration_ms, 2_250);
        assert_eq!(
            (summary.tokens_input, summary.tokens_output, summary.tokens_total),
            (400, 90, 490)
        );
    }

    #[test]
    fn session_end_counts_take_priority() {
        let records = vec![
            rec(EventKind::tokens(ContextUsage::new(1, 1)), 0),
            rec(EventKind::session_end(ContextUsage::new(900, 100)), 10),
        ];
        let summary = SessionSummary::from_records(&"s".into(), &records);
        assert_eq!(summary.tokens_total, 1_000);
    }

    #[test]
    fn empty_records_summarize_to_zero() {
        let summary = SessionSummary::from_records(&"s".into(), &[]);
        assert_eq!(summary.tool_count, 0);
        assert_eq!(summary.duration_ms, 0);
        assert_eq!(summary.tokens_total, 0);
    }

    #[test]
    fn out_of_order_timestamps_clamp_to_zero() {
        let records = vec![
            rec(EventKind::tool("Read", 2), 500),
            rec(EventKind::tool("Read", 2), 100),
        ];
        assert_eq!(SessionSummary::from_records(&"s".into(), &records).duration_ms, 0);
    }

    #[test]
    fn stats_use_sample_deviation() {
        let stats = Stats::of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.avg, 5.0);
        assert!((stats.std - 2.138_089_935).abs() < 1e-6);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);

        assert_eq!(Stats::of(&[3.0]).std, 0.0);
        assert_eq!(Stats::of(&[]), Stats::default());
    }

    #[test]
    fn group_file_lists_sessions_and_skips_missing_ones() {
        let dir = tempdir().unwrap();
        let journal = SessionJournal::new(dir.path());
        journal.append(&"a".into(), EventKind::tool("Read", 2)).unwrap();
        journal.append(&"b".into(), EventKind::tool("Bash", 2)).unwrap();
        fs::write(dir.path().join("skill-sessions.txt"), "a\n\n  b  \nghost\n").unwrap();

        let group = load_group(&journal, "skill").unwrap();
        let ids: Vec<_> = group.runs.iter().map(|r| r.session_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn missing_group_file_is_an_empty_group() {
        let dir = tempdir().unwrap();
        let group = load_group(&SessionJournal::new(dir.path()), "cmd").unwrap();
        assert!(group.is_empty());
        assert_eq!(group.name, "cmd");
    }

    #[test]
    fn load_all_covers_every_log() {
        let dir = tempdir().unwrap();
        let journal = SessionJournal::new(dir.path());
        for id in ["z", "m", "a"] {
            journal.append(&id.into(), EventKind::tool("Read", 2)).unwrap();
        }
        fs::write(dir.path().join("empty.jsonl"), "").unwrap();

        let group = load_all(&journal, "all").unwrap();
        let ids: Vec<_> = group.runs.iter().map(|r| r.session_id.as_str()).collect();
        assert_eq!(ids, ["a", "m", "z"]);
    }

    #[test]
    fn group_stats_follow_runs() {
        let mut group = RunGroup::new("g");
        for (tokens, tools) in [(100, 2), (300, 4)] {
            let mut summary = SessionSummary::from_records(&"s".into(), &[]);
            summary.tokens_total = tokens;
            summary.tool_count = tools;
            group.runs.push(summary);
        }
        let stats = group.stats();
        assert_eq!(stats.tokens.avg, 200.0);
        assert_eq!(stats.tools.max, 4.0);
        assert_eq!(stats.duration_ms.avg, 0.0);
    }
    fn sized_group(name: &str, runs: &[(u64, u64, usize)]) -> RunGroup {
        let mut group = RunGroup::new(name);
        for (tokens, duration_ms, tools) in runs {
            let mut summary = SessionSummary::from_records(&"s".into(), &[]);
            summary.tokens_total = *tokens;
            summary.duration_ms = *duration_ms;
            summary.tool_count = *tools;
            group.runs.push(summary);
        }
        group
    }

    #[test]
    fn comparison_uses_second_group_as_baseline() {
        let skill = sized_group("skill", &[(900, 2_000, 4), (1_100, 4_000, 4)]);
        let cmd = sized_group("cmd", &[(2_000, 2_000, 2)]);

        let cmp = Comparison::between(&skill, &cmd);
        assert_eq!(cmp.tokens.diff_pct, -50.0);
        assert_eq!(cmp.duration_ms.diff_pct, 50.0);
        assert_eq!(cmp.tools.diff_pct, 100.0);
        assert_eq!((cmp.a_wins, cmp.b_wins), (1, 2));
        assert_eq!(cmp.winner, "cmd");
    }

    #[test]
    fn zero_baseline_counts_as_no_difference() {
        let a = sized_group("a", &[(10, 0, 1)]);
        let b = sized_group("b", &[(0, 0, 0)]);
        let cmp = Comparison::between(&a, &b);
        assert_eq!(cmp.tokens.diff_pct, 0.0);
        assert_eq!(cmp.a_wins, 0);
        assert_eq!(cmp.winner, "b");
    }

    #[test]
    fn comparison_needs_exactly_two_groups_with_runs() {
        let a = sized_group("a", &[(1, 1, 1)]);
        let b = sized_group("b", &[(2, 2, 2)]);
        assert!(Comparison::of_groups(&[a.clone(), b.clone()]).is_some());
        assert!(Comparison::of_groups(&[a.clone()]).is_none());
        assert!(Comparison::of_groups(&[a.clone(), RunGroup::new("empty")]).is_none());
        assert!(Comparison::of_groups(&[a, b.clone(), b]).is_none());
    }

    #[test]
    fn load_all_tolerates_a_log_with_invalid_bytes() {
        let dir = tempdir().unwrap();
        let journal = SessionJournal::new(dir.path());
        journal.append(&"good".into(), EventKind::tool("Read", 2)).unwrap();
        let mut bad = b"\xff\xfe\xfd\n".to_vec();
        bad.extend_from_slice(b"{\"event\":\"tool\",\"tool\":\"Bash\",\"input_size\":2,\"ts\":9}\n");
        fs::write(dir.path().join("bad.jsonl"), bad).unwrap();

        let group = load_all(&journal, "all").unwrap();
        let ids: Vec<_> = group.runs.iter().map(|r| r.session_id.as_str()).collect();
        assert_eq!(ids, ["bad", "good"]);
        assert_eq!(group.runs[0].tool_breakdown["Bash"], 1);
    }
}
