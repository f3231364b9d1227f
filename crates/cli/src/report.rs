use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::{Args, ValueEnum};
use serde::Serialize;
use tracing::{debug, info};

use benchlog_common::summary::{
    collect_group, load_all, load_group, Comparison, GroupStats, MetricDiff, RunGroup,
};
use benchlog_common::{BenchlogConfig, ConfigOverrides, SessionId, SessionJournal};

const DEFAULT_TITLE: &str = "Benchmark Report";
const DEFAULT_MODEL: &str = "default";
const MODEL_FILE: &str = "model.txt";
/// Differences below this percentage are reported as comparable.
const COMPARABLE_PCT: f64 = 10.0;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Session ids to include (repeatable)
    #[arg(long = "session", value_name = "ID")]
    sessions: Vec<String>,
    /// Run groups listed in `<log_dir>/<NAME>-sessions.txt` (repeatable)
    #[arg(long = "group", value_name = "NAME")]
    groups: Vec<String>,
    /// Output format
    #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
    format: ReportFormat,
    /// Write the report to this file instead of stdout
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Report heading
    #[arg(long, default_value = DEFAULT_TITLE)]
    title: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Markdown,
    Json,
}

pub fn run(args: ReportArgs, overrides: &ConfigOverrides) -> Result<()> {
    let config = BenchlogConfig::load(overrides).context("failed to load configuration")?;
    let journal = config.journal();
    let groups = gather(&journal, &args)?;

    let runs: usize = groups.iter().map(|g| g.runs.len()).sum();
    info!(groups = groups.len(), runs, dir = %journal.dir().display(), "report data collected");
    if runs == 0 {
        println!("No benchmark logs found in {}.", journal.dir().display());
        return Ok(());
    }

    let meta = ReportMeta {
        title: &args.title,
        model: model_name(&journal),
        generated_at: Local::now(),
    };
    let rendered = match args.format {
        ReportFormat::Markdown => render_markdown(&meta, &journal, &groups),
        ReportFormat::Json => render_json(&meta, &groups)?,
    };

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create '{}'", parent.display()))?;
            }
            fs::write(&path, rendered.as_bytes())
                .with_context(|| format!("failed to write report '{}'", path.display()))?;
            println!("Report saved: {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn gather(journal: &SessionJournal, args: &ReportArgs) -> Result<Vec<RunGroup>> {
    let mut groups = Vec::new();

    if !args.sessions.is_empty() {
        let sessions: Vec<SessionId> = args.sessions.iter().map(|s| SessionId::from(s.as_str())).collect();
        groups.push(collect_group(journal, "selected", &sessions).context("failed to read sessions")?);
    }
    for name in &args.groups {
        groups.push(load_group(journal, name).with_context(|| format!("failed to load group '{name}'"))?);
    }
    if groups.is_empty() {
        groups.push(load_all(journal, "all").context("failed to scan log directory")?);
    }
    Ok(groups)
}

/// Heading data shared by both output formats.
pub struct ReportMeta<'a> {
    pub title: &'a str,
    pub model: String,
    pub generated_at: DateTime<Local>,
}

/// Model label from `<log_dir>/model.txt`, `default` when absent or blank.
pub fn model_name(journal: &SessionJournal) -> String {
    let path = journal.dir().join(MODEL_FILE);
    match fs::read_to_string(&path) {
        Ok(content) if !content.trim().is_empty() => content.trim().to_string(),
        Ok(_) => DEFAULT_MODEL.to_string(),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "no model file");
            DEFAULT_MODEL.to_string()
        }
    }
}

pub fn render_markdown(meta: &ReportMeta<'_>, journal: &SessionJournal, groups: &[RunGroup]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", meta.title);
    let _ = writeln!(out);
    let _ = writeln!(out, "**Date:** {}", meta.generated_at.format("%Y-%m-%d %H:%M"));
    let _ = writeln!(out, "**Model:** {}", meta.model);
    let _ = writeln!(out, "**Log directory:** `{}`", journal.dir().display());
    let _ = writeln!(out);

    let _ = writeln!(out, "## Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Group | Runs | Tokens (avg±std) | Duration (avg) | Tools (avg) |");
    let _ = writeln!(out, "|-------|------|------------------|----------------|-------------|");
    for group in groups {
        if group.is_empty() {
            let _ = writeln!(out, "| {} | 0 | - | - | - |", group.name);
            continue;
        }
        let stats = group.stats();
        let _ = writeln!(
            out,
            "| {} | {} | {}±{} | {} | {:.0} |",
            group.name,
            group.runs.len(),
            thousands(stats.tokens.avg.round() as u64),
            thousands(stats.tokens.std.round() as u64),
            seconds(stats.duration_ms.avg),
            stats.tools.avg,
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Detailed Results");
    let _ = writeln!(out);
    for group in groups.iter().filter(|g| !g.is_empty()) {
        let _ = writeln!(out, "### {}", group.name);
        let _ = writeln!(out);
        let _ = writeln!(out, "| Run | Session | Tokens | Duration | Tools |");
        let _ = writeln!(out, "|-----|---------|--------|----------|-------|");
        for (index, run) in group.runs.iter().enumerate() {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                index + 1,
                run.session_id,
                thousands(run.tokens_total),
                seconds(run.duration_ms as f64),
                run.tool_count,
            );
        }
        let _ = writeln!(out);

        if let Some(first) = group.runs.first().filter(|r| !r.tool_breakdown.is_empty()) {
            let _ = writeln!(out, "**Tool usage (Run 1):**");
            for (tool, count) in &first.tool_breakdown {
                let _ = writeln!(out, "- {tool}: {count}");
            }
            let _ = writeln!(out);
        }
    }

    match Comparison::of_groups(groups) {
        Some(cmp) => write_comparison(&mut out, &cmp),
        None => {
            let _ = writeln!(out, "## Conclusions");
            let _ = writeln!(out);
            let _ = writeln!(out, "*Insufficient data for comparison*");
            let _ = writeln!(out);
        }
    }
    out
}

fn write_comparison(out: &mut String, cmp: &Comparison) {
    let _ = writeln!(out, "## Comparison");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Metric | {} | {} | Diff |", cmp.a, cmp.b);
    let _ = writeln!(out, "|--------|------|------|------|");
    let _ = writeln!(
        out,
        "| Tokens | {} | {} | {} |",
        thousands(cmp.tokens.a.round() as u64),
        thousands(cmp.tokens.b.round() as u64),
        percent(&cmp.tokens),
    );
    let _ = writeln!(
        out,
        "| Duration | {} | {} | {} |",
        seconds(cmp.duration_ms.a),
        seconds(cmp.duration_ms.b),
        percent(&cmp.duration_ms),
    );
    let _ = writeln!(
        out,
        "| Tools | {:.0} | {:.0} | {} |",
        cmp.tools.a,
        cmp.tools.b,
        percent(&cmp.tools),
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## Conclusions");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "**Winner: {}** ({}/{n} metrics favor {}, {}/{n} favor {})",
        cmp.winner,
        cmp.a_wins,
        cmp.a,
        cmp.b_wins,
        cmp.b,
        n = Comparison::METRICS,
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "**Observations:**");
    let better = |metric: &MetricDiff| if metric.diff_pct > 0.0 { &cmp.b } else { &cmp.a };
    if cmp.tokens.diff_pct.abs() < COMPARABLE_PCT {
        let _ = writeln!(out, "- Token usage is comparable between groups");
    } else {
        let _ = writeln!(out, "- {} is more token-efficient", better(&cmp.tokens));
    }
    if cmp.duration_ms.diff_pct.abs() < COMPARABLE_PCT {
        let _ = writeln!(out, "- Execution time is comparable between groups");
    } else {
        let _ = writeln!(out, "- {} executes faster", better(&cmp.duration_ms));
    }
    let _ = writeln!(out);
}

#[derive(Serialize)]
struct JsonReport<'a> {
    title: &'a str,
    model: &'a str,
    generated_at: String,
    groups: Vec<JsonGroup<'a>>,
    comparison: Option<Comparison>,
}

#[derive(Serialize)]
struct JsonGroup<'a> {
    #[serde(flatten)]
    group: &'a RunGroup,
    stats: GroupStats,
}

pub fn render_json(meta: &ReportMeta<'_>, groups: &[RunGroup]) -> Result<String> {
    let report = JsonReport {
        title: meta.title,
        model: &meta.model,
        generated_at: meta.generated_at.to_rfc3339(),
        groups: groups
            .iter()
            .map(|group| JsonGroup {
                group,
                stats: group.stats(),
            })
            .collect(),
        comparison: Comparison::of_groups(groups),
    };
    let mut rendered = serde_json::to_string_pretty(&report).context("failed to encode report")?;
    rendered.push('\n');
    Ok(rendered)
}

/// 1234567 -> "1,234,567"
fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn seconds(ms: f64) -> String {
    format!("{:.1}s", ms / 1000.0)
}

fn percent(metric: &MetricDiff) -> String {
    let sign = if metric.diff_pct > 0.0 { "+" } else { "" };
    format!("{sign}{:.1}%", metric.diff_pct)
}
