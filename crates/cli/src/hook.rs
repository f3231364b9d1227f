use std::io::{self, Read};
use std::panic::{self, AssertUnwindSafe};

use anyhow::{Context, Result};
use tracing::{debug, error};

use benchlog_common::{BenchlogConfig, ConfigOverrides, EventLogger, EventRecord, HookKind};

use crate::ack::Acknowledgment;

/// Runs one hook invocation. Never fails: the acknowledgment goes out on
/// stdout whatever happens while reading, parsing or appending.
pub fn run(kind: HookKind, overrides: &ConfigOverrides) {
    let _ack = Acknowledgment::stdout(kind.acknowledgment());

    // Panics stay on the tracing channel; the default hook would print them.
    panic::set_hook(Box::new(|info| {
        error!(panic = %info, "hook handler panicked");
    }));

    match panic::catch_unwind(AssertUnwindSafe(|| record(kind, overrides, io::stdin()))) {
        Ok(Ok(records)) => {
            debug!(hook = ?kind, count = records.len(), "hook handled");
        }
        Ok(Err(err)) => {
            debug!(hook = ?kind, error = %format!("{err:#}"), "hook event dropped");
        }
        Err(_) => {
            debug!(hook = ?kind, "hook event dropped after panic");
        }
    }
}

fn record(
    kind: HookKind,
    overrides: &ConfigOverrides,
    mut input: impl Read,
) -> Result<Vec<EventRecord>> {
    let config = BenchlogConfig::load_or_default(overrides);

    let mut raw = String::new();
    input
        .read_to_string(&mut raw)
        .context("failed to read hook payload from stdin")?;

    let logger = EventLogger::new(config.journal(), config.default_session);
    let records = logger
        .handle_raw(kind, &raw)
        .with_context(|| format!("failed to record {kind:?} hook"))?;
    Ok(records)
}
