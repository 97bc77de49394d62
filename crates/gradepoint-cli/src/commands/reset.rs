//! The `gradepoint reset` command.

use anyhow::{Context as _, Result};

use gradepoint_core::persistence::clear_all;

use super::{report_status, Context, Target};

pub fn execute(ctx: &Context, target: &Target, all: bool) -> Result<()> {
    let mut store = ctx.grade_store(target)?;
    if all {
        let status = store.reset_all();
        report_status(&status, &format!("Cleared everything saved under {}.", store.key()));
    } else {
        let status = store.reset_grades();
        report_status(&status, "Cleared all grades and manual GPAs.");
    }
    Ok(())
}

/// Delete every dataset in the data directory.
pub fn everything(ctx: &Context) -> Result<()> {
    let mut port = ctx.port();
    let removed = clear_all(&mut port)
        .with_context(|| format!("failed to clear {}", port.dir().display()))?;
    tracing::info!(count = removed.len(), dir = %port.dir().display(), "all data cleared");

    if removed.is_empty() {
        println!("Nothing saved yet.");
    } else {
        println!("Deleted {} saved dataset(s): {}", removed.len(), removed.join(", "));
    }
    Ok(())
}
