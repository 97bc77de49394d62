//! The `gradepoint export` and `gradepoint import` commands.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use chrono::Utc;

use gradepoint_core::transfer::export_file_name;
use gradepoint_core::{SaveStatus, SimpleStore, TransferError};

use super::{report_status, Context, DatasetTarget};

pub fn export(ctx: &Context, target: &DatasetTarget, output: Option<PathBuf>) -> Result<()> {
    let (key, content) = if target.simple {
        let store = SimpleStore::new(ctx.port());
        (gradepoint_core::persistence::SIMPLE_KEY.to_string(), store.export())
    } else {
        let store = ctx.grade_store(&target.store)?;
        (store.key().to_string(), store.export())
    };

    let content = match content {
        Ok(content) => content,
        Err(TransferError::NoData) => anyhow::bail!("nothing saved under {key} yet"),
        Err(e) => return Err(e.into()),
    };

    let path = output.unwrap_or_else(|| PathBuf::from(export_file_name(&key, Utc::now())));
    std::fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(key = %key, path = %path.display(), "dataset exported");
    println!("Exported {key} to {}", path.display());
    Ok(())
}

pub fn import(ctx: &Context, target: &DatasetTarget, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let (key, status): (String, SaveStatus) = if target.simple {
        let mut store = SimpleStore::new(ctx.port());
        let status = store
            .import(&content)
            .with_context(|| format!("could not import {}", file.display()))?;
        (gradepoint_core::persistence::SIMPLE_KEY.to_string(), status)
    } else {
        let mut store = ctx.grade_store(&target.store)?;
        let status = store
            .import(&content)
            .with_context(|| format!("could not import {}", file.display()))?;
        (store.key().to_string(), status)
    };

    tracing::info!(key = %key, path = %file.display(), "dataset imported");
    report_status(&status, &format!("Imported {} into {key}.", file.display()));
    Ok(())
}
