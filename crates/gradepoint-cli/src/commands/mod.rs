//! Subcommand implementations and the state they share.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Args;

use gradepoint_core::{Catalog, Department, FileStore, GradeStore, SaveStatus};

use crate::config::{load_config_from, GradepointConfig};

pub mod departments;
pub mod elective;
pub mod grade;
pub mod init;
pub mod manual;
pub mod reset;
pub mod setup;
pub mod show;
pub mod simple;
pub mod transfer;

/// Which grade store a command works on.
#[derive(Debug, Clone, Args)]
pub struct Target {
    /// Built-in department code (e.g. CSE)
    #[arg(long, conflicts_with = "custom")]
    pub dept: Option<String>,

    /// Use the custom curriculum
    #[arg(long)]
    pub custom: bool,
}

/// Which dataset an export or import works on.
#[derive(Debug, Clone, Args)]
pub struct DatasetTarget {
    #[command(flatten)]
    pub store: Target,

    /// Use the simple calculator's data
    #[arg(long, conflicts_with_all = ["dept", "custom"])]
    pub simple: bool,
}

/// Loaded configuration and catalog.
pub struct Context {
    pub config: GradepointConfig,
    pub catalog: Catalog,
}

impl Context {
    pub fn load(config_path: Option<&Path>, data_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = load_config_from(config_path)?;
        if let Some(dir) = data_dir {
            config.data_dir = dir;
        }
        let catalog = config.catalog()?;
        tracing::debug!(data_dir = %config.data_dir.display(), "context loaded");
        Ok(Self { config, catalog })
    }

    pub fn port(&self) -> FileStore {
        self.config.file_store()
    }

    pub fn department(&self, code: &str) -> Result<&Department> {
        self.catalog.department(code).with_context(|| {
            let known: Vec<&str> = self.catalog.departments().iter().map(|d| d.code.as_str()).collect();
            format!("unknown department \"{code}\" (known: {})", known.join(", "))
        })
    }

    /// Department code from `--dept` or the configured default.
    pub fn department_code<'a>(&'a self, dept: Option<&'a str>) -> Option<&'a str> {
        dept.or(self.config.default_department.as_deref())
    }

    pub fn grade_store(&self, target: &Target) -> Result<GradeStore<FileStore>> {
        if target.custom {
            return Ok(GradeStore::custom(self.port()));
        }
        let code = self
            .department_code(target.dept.as_deref())
            .context("choose a department with --dept <CODE> or use --custom")?;
        let department = self.department(code)?;
        Ok(GradeStore::for_department(self.port(), department))
    }
}

/// Tell the user how a change went.
pub fn report_status(status: &SaveStatus, done: &str) {
    match status {
        SaveStatus::Saved => println!("{done}"),
        SaveStatus::Unchanged => println!("Nothing changed."),
        SaveStatus::NotPersisted(e) => {
            println!("{done}");
            eprintln!("Warning: your change may not have been saved: {e}");
        }
    }
}

/// Name shown for a store in headings.
pub fn store_title(ctx: &Context, store: &GradeStore<FileStore>) -> String {
    if store.is_custom() {
        return "Custom curriculum".to_string();
    }
    ctx.catalog
        .departments()
        .iter()
        .find(|d| gradepoint_core::persistence::department_key(&d.code) == store.key())
        .map(|d| format!("{} ({})", d.name, d.code))
        .unwrap_or_else(|| store.key().to_string())
}

/// Two-decimal display of a GPA.
pub fn gpa(value: f64) -> String {
    format!("{value:.2}")
}

/// Credits without trailing zeros ("3", "1.5").
pub fn credits(value: f64) -> String {
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
