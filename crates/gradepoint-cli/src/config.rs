//! CLI configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use gradepoint_core::{Catalog, FileStore};

/// Top-level gradepoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradepointConfig {
    /// Directory holding one JSON file per dataset.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Extra catalog files merged over the built-in catalog.
    #[serde(default)]
    pub catalog_dir: Option<PathBuf>,
    /// Department used when a command names neither `--dept` nor `--custom`.
    #[serde(default)]
    pub default_department: Option<String>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./gradepoint-data")
}

impl Default for GradepointConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            catalog_dir: None,
            default_department: None,
        }
    }
}

impl GradepointConfig {
    pub fn file_store(&self) -> FileStore {
        FileStore::new(&self.data_dir)
    }

    /// The built-in catalog with `catalog_dir` merged over it.
    pub fn catalog(&self) -> Result<Catalog> {
        let mut catalog = Catalog::builtin().context("failed to load built-in catalog")?;
        if let Some(dir) = &self.catalog_dir {
            let extra = Catalog::load_dir(dir)?;
            tracing::debug!(departments = extra.departments().len(), dir = %dir.display(), "extra catalog loaded");
            catalog.merge(extra);
        }
        Ok(catalog)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + len];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order:
/// 1. `gradepoint.toml` in the current directory
/// 2. `~/.config/gradepoint/config.toml`
///
/// Environment variable overrides: `GRADEPOINT_DATA_DIR`, `GRADEPOINT_DEPARTMENT`.
pub fn load_config_from(path: Option<&Path>) -> Result<GradepointConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("gradepoint.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "using config");
            toml::from_str::<GradepointConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => GradepointConfig::default(),
    };

    // Apply env var overrides
    if let Ok(dir) = std::env::var("GRADEPOINT_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
    }
    if let Ok(dept) = std::env::var("GRADEPOINT_DEPARTMENT") {
        config.default_department = Some(dept);
    }

    config.data_dir = resolve_path(&config.data_dir);
    config.catalog_dir = config.catalog_dir.as_deref().map(resolve_path);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("gradepoint"))
}
