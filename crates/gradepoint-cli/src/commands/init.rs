//! The `gradepoint init` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub fn execute(config_path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<()> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from("gradepoint.toml"));
    if config_path.exists() {
        println!("{} already exists, skipping.", config_path.display());
    } else {
        std::fs::write(&config_path, SAMPLE_CONFIG)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!("Created {}", config_path.display());
    }

    let data_dir = data_dir.unwrap_or_else(|| PathBuf::from("gradepoint-data"));
    create_dir(&data_dir)?;

    println!("\nNext steps:");
    println!("  1. Run: gradepoint departments");
    println!("  2. Run: gradepoint grade --dept CSE CSE-1101 A");
    println!("  3. Run: gradepoint show --dept CSE");
    println!("  Or build your own curriculum with `gradepoint setup` and use --custom.");

    Ok(())
}

fn create_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        println!("{}/ already exists, skipping.", dir.display());
        return Ok(());
    }
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    println!("Created {}/", dir.display());
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# gradepoint configuration

# Where saved grades live, one JSON file per dataset.
data_dir = "./gradepoint-data"

# Extra department catalogs (*.toml) merged over the built-in one.
# catalog_dir = "./catalogs"

# Department used when neither --dept nor --custom is given.
# default_department = "CSE"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GradepointConfig;

    #[test]
    fn sample_config_parses() {
        let config: GradepointConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("./gradepoint-data"));
        assert!(config.default_department.is_none());
    }
}
