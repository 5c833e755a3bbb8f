//! teamboard init command implementation
//!
//! Writes a default `.teamboard.toml` and creates the data and out
//! directories with empty collections.

use std::path::{Path, PathBuf};

use crate::config::{Config, CONFIG_FILE};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};

use super::resolve_dir;

#[derive(serde::Serialize)]
struct InitReport {
    dir: PathBuf,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    config: bool,
    out_dir: bool,
    collections: Vec<PathBuf>,
}

pub fn run(dir: Option<PathBuf>, json: bool, quiet: bool) -> Result<()> {
    let dir = resolve_dir(dir)?;
    std::fs::create_dir_all(&dir)?;

    let created_config = ensure_config(&dir)?;
    let config = Config::load_from_dir(&dir)?;
    let storage = config.storage(&dir);
    let collections = storage.init()?;
    let created_out_dir = ensure_dir(storage.out_dir())?;

    let report = InitReport {
        dir: dir.clone(),
        created: InitCreated {
            config: created_config,
            out_dir: created_out_dir,
            collections,
        },
    };

    let mut created_items = Vec::new();
    if created_config {
        created_items.push(CONFIG_FILE.to_string());
    }
    for path in &report.created.collections {
        created_items.push(display_relative(&dir, path));
    }
    if created_out_dir {
        created_items.push(format!("{}/", display_relative(&dir, storage.out_dir())));
    }

    let header = if created_items.is_empty() {
        "teamboard init: nothing to do".to_string()
    } else {
        "teamboard init: initialized".to_string()
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("dir", dir.display().to_string());
    human.push_summary(
        "created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    human.push_next_step("teamboard user create <name> --display-name <text>");
    human.push_next_step("teamboard team create <name> --description <text> --admin <user-id>");

    emit_success(OutputOptions { json, quiet }, "init", &report, Some(&human))
}

fn ensure_config(dir: &Path) -> Result<bool> {
    let config_path = dir.join(CONFIG_FILE);
    if config_path.exists() {
        if !config_path.is_file() {
            return Err(Error::OperationFailed(format!(
                "{} exists but is not a file: {}",
                CONFIG_FILE,
                config_path.display()
            )));
        }
        return Ok(false);
    }

    Config::default().save(&config_path)?;
    Ok(true)
}

fn ensure_dir(path: &Path) -> Result<bool> {
    if path.exists() {
        if !path.is_dir() {
            return Err(Error::OperationFailed(format!(
                "Expected directory at {}",
                path.display()
            )));
        }
        return Ok(false);
    }

    std::fs::create_dir_all(path)?;
    Ok(true)
}

fn display_relative(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}
