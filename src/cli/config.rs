//! teamboard config command implementations.

use std::path::PathBuf;

use crate::config::{Config, CONFIG_FILE};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

use super::resolve_dir;

#[derive(serde::Serialize)]
struct ConfigShowOutput {
    path: PathBuf,
    exists: bool,
    config: Config,
}

pub fn run_show(dir: Option<PathBuf>, json: bool, quiet: bool) -> Result<()> {
    let dir = resolve_dir(dir)?;
    let config = Config::load_from_dir(&dir)?;
    let path = dir.join(CONFIG_FILE);
    let output = ConfigShowOutput {
        exists: path.is_file(),
        path,
        config,
    };

    let storage = output.config.storage(&dir);
    let limits = &output.config.limits;
    let mut human = HumanOutput::new("Configuration");
    human.push_summary(
        "File",
        if output.exists {
            output.path.display().to_string()
        } else {
            format!("{} (not found, using defaults)", output.path.display())
        },
    );
    human.push_summary("Data dir", storage.data_dir().display().to_string());
    human.push_summary("Out dir", storage.out_dir().display().to_string());
    human.push_summary(
        "Lock timeout",
        format!("{} ms", output.config.storage.lock_timeout_ms),
    );
    human.push_summary("Pretty JSON", output.config.storage.pretty.to_string());
    human.push_detail(format!("name_max = {}", limits.name_max));
    human.push_detail(format!("description_max = {}", limits.description_max));
    human.push_detail(format!("display_name_max = {}", limits.display_name_max));
    human.push_detail(format!(
        "display_name_update_max = {}",
        limits.display_name_update_max
    ));
    human.push_detail(format!("max_users_per_add = {}", limits.max_users_per_add));

    emit_success(
        OutputOptions { json, quiet },
        "config show",
        &output,
        Some(&human),
    )
}
