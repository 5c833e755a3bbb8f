//! teamboard call: raw JSON dispatch.

use std::io::Read;
use std::path::PathBuf;

use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

use super::open_app;

pub struct CallOptions {
    pub operation: String,
    pub request: Option<String>,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run(options: CallOptions) -> Result<()> {
    let request = match options.request {
        Some(raw) if raw.trim() != "-" => raw,
        _ => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            raw
        }
    };

    let app = open_app(options.dir)?;
    let response = app.dispatch(&options.operation, &request)?;

    let mut human = HumanOutput::new(serde_json::to_string_pretty(&response)?);
    if response.is_array() {
        human.push_summary("Total", response.as_array().map_or(0, Vec::len).to_string());
    }
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        &format!("call {}", options.operation.trim()),
        &response,
        Some(&human),
    )
}
