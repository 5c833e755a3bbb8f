//! Shared output formatting for teamboard CLI commands.
//!
//! With `--json` every command prints one envelope on stdout:
//! `{schema_version, command, status, data}` on success and
//! `{schema_version, command, status, error}` on failure.

use serde::Serialize;

use crate::error::{JsonError, Result};

pub const SCHEMA_VERSION: &str = "teamboard.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            details: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let warnings = human.map(|h| h.warnings.clone()).unwrap_or_default();
        let next_steps = human.map(|h| h.next_steps.clone()).unwrap_or_default();

        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            data: &'a T,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            warnings: Vec<String>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings,
            next_steps,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if options.quiet {
        return Ok(());
    }

    if let Some(human) = human {
        println!("{}", format_human(human));
    }

    Ok(())
}

pub fn emit_error(command: &str, err: &crate::error::Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    let hint = next_steps.first().map(|step| step.as_str());
    if json {
        #[derive(Serialize)]
        struct Envelope<'a> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            error: JsonError,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: JsonError::from(err),
            next_steps,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = hint {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = Vec::new();
    lines.push(output.header.clone());

    push_summary(&mut lines, &output.summary);
    push_section(&mut lines, "Details", &output.details);
    push_section(&mut lines, "Warnings", &output.warnings);
    push_section(&mut lines, "Next steps", &output.next_steps);

    lines.join("\n")
}

pub fn infer_command_name_from_args() -> String {
    infer_command_name(std::env::args().skip(1))
}

fn infer_command_name(args: impl IntoIterator<Item = String>) -> String {
    let mut args = args.into_iter();
    let mut subcommand = None;

    let command = match next_positional(&mut args) {
        Some(cmd) => cmd,
        None => return "teamboard".to_string(),
    };

    if matches!(
        command.as_str(),
        "user" | "team" | "board" | "call" | "config"
    ) {
        subcommand = next_positional(&mut args);
    }

    if let Some(sub) = subcommand {
        format!("{command} {sub}")
    } else {
        command
    }
}

/// Next non-flag argument, skipping the value of `--dir`.
fn next_positional(args: &mut impl Iterator<Item = String>) -> Option<String> {
    while let Some(arg) = args.next() {
        if arg == "--dir" {
            args.next();
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        return Some(arg);
    }
    None
}

fn error_next_steps(err: &crate::error::Error) -> Vec<String> {
    use crate::error::Error;

    match err {
        Error::NotFound { kind: "user", .. } => vec!["teamboard user list".to_string()],
        Error::NotFound { kind: "team", .. } => vec!["teamboard team list".to_string()],
        Error::NotFound { kind: "board", .. } | Error::NotFound { kind: "task", .. } => {
            vec!["teamboard board show <board-id>".to_string()]
        }
        Error::InvalidState(message) if message.contains("not COMPLETE") => {
            vec!["teamboard board task-status <task-id> COMPLETE".to_string()]
        }
        Error::CorruptCollection { path, .. } => {
            vec![format!("inspect or restore {}", path.display())]
        }
        Error::LockFailed(_) => vec!["retry once the other writer finishes".to_string()],
        Error::InvalidConfig(_) | Error::TomlParse(_) => {
            vec!["fix .teamboard.toml then retry".to_string()]
        }
        _ => Vec::new(),
    }
}

fn push_summary(lines: &mut Vec<String>, summary: &[(String, String)]) {
    if summary.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push("Summary:".to_string());
    for (key, value) in summary {
        if value.is_empty() {
            lines.push(format!("- {key}"));
        } else {
            lines.push(format!("- {key}: {value}"));
        }
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push(format!("{title}:"));
    for item in items {
        lines.push(format!("- {item}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn infers_grouped_command_names() {
        assert_eq!(infer_command_name(args(&["--json", "user", "create", "x"])), "user create");
        assert_eq!(infer_command_name(args(&["board", "-q", "close", "1"])), "board close");
        assert_eq!(infer_command_name(args(&["call", "add_task", "{}"])), "call add_task");
        assert_eq!(infer_command_name(args(&["init"])), "init");
        assert_eq!(
            infer_command_name(args(&["--dir", "/tmp/w", "team", "users", "1"])),
            "team users"
        );
        assert_eq!(infer_command_name(args(&["--json"])), "teamboard");
    }

    #[test]
    fn hints_for_common_failures() {
        let steps = error_next_steps(&Error::not_found("team", "4"));
        assert_eq!(steps, vec!["teamboard team list".to_string()]);
        let steps = error_next_steps(&Error::InvalidState(
            "cannot close board 1: tasks not COMPLETE: 2".into(),
        ));
        assert!(steps[0].contains("task-status"));
        assert!(error_next_steps(&Error::InvalidArgument("x".into())).is_empty());
    }
}
