//! Plain-text board exports.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::board::{Board, TaskStatus};
use crate::error::Result;
use crate::lock;

const RULE_WIDTH: usize = 60;

/// File name for a board export.
///
/// Bytes outside `[A-Za-z0-9-]` are written as `_xx` (lowercase hex), `_`
/// included, so distinct ids always get distinct names and none can leave
/// the output directory.
pub fn export_file_name(board_id: &str) -> String {
    let mut safe = String::with_capacity(board_id.len());
    for byte in board_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            safe.push(char::from(byte));
        } else {
            safe.push_str(&format!("_{byte:02x}"));
        }
    }
    format!("board_{safe}.txt")
}

pub fn render_board(board: &Board) -> String {
    let record = &board.board;
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!("Board: {} (#{})\n", record.name, board.id));
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!("Description: {}\n", record.description));
    out.push_str(&format!("Team: {}\n", record.team_id));
    out.push_str(&format!("Status: {}\n", record.status));
    out.push_str(&format!("Created: {}\n", stamp(&record.creation_time)));
    if let Some(end_time) = record.end_time.as_ref() {
        out.push_str(&format!("Closed: {}\n", stamp(end_time)));
    }

    let tally: Vec<String> = TaskStatus::ALL
        .iter()
        .map(|status| {
            let count = record.tasks.values().filter(|t| t.status == *status).count();
            format!("{status} {count}")
        })
        .collect();
    out.push('\n');
    out.push_str(&format!(
        "Tasks: {} total | {}\n",
        record.tasks.len(),
        tally.join(" | ")
    ));
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');

    if record.tasks.is_empty() {
        out.push_str("(no tasks)\n");
    }
    for (id, task) in record.ordered_tasks() {
        out.push_str(&format!("- Task {id}: {} [{}]\n", task.title, task.status));
        out.push_str(&format!("  Description: {}\n", task.description));
        out.push_str(&format!("  Assigned to: {}\n", task.user_id));
        out.push_str(&format!("  Created at: {}\n", stamp(&task.creation_time)));
    }
    out
}

/// Render `board` into `out_dir`, replacing any previous export.
pub fn write_export(out_dir: &Path, board: &Board) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(export_file_name(&board.id));
    lock::write_atomic(&path, render_board(board).as_bytes())?;
    Ok(path)
}

fn stamp(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardRecord, BoardStatus, TaskRecord};
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn sample() -> Board {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let mut tasks = BTreeMap::new();
        for (id, title, status) in [
            ("10", "Ship", TaskStatus::Open),
            ("2", "Design", TaskStatus::Complete),
            ("3", "Build", TaskStatus::InProgress),
        ] {
            tasks.insert(
                id.to_string(),
                TaskRecord {
                    title: title.to_string(),
                    description: format!("{title} it"),
                    user_id: "7".to_string(),
                    status,
                    creation_time: at,
                },
            );
        }
        Board {
            id: "4".to_string(),
            board: BoardRecord {
                name: "Sprint1".to_string(),
                description: "first sprint".to_string(),
                team_id: "1".to_string(),
                status: BoardStatus::Open,
                creation_time: at,
                end_time: None,
                tasks,
            },
        }
    }

    #[test]
    fn file_name_is_escaped() {
        assert_eq!(export_file_name("12"), "board_12.txt");
        assert_eq!(export_file_name("../x"), "board__2e_2e_2fx.txt");
        assert_eq!(export_file_name("a.b"), "board_a_2eb.txt");
        assert_eq!(export_file_name("a_b"), "board_a_5fb.txt");
        assert_ne!(export_file_name("a_2eb"), export_file_name("a.b"));
    }

    #[test]
    fn render_lists_header_tally_and_tasks_in_order() {
        let text = render_board(&sample());
        assert!(text.contains("Board: Sprint1 (#4)\n"));
        assert!(text.contains("Description: first sprint\n"));
        assert!(text.contains("Status: OPEN\n"));
        assert!(text.contains("Created: 2024-03-01 09:30:00 UTC\n"));
        assert!(!text.contains("Closed:"));
        assert!(text.contains("Tasks: 3 total | OPEN 1 | IN_PROGRESS 1 | COMPLETE 1\n"));
        assert!(text.contains("  Assigned to: 7\n"));

        let design = text.find("- Task 2: Design [COMPLETE]").unwrap();
        let build = text.find("- Task 3: Build [IN_PROGRESS]").unwrap();
        let ship = text.find("- Task 10: Ship [OPEN]").unwrap();
        assert!(design < build && build < ship);
    }

    #[test]
    fn render_empty_board() {
        let mut board = sample();
        board.board.tasks.clear();
        board.board.status = BoardStatus::Closed;
        board.board.end_time = Some(board.board.creation_time);
        let text = render_board(&board);
        assert!(text.contains("(no tasks)"));
        assert!(text.contains("Closed: 2024-03-01 09:30:00 UTC"));
    }

    #[test]
    fn write_export_creates_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let path = write_export(&out, &sample()).unwrap();
        assert_eq!(path, out.join("board_4.txt"));
        assert!(fs::read_to_string(path).unwrap().starts_with("====="));
    }
}
