//! teamboard board command implementations.

use std::path::PathBuf;

use crate::board::{AddTaskRequest, BoardSummary, CreateBoardRequest, UpdateTaskStatusRequest};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

use super::open_app;

pub struct CreateOptions {
    pub name: String,
    pub description: String,
    pub team_id: String,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub team_id: String,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct BoardOptions {
    pub id: String,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct AddTaskOptions {
    pub board_id: String,
    pub title: String,
    pub description: String,
    pub user_id: String,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct TaskStatusOptions {
    pub task_id: String,
    pub status: String,
    pub board_id: Option<String>,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct BoardCreateOutput {
    id: String,
    name: String,
    team_id: String,
}

#[derive(serde::Serialize)]
struct BoardListOutput {
    team_id: String,
    total: usize,
    boards: Vec<BoardSummary>,
}

#[derive(serde::Serialize)]
struct TaskCreateOutput {
    id: String,
    board_id: String,
    title: String,
}

#[derive(serde::Serialize)]
struct TaskStatusOutput {
    id: String,
    status: String,
}

pub fn run_create(options: CreateOptions) -> Result<()> {
    let app = open_app(options.dir)?;
    let created = app.boards.create(CreateBoardRequest {
        name: options.name.clone(),
        description: options.description,
        team_id: options.team_id.clone(),
    })?;
    let output = BoardCreateOutput {
        id: created.id,
        name: options.name,
        team_id: options.team_id.trim().to_string(),
    };
    let mut human = HumanOutput::new("Board created");
    human.push_summary("ID", output.id.clone());
    human.push_summary("Name", output.name.clone());
    human.push_summary("Team", output.team_id.clone());
    human.push_next_step(format!(
        "teamboard board add-task {} <title> --description <text> --user <user-id>",
        output.id
    ));
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "board create",
        &output,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let app = open_app(options.dir)?;
    let boards = app.boards.list_boards(&options.team_id)?;
    let output = BoardListOutput {
        team_id: options.team_id.trim().to_string(),
        total: boards.len(),
        boards,
    };
    let mut human = HumanOutput::new(format!("Open boards of team {}", output.team_id));
    human.push_summary("Total", output.total.to_string());
    for board in &output.boards {
        human.push_detail(format!("{} {}", board.id, board.name));
    }
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "board list",
        &output,
        Some(&human),
    )
}

pub fn run_show(options: BoardOptions) -> Result<()> {
    let app = open_app(options.dir)?;
    let board = app.boards.describe(&options.id)?;
    let record = &board.board;
    let mut human = HumanOutput::new(format!("Board {}", board.id));
    human.push_summary("Name", record.name.clone());
    human.push_summary("Description", record.description.clone());
    human.push_summary("Team", record.team_id.clone());
    human.push_summary("Status", record.status.to_string());
    human.push_summary("Created", record.creation_time.to_rfc3339());
    if let Some(end_time) = record.end_time.as_ref() {
        human.push_summary("Closed", end_time.to_rfc3339());
    }
    human.push_summary("Tasks", record.tasks.len().to_string());
    for (id, task) in record.ordered_tasks() {
        human.push_detail(format!(
            "{id} [{}] {} (user {})",
            task.status, task.title, task.user_id
        ));
    }
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "board show",
        &board,
        Some(&human),
    )
}

pub fn run_close(options: BoardOptions) -> Result<()> {
    let app = open_app(options.dir)?;
    let closed = app.boards.close(&options.id)?;
    let mut human = HumanOutput::new("Board closed");
    human.push_summary("ID", closed.id.clone());
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "board close",
        &closed,
        Some(&human),
    )
}

pub fn run_add_task(options: AddTaskOptions) -> Result<()> {
    let app = open_app(options.dir)?;
    let created = app.boards.add_task(AddTaskRequest {
        title: options.title.clone(),
        description: options.description,
        user_id: options.user_id,
        board_id: options.board_id.clone(),
    })?;
    let output = TaskCreateOutput {
        id: created.id,
        board_id: options.board_id.trim().to_string(),
        title: options.title,
    };
    let mut human = HumanOutput::new("Task added");
    human.push_summary("ID", output.id.clone());
    human.push_summary("Board", output.board_id.clone());
    human.push_summary("Title", output.title.clone());
    human.push_next_step(format!("teamboard board task-status {} IN_PROGRESS", output.id));
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "board add-task",
        &output,
        Some(&human),
    )
}

pub fn run_task_status(options: TaskStatusOptions) -> Result<()> {
    let app = open_app(options.dir)?;
    let status: crate::board::TaskStatus = options.status.parse()?;
    let updated = app.boards.update_task_status(UpdateTaskStatusRequest {
        id: options.task_id,
        status: status.to_string(),
        board_id: options.board_id,
    })?;
    let output = TaskStatusOutput {
        id: updated.id,
        status: status.to_string(),
    };
    let mut human = HumanOutput::new("Task status updated");
    human.push_summary("ID", output.id.clone());
    human.push_summary("Status", output.status.clone());
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "board task-status",
        &output,
        Some(&human),
    )
}

pub fn run_export(options: BoardOptions) -> Result<()> {
    let app = open_app(options.dir)?;
    let exported = app.boards.export(&options.id)?;
    let mut human = HumanOutput::new("Board exported");
    human.push_summary("File", exported.out_file.clone());
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "board export",
        &exported,
        Some(&human),
    )
}
