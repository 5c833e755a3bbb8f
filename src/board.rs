//! Project boards and their tasks.
//!
//! A board starts OPEN and may be closed once every task is COMPLETE; CLOSED
//! is terminal. Tasks live inside their board and move freely between OPEN,
//! IN_PROGRESS and COMPLETE while the board is open.
//!
//! Task ids are drawn from one sequence shared by the whole collection, so a
//! task id names exactly one task even without its board id.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::LimitsConfig;
use crate::error::{Error, Result};
use crate::export;
use crate::request::{self, IdResponse};
use crate::storage::{Collection, CollectionBackend, CollectionHandle};

pub const BOARD_KIND: &str = "board";
pub const TASK_KIND: &str = "task";

/// Sequence for task ids, stored next to the record sequence.
pub const TASK_SEQUENCE: &str = "task";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardStatus {
    Open,
    Closed,
}

impl BoardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardStatus::Open => "OPEN",
            BoardStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for BoardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Open,
    InProgress,
    Complete,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Open, TaskStatus::InProgress, TaskStatus::Complete];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "OPEN",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Complete => "COMPLETE",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "OPEN" => Ok(TaskStatus::Open),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "COMPLETE" => Ok(TaskStatus::Complete),
            _ => Err(Error::InvalidArgument(format!(
                "invalid status '{}': must be OPEN, IN_PROGRESS or COMPLETE",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub title: String,
    pub description: String,
    pub user_id: String,
    pub status: TaskStatus,
    #[serde(with = "crate::timestamp")]
    pub creation_time: DateTime<Utc>,
}

/// A board as stored in `boards.json`, tasks included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardRecord {
    pub name: String,
    pub description: String,
    pub team_id: String,
    pub status: BoardStatus,
    #[serde(with = "crate::timestamp")]
    pub creation_time: DateTime<Utc>,
    #[serde(
        default,
        with = "crate::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tasks: BTreeMap<String, TaskRecord>,
}

impl BoardRecord {
    /// Ids of tasks that would block closing, in id order.
    pub fn incomplete_tasks(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .tasks
            .iter()
            .filter(|(_, task)| task.status != TaskStatus::Complete)
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_by(|a, b| crate::storage::compare_ids(a, b));
        ids
    }

    /// Tasks in id order.
    pub fn ordered_tasks(&self) -> Vec<(&str, &TaskRecord)> {
        let mut tasks: Vec<(&str, &TaskRecord)> = self
            .tasks
            .iter()
            .map(|(id, task)| (id.as_str(), task))
            .collect();
        tasks.sort_by(|(a, _), (b, _)| crate::storage::compare_ids(a, b));
        tasks
    }
}

/// A board with its id, as returned by `describe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    #[serde(flatten)]
    pub board: BoardRecord,
}

/// `{id, name}` entries of `list_boards`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResponse {
    pub out_file: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBoardRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub team_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddTaskRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub board_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskStatusRequest {
    /// Task id
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    /// Restricts the lookup to one board
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_id: Option<String>,
}

pub struct BoardStore {
    boards: CollectionHandle<BoardRecord>,
    out_dir: PathBuf,
    limits: LimitsConfig,
}

impl BoardStore {
    pub fn new(
        backend: Arc<dyn CollectionBackend<BoardRecord>>,
        out_dir: PathBuf,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            boards: CollectionHandle::new(backend),
            out_dir,
            limits,
        }
    }

    pub fn create(&self, req: CreateBoardRequest) -> Result<IdResponse> {
        let name = request::text("name", &req.name, self.limits.name_max)?;
        let description =
            request::text("description", &req.description, self.limits.description_max)?;
        let team_id = request::required("team_id", &req.team_id)?;

        let id = self.boards.update(|boards| {
            let taken = boards
                .values()
                .any(|board| board.team_id == team_id && board.name == name);
            if taken {
                return Err(Error::already_exists(BOARD_KIND, name));
            }
            let id = boards.next_record_id();
            boards.insert(
                id.clone(),
                BoardRecord {
                    name: name.to_string(),
                    description: description.to_string(),
                    team_id: team_id.to_string(),
                    status: BoardStatus::Open,
                    creation_time: Utc::now(),
                    end_time: None,
                    tasks: BTreeMap::new(),
                },
            );
            Ok(id)
        })?;

        info!(board_id = %id, team_id = %team_id, name = %name, "created board");
        Ok(IdResponse::new(id))
    }

    /// Close an OPEN board whose tasks are all COMPLETE.
    pub fn close(&self, id: &str) -> Result<IdResponse> {
        let id = request::required("board id", id)?.to_string();

        self.boards.update(|boards| {
            let board = boards
                .get_mut(&id)
                .ok_or_else(|| Error::not_found(BOARD_KIND, id.as_str()))?;
            if board.status == BoardStatus::Closed {
                return Err(Error::InvalidState(format!("board {id} is already closed")));
            }
            let pending = board.incomplete_tasks();
            if !pending.is_empty() {
                warn!(board_id = %id, pending = pending.len(), "refusing to close board");
                return Err(Error::InvalidState(format!(
                    "cannot close board {id}: tasks not COMPLETE: {}",
                    pending.join(", ")
                )));
            }
            board.status = BoardStatus::Closed;
            board.end_time = Some(Utc::now());
            Ok(())
        })?;

        info!(board_id = %id, "closed board");
        Ok(IdResponse::new(id))
    }

    pub fn add_task(&self, req: AddTaskRequest) -> Result<IdResponse> {
        let title = request::text("title", &req.title, self.limits.name_max)?;
        let description =
            request::text("description", &req.description, self.limits.description_max)?;
        let user_id = request::required("user_id", &req.user_id)?;
        let board_id = request::required("board_id", &req.board_id)?.to_string();

        let task_id = self.boards.update(|boards| {
            {
                let board = boards
                    .get(&board_id)
                    .ok_or_else(|| Error::not_found(BOARD_KIND, board_id.as_str()))?;
                if board.status != BoardStatus::Open {
                    warn!(board_id = %board_id, "refusing task on closed board");
                    return Err(Error::InvalidState(format!(
                        "cannot add task to board {board_id}: board is {}",
                        board.status
                    )));
                }
                if board.tasks.values().any(|task| task.title == title) {
                    return Err(Error::already_exists(TASK_KIND, title));
                }
            }

            let task_id = allocate_task_id(boards);
            let board = boards
                .get_mut(&board_id)
                .ok_or_else(|| Error::not_found(BOARD_KIND, board_id.as_str()))?;
            board.tasks.insert(
                task_id.clone(),
                TaskRecord {
                    title: title.to_string(),
                    description: description.to_string(),
                    user_id: user_id.to_string(),
                    status: TaskStatus::Open,
                    creation_time: Utc::now(),
                },
            );
            Ok(task_id)
        })?;

        info!(board_id = %board_id, task_id = %task_id, title = %title, "added task");
        Ok(IdResponse::new(task_id))
    }

    /// Set a task's status.
    ///
    /// Without `board_id` every board is searched; an id present on more than
    /// one board is rejected instead of guessing.
    pub fn update_task_status(&self, req: UpdateTaskStatusRequest) -> Result<IdResponse> {
        let task_id = request::required("task id", &req.id)?.to_string();
        let status: TaskStatus = request::required("status", &req.status)?.parse()?;
        let scope = req
            .board_id
            .as_deref()
            .map(str::trim)
            .filter(|board_id| !board_id.is_empty())
            .map(str::to_string);

        let board_id = self.boards.update(|boards| {
            let board_id = match scope {
                Some(board_id) => board_id,
                None => locate_task(boards, &task_id)?,
            };
            let board = boards
                .get_mut(&board_id)
                .ok_or_else(|| Error::not_found(BOARD_KIND, board_id.as_str()))?;
            if board.status == BoardStatus::Closed {
                return Err(Error::InvalidState(format!(
                    "board {board_id} is closed; its tasks can no longer change status"
                )));
            }
            let task = board
                .tasks
                .get_mut(&task_id)
                .ok_or_else(|| Error::not_found(TASK_KIND, task_id.as_str()))?;
            task.status = status;
            Ok(board_id)
        })?;

        info!(board_id = %board_id, task_id = %task_id, status = %status, "updated task status");
        Ok(IdResponse::new(task_id))
    }

    /// OPEN boards of one team.
    pub fn list_boards(&self, team_id: &str) -> Result<Vec<BoardSummary>> {
        let team_id = request::required("team id", team_id)?;
        self.boards.read(|boards| {
            Ok(boards
                .ordered()
                .into_iter()
                .filter(|(_, board)| board.team_id == team_id && board.status == BoardStatus::Open)
                .map(|(id, board)| BoardSummary {
                    id: id.to_string(),
                    name: board.name.clone(),
                })
                .collect())
        })
    }

    pub fn describe(&self, id: &str) -> Result<Board> {
        let id = request::required("board id", id)?;
        self.boards.read(|boards| {
            boards
                .get(id)
                .map(|board| Board {
                    id: id.to_string(),
                    board: board.clone(),
                })
                .ok_or_else(|| Error::not_found(BOARD_KIND, id))
        })
    }

    /// Write a text rendering of the board to `<out_dir>/board_<id>.txt`.
    pub fn export(&self, id: &str) -> Result<ExportResponse> {
        let board = self.describe(id)?;
        let path = export::write_export(&self.out_dir, &board)?;
        info!(board_id = %board.id, path = %path.display(), "exported board");
        Ok(ExportResponse {
            out_file: path.display().to_string(),
        })
    }
}

fn allocate_task_id(boards: &mut Collection<BoardRecord>) -> String {
    let taken: HashSet<String> = boards
        .values()
        .flat_map(|board| board.tasks.keys().cloned())
        .collect();
    boards.next_sequence_id(TASK_SEQUENCE, |candidate| taken.contains(candidate))
}

fn locate_task(boards: &Collection<BoardRecord>, task_id: &str) -> Result<String> {
    let owners: Vec<&str> = boards
        .ordered()
        .into_iter()
        .filter(|(_, board)| board.tasks.contains_key(task_id))
        .map(|(id, _)| id)
        .collect();
    match owners.as_slice() {
        [] => Err(Error::not_found(TASK_KIND, task_id)),
        [board_id] => Ok(board_id.to_string()),
        many => Err(Error::InvalidArgument(format!(
            "task id {task_id} exists on boards {}; pass board_id",
            many.join(", ")
        ))),
    }
}
