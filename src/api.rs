//! JSON request/response surface over the three stores.
//!
//! Every operation takes a JSON object and answers with a JSON value, so the
//! stores can be driven from the CLI's `call` subcommand, scripts, or tests
//! without going through the typed API.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::board::{
    AddTaskRequest, BoardRecord, BoardStore, CreateBoardRequest, UpdateTaskStatusRequest,
    BOARD_KIND,
};
use crate::config::{Config, LimitsConfig};
use crate::error::{Error, Result};
use crate::request::{parse_request, IdRequest};
use crate::storage::{CollectionBackend, MemoryBackend, Storage};
use crate::team::{
    CreateTeamRequest, TeamRecord, TeamStore, TeamUsersRequest, UpdateTeamRequest, TEAM_KIND,
};
use crate::user::{CreateUserRequest, UpdateUserRequest, UserRecord, UserStore, USER_KIND};

/// Named operations accepted by [`App::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateUser,
    ListUsers,
    DescribeUser,
    UpdateUser,
    GetUserTeams,
    CreateTeam,
    ListTeams,
    DescribeTeam,
    UpdateTeam,
    AddUsersToTeam,
    RemoveUsersFromTeam,
    ListTeamUsers,
    CreateBoard,
    CloseBoard,
    AddTask,
    UpdateTaskStatus,
    ListBoards,
    DescribeBoard,
    ExportBoard,
}

impl Operation {
    pub const ALL: [Operation; 19] = [
        Operation::CreateUser,
        Operation::ListUsers,
        Operation::DescribeUser,
        Operation::UpdateUser,
        Operation::GetUserTeams,
        Operation::CreateTeam,
        Operation::ListTeams,
        Operation::DescribeTeam,
        Operation::UpdateTeam,
        Operation::AddUsersToTeam,
        Operation::RemoveUsersFromTeam,
        Operation::ListTeamUsers,
        Operation::CreateBoard,
        Operation::CloseBoard,
        Operation::AddTask,
        Operation::UpdateTaskStatus,
        Operation::ListBoards,
        Operation::DescribeBoard,
        Operation::ExportBoard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateUser => "create_user",
            Operation::ListUsers => "list_users",
            Operation::DescribeUser => "describe_user",
            Operation::UpdateUser => "update_user",
            Operation::GetUserTeams => "get_user_teams",
            Operation::CreateTeam => "create_team",
            Operation::ListTeams => "list_teams",
            Operation::DescribeTeam => "describe_team",
            Operation::UpdateTeam => "update_team",
            Operation::AddUsersToTeam => "add_users_to_team",
            Operation::RemoveUsersFromTeam => "remove_users_from_team",
            Operation::ListTeamUsers => "list_team_users",
            Operation::CreateBoard => "create_board",
            Operation::CloseBoard => "close_board",
            Operation::AddTask => "add_task",
            Operation::UpdateTaskStatus => "update_task_status",
            Operation::ListBoards => "list_boards",
            Operation::DescribeBoard => "describe_board",
            Operation::ExportBoard => "export_board",
        }
    }

    /// True for operations that never write.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Operation::ListUsers
                | Operation::DescribeUser
                | Operation::GetUserTeams
                | Operation::ListTeams
                | Operation::DescribeTeam
                | Operation::ListTeamUsers
                | Operation::ListBoards
                | Operation::DescribeBoard
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Operation::ALL.iter().map(|op| op.as_str()).collect();
                Error::InvalidArgument(format!(
                    "unknown operation '{}'; expected one of: {}",
                    wanted,
                    names.join(", ")
                ))
            })
    }
}

/// The three stores wired together.
pub struct App {
    pub users: Arc<UserStore>,
    pub teams: Arc<TeamStore>,
    pub boards: BoardStore,
}

impl App {
    /// Open the file-backed collections rooted at `dir`, creating empty ones
    /// where missing.
    pub fn open(dir: &Path, config: &Config) -> Result<Self> {
        let storage = config.storage(dir);
        let created = storage.init()?;
        if !created.is_empty() {
            debug!(data_dir = %storage.data_dir().display(), created = created.len(), "initialized collections");
        }
        Ok(Self::from_storage(&storage, config.limits))
    }

    pub fn from_storage(storage: &Storage, limits: LimitsConfig) -> Self {
        Self::with_backends(
            Arc::new(storage.backend(storage.users_file())),
            Arc::new(storage.backend(storage.teams_file())),
            Arc::new(storage.backend(storage.boards_file())),
            storage.out_dir().to_path_buf(),
            limits,
        )
    }

    /// Collections held in memory; exports still go to `out_dir`.
    pub fn in_memory(out_dir: PathBuf, limits: LimitsConfig) -> Self {
        Self::with_backends(
            Arc::new(MemoryBackend::new("users")),
            Arc::new(MemoryBackend::new("teams")),
            Arc::new(MemoryBackend::new("boards")),
            out_dir,
            limits,
        )
    }

    pub fn with_backends(
        users: Arc<dyn CollectionBackend<UserRecord>>,
        teams: Arc<dyn CollectionBackend<TeamRecord>>,
        boards: Arc<dyn CollectionBackend<BoardRecord>>,
        out_dir: PathBuf,
        limits: LimitsConfig,
    ) -> Self {
        let users = Arc::new(UserStore::new(users, limits));
        let teams = Arc::new(TeamStore::new(teams, users.clone(), limits));
        let boards = BoardStore::new(boards, out_dir, limits);
        Self {
            users,
            teams,
            boards,
        }
    }

    /// Run one named operation on a JSON request body.
    ///
    /// An empty body is read as `{}`.
    pub fn dispatch(&self, operation: &str, request: &str) -> Result<Value> {
        let op: Operation = operation.parse()?;
        debug!(operation = %op, "dispatching request");
        self.run(op, request)
    }

    pub fn run(&self, op: Operation, request: &str) -> Result<Value> {
        match op {
            Operation::CreateUser => {
                to_value(self.users.create(parse_request::<CreateUserRequest>(request)?)?)
            }
            Operation::ListUsers => to_value(self.users.list()?),
            Operation::DescribeUser => {
                let req: IdRequest = parse_request(request)?;
                to_value(self.users.describe(req.id(USER_KIND)?)?)
            }
            Operation::UpdateUser => {
                to_value(self.users.update(parse_request::<UpdateUserRequest>(request)?)?)
            }
            Operation::GetUserTeams => {
                let req: IdRequest = parse_request(request)?;
                to_value(self.users.get_teams(req.id(USER_KIND)?, self.teams.as_ref())?)
            }
            Operation::CreateTeam => {
                to_value(self.teams.create(parse_request::<CreateTeamRequest>(request)?)?)
            }
            Operation::ListTeams => to_value(self.teams.list()?),
            Operation::DescribeTeam => {
                let req: IdRequest = parse_request(request)?;
                to_value(self.teams.describe(req.id(TEAM_KIND)?)?)
            }
            Operation::UpdateTeam => {
                to_value(self.teams.update(parse_request::<UpdateTeamRequest>(request)?)?)
            }
            Operation::AddUsersToTeam => {
                to_value(self.teams.add_users(parse_request::<TeamUsersRequest>(request)?)?)
            }
            Operation::RemoveUsersFromTeam => {
                to_value(self.teams.remove_users(parse_request::<TeamUsersRequest>(request)?)?)
            }
            Operation::ListTeamUsers => {
                let req: IdRequest = parse_request(request)?;
                to_value(self.teams.list_users(req.id(TEAM_KIND)?)?)
            }
            Operation::CreateBoard => {
                to_value(self.boards.create(parse_request::<CreateBoardRequest>(request)?)?)
            }
            Operation::CloseBoard => {
                let req: IdRequest = parse_request(request)?;
                to_value(self.boards.close(req.id(BOARD_KIND)?)?)
            }
            Operation::AddTask => {
                to_value(self.boards.add_task(parse_request::<AddTaskRequest>(request)?)?)
            }
            Operation::UpdateTaskStatus => to_value(
                self.boards
                    .update_task_status(parse_request::<UpdateTaskStatusRequest>(request)?)?,
            ),
            Operation::ListBoards => {
                let req: IdRequest = parse_request(request)?;
                to_value(self.boards.list_boards(req.id(TEAM_KIND)?)?)
            }
            Operation::DescribeBoard => {
                let req: IdRequest = parse_request(request)?;
                to_value(self.boards.describe(req.id(BOARD_KIND)?)?)
            }
            Operation::ExportBoard => {
                let req: IdRequest = parse_request(request)?;
                to_value(self.boards.export(req.id(BOARD_KIND)?)?)
            }
        }
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn app() -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let app = App::in_memory(dir.path().join("out"), LimitsConfig::default());
        (dir, app)
    }

    fn call(app: &App, op: &str, body: Value) -> Result<Value> {
        app.dispatch(op, &body.to_string())
    }

    #[test]
    fn operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
        let err = "drop_everything".parse::<Operation>().unwrap_err();
        assert!(err.to_string().contains("create_user"));
    }

    #[test]
    fn user_flow() {
        let (_dir, app) = app();
        let created = call(&app, "create_user", json!({"name": "alice", "display_name": "Alice A"})).unwrap();
        assert_eq!(created, json!({"id": "1"}));
        assert!(call(&app, "create_user", json!({"name": "alice", "display_name": "Other"})).is_err());

        let users = app.dispatch("list_users", "").unwrap();
        assert_eq!(users.as_array().unwrap().len(), 1);
        assert_eq!(users[0]["display_name"], "Alice A");

        call(&app, "update_user", json!({"id": "1", "user": {"display_name": "Al"}})).unwrap();
        let user = call(&app, "describe_user", json!({"id": "1"})).unwrap();
        assert_eq!(user["display_name"], "Al");

        let err = call(&app, "update_user", json!({"id": "1", "user": {"nickname": "x"}})).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn team_membership_flow() {
        let (_dir, app) = app();
        call(&app, "create_user", json!({"name": "alice", "display_name": "Alice"})).unwrap();
        call(&app, "create_user", json!({"name": "bob", "display_name": "Bob"})).unwrap();
        let team = call(&app, "create_team", json!({"name": "core", "description": "d", "admin": "1"})).unwrap();
        assert_eq!(team, json!({"id": "1"}));

        call(&app, "add_users_to_team", json!({"id": "1", "users": ["1", "2"]})).unwrap();
        let members = call(&app, "list_team_users", json!({"id": "1"})).unwrap();
        assert_eq!(members.as_array().unwrap().len(), 2);
        assert_eq!(members[1]["name"], "bob");

        let teams = call(&app, "get_user_teams", json!({"id": "2"})).unwrap();
        assert_eq!(teams[0]["name"], "core");

        call(&app, "remove_users_from_team", json!({"id": "1", "users": ["2", "9"]})).unwrap();
        let team = call(&app, "describe_team", json!({"id": "1"})).unwrap();
        assert_eq!(team["users"], json!(["1"]));
        assert_eq!(call(&app, "get_user_teams", json!({"id": "2"})).unwrap(), json!([]));

        assert!(matches!(
            call(&app, "get_user_teams", json!({"id": "42"})),
            Err(Error::NotFound { kind: "user", .. })
        ));
    }

    #[test]
    fn board_lifecycle() {
        let (_dir, app) = app();
        let board = call(&app, "create_board", json!({"name": "Sprint1", "description": "d", "team_id": "1"})).unwrap();
        assert_eq!(board, json!({"id": "1"}));
        let task = call(&app, "add_task", json!({"title": "T1", "description": "d", "user_id": "1", "board_id": "1"})).unwrap();
        assert_eq!(task, json!({"id": "1"}));

        let err = call(&app, "close_board", json!({"id": "1"})).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));

        call(&app, "update_task_status", json!({"id": "1", "status": "COMPLETE"})).unwrap();
        assert_eq!(call(&app, "close_board", json!({"id": "1"})).unwrap(), json!({"id": "1"}));

        let described = call(&app, "describe_board", json!({"id": "1"})).unwrap();
        assert_eq!(described["status"], "CLOSED");
        assert!(described["end_time"].is_string());
        assert_eq!(described["tasks"]["1"]["status"], "COMPLETE");

        assert_eq!(call(&app, "list_boards", json!({"id": "1"})).unwrap(), json!([]));
    }

    #[test]
    fn export_reports_out_file() {
        let (dir, app) = app();
        call(&app, "create_board", json!({"name": "Sprint1", "description": "d", "team_id": "1"})).unwrap();
        let out = call(&app, "export_board", json!({"id": "1"})).unwrap();
        let path = dir.path().join("out").join("board_1.txt");
        assert_eq!(out["out_file"], path.display().to_string());
        assert!(path.exists());
    }

    #[test]
    fn malformed_requests_are_caller_errors() {
        let (_dir, app) = app();
        let err = app.dispatch("create_user", "{not json").unwrap_err();
        assert_eq!(err.exit_code(), crate::error::exit_codes::USER_ERROR);
        let err = app.dispatch("describe_board", "{}").unwrap_err();
        assert!(err.to_string().contains("board id is required"));
    }

    #[test]
    fn open_creates_collections_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::open(dir.path(), &Config::default()).unwrap();
        assert!(dir.path().join("db/users.json").exists());
        assert!(dir.path().join("db/boards.json").exists());

        call(&app, "create_user", json!({"name": "alice", "display_name": "Alice"})).unwrap();
        let reopened = App::open(dir.path(), &Config::default()).unwrap();
        let users = reopened.dispatch("list_users", "").unwrap();
        assert_eq!(users[0]["name"], "alice");
    }
}
