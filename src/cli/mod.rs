//! Command-line interface for teamboard
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::api::App;
use crate::config::Config;
use crate::error::Result;

mod board;
mod call;
mod config;
mod init;
mod team;
mod user;

/// teamboard - users, teams and project boards
///
/// Every entity type lives in one JSON document under the data directory;
/// each command loads it, applies one change, and writes it back atomically.
#[derive(Parser, Debug)]
#[command(name = "teamboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Working directory holding .teamboard.toml (defaults to current directory)
    #[arg(long, global = true, env = "TEAMBOARD_DIR")]
    pub dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create .teamboard.toml and the empty collections
    Init,

    /// User management
    #[command(subcommand)]
    User(UserCommands),

    /// Team management
    #[command(subcommand)]
    Team(TeamCommands),

    /// Project boards and tasks
    #[command(subcommand)]
    Board(BoardCommands),

    /// Run a named operation on a raw JSON request
    Call {
        /// Operation name (e.g. create_user, add_task)
        operation: String,

        /// JSON request object; read from stdin when omitted
        request: Option<String>,
    },

    /// Configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// User subcommands
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Create a user
    Create {
        /// Unique user name
        name: String,

        /// Display name
        #[arg(long)]
        display_name: String,
    },

    /// List all users
    List,

    /// Show one user
    Show {
        /// User ID
        id: String,
    },

    /// Update a user's display name
    Update {
        /// User ID
        id: String,

        /// New display name
        #[arg(long)]
        display_name: Option<String>,

        /// Current name (names cannot change; a different value is rejected)
        #[arg(long)]
        name: Option<String>,
    },

    /// List the teams a user belongs to
    Teams {
        /// User ID
        id: String,
    },
}

/// Team subcommands
#[derive(Subcommand, Debug)]
pub enum TeamCommands {
    /// Create a team
    Create {
        /// Unique team name
        name: String,

        /// Team description
        #[arg(long)]
        description: String,

        /// Admin user ID
        #[arg(long)]
        admin: String,
    },

    /// List all teams
    List,

    /// Show one team and its member IDs
    Show {
        /// Team ID
        id: String,
    },

    /// Update team fields
    Update {
        /// Team ID
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        admin: Option<String>,
    },

    /// Add users to a team
    AddUsers {
        /// Team ID
        id: String,

        /// User IDs to add
        #[arg(required = true)]
        users: Vec<String>,
    },

    /// Remove users from a team
    RemoveUsers {
        /// Team ID
        id: String,

        /// User IDs to remove
        #[arg(required = true)]
        users: Vec<String>,
    },

    /// List team members
    Users {
        /// Team ID
        id: String,
    },
}

/// Board subcommands
#[derive(Subcommand, Debug)]
pub enum BoardCommands {
    /// Create a board for a team
    Create {
        /// Board name, unique within the team
        name: String,

        /// Board description
        #[arg(long)]
        description: String,

        /// Owning team ID
        #[arg(long)]
        team: String,
    },

    /// List open boards of a team
    List {
        /// Team ID
        team: String,
    },

    /// Show a board and its tasks
    Show {
        /// Board ID
        id: String,
    },

    /// Close a board whose tasks are all COMPLETE
    Close {
        /// Board ID
        id: String,
    },

    /// Add a task to an open board
    AddTask {
        /// Board ID
        board: String,

        /// Task title, unique within the board
        title: String,

        /// Task description
        #[arg(long)]
        description: String,

        /// Assignee user ID
        #[arg(long)]
        user: String,
    },

    /// Set a task's status: OPEN, IN_PROGRESS or COMPLETE
    TaskStatus {
        /// Task ID
        task: String,

        /// New status
        status: String,

        /// Board holding the task (searches every board when omitted)
        #[arg(long)]
        board: Option<String>,
    },

    /// Export a board as text into the out directory
    Export {
        /// Board ID
        id: String,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
}

/// Resolve the working directory from `--dir` or the current directory.
pub(crate) fn resolve_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(path) => Ok(path),
        None => Ok(std::env::current_dir()?),
    }
}

/// Load config from the working directory and open the stores.
pub(crate) fn open_app(dir: Option<PathBuf>) -> Result<App> {
    let dir = resolve_dir(dir)?;
    let config = Config::load_from_dir(&dir)?;
    App::open(&dir, &config)
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let dir = self.dir;
        let json = self.json;
        let quiet = self.quiet;

        match self.command {
            Commands::Init => init::run(dir, json, quiet),
            Commands::User(cmd) => match cmd {
                UserCommands::Create { name, display_name } => {
                    user::run_create(user::CreateOptions {
                        name,
                        display_name,
                        dir,
                        json,
                        quiet,
                    })
                }
                UserCommands::List => user::run_list(user::ListOptions { dir, json, quiet }),
                UserCommands::Show { id } => {
                    user::run_show(user::ShowOptions { id, dir, json, quiet })
                }
                UserCommands::Update {
                    id,
                    display_name,
                    name,
                } => user::run_update(user::UpdateOptions {
                    id,
                    name,
                    display_name,
                    dir,
                    json,
                    quiet,
                }),
                UserCommands::Teams { id } => {
                    user::run_teams(user::ShowOptions { id, dir, json, quiet })
                }
            },
            Commands::Team(cmd) => match cmd {
                TeamCommands::Create {
                    name,
                    description,
                    admin,
                } => team::run_create(team::CreateOptions {
                    name,
                    description,
                    admin,
                    dir,
                    json,
                    quiet,
                }),
                TeamCommands::List => team::run_list(team::ListOptions { dir, json, quiet }),
                TeamCommands::Show { id } => {
                    team::run_show(team::ShowOptions { id, dir, json, quiet })
                }
                TeamCommands::Update {
                    id,
                    name,
                    description,
                    admin,
                } => team::run_update(team::UpdateOptions {
                    id,
                    name,
                    description,
                    admin,
                    dir,
                    json,
                    quiet,
                }),
                TeamCommands::AddUsers { id, users } => {
                    team::run_add_users(team::MembersOptions {
                        id,
                        users,
                        dir,
                        json,
                        quiet,
                    })
                }
                TeamCommands::RemoveUsers { id, users } => {
                    team::run_remove_users(team::MembersOptions {
                        id,
                        users,
                        dir,
                        json,
                        quiet,
                    })
                }
                TeamCommands::Users { id } => {
                    team::run_users(team::ShowOptions { id, dir, json, quiet })
                }
            },
            Commands::Board(cmd) => match cmd {
                BoardCommands::Create {
                    name,
                    description,
                    team,
                } => board::run_create(board::CreateOptions {
                    name,
                    description,
                    team_id: team,
                    dir,
                    json,
                    quiet,
                }),
                BoardCommands::List { team } => board::run_list(board::ListOptions {
                    team_id: team,
                    dir,
                    json,
                    quiet,
                }),
                BoardCommands::Show { id } => {
                    board::run_show(board::BoardOptions { id, dir, json, quiet })
                }
                BoardCommands::Close { id } => {
                    board::run_close(board::BoardOptions { id, dir, json, quiet })
                }
                BoardCommands::AddTask {
                    board,
                    title,
                    description,
                    user,
                } => board::run_add_task(board::AddTaskOptions {
                    board_id: board,
                    title,
                    description,
                    user_id: user,
                    dir,
                    json,
                    quiet,
                }),
                BoardCommands::TaskStatus {
                    task,
                    status,
                    board,
                } => board::run_task_status(board::TaskStatusOptions {
                    task_id: task,
                    status,
                    board_id: board,
                    dir,
                    json,
                    quiet,
                }),
                BoardCommands::Export { id } => {
                    board::run_export(board::BoardOptions { id, dir, json, quiet })
                }
            },
            Commands::Call { operation, request } => call::run(call::CallOptions {
                operation,
                request,
                dir,
                json,
                quiet,
            }),
            Commands::Config(cmd) => match cmd {
                ConfigCommands::Show => config::run_show(dir, json, quiet),
            },
        }
    }
}
