//! teamboard user command implementations.

use std::path::PathBuf;

use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::team::TeamSummary;
use crate::user::{CreateUserRequest, UpdateUserRequest, User, UserPatch};

use super::open_app;

pub struct CreateOptions {
    pub name: String,
    pub display_name: String,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ShowOptions {
    pub id: String,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct UpdateOptions {
    pub id: String,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct UserCreateOutput {
    id: String,
    name: String,
    display_name: String,
}

#[derive(serde::Serialize)]
struct UserListOutput {
    total: usize,
    users: Vec<User>,
}

#[derive(serde::Serialize)]
struct UserTeamsOutput {
    user: String,
    total: usize,
    teams: Vec<TeamSummary>,
}

pub fn run_create(options: CreateOptions) -> Result<()> {
    let app = open_app(options.dir)?;
    let created = app.users.create(CreateUserRequest {
        name: options.name.clone(),
        display_name: options.display_name.clone(),
    })?;
    let output = UserCreateOutput {
        id: created.id.clone(),
        name: options.name,
        display_name: options.display_name,
    };
    let mut human = HumanOutput::new("User created");
    human.push_summary("ID", output.id.clone());
    human.push_summary("Name", output.name.clone());
    human.push_summary("Display name", output.display_name.clone());
    human.push_next_step(format!("teamboard team add-users <team-id> {}", output.id));
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "user create",
        &output,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let app = open_app(options.dir)?;
    let users = app.users.list()?;
    let output = UserListOutput {
        total: users.len(),
        users,
    };
    let mut human = HumanOutput::new("Users");
    human.push_summary("Total", output.total.to_string());
    for user in &output.users {
        human.push_detail(format!("{} {} ({})", user.id, user.name, user.display_name));
    }
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "user list",
        &output,
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let app = open_app(options.dir)?;
    let user = app.users.describe(&options.id)?;
    let mut human = HumanOutput::new(format!("User {}", user.id));
    human.push_summary("Name", user.name.clone());
    human.push_summary("Display name", user.display_name.clone());
    human.push_summary("Created", user.creation_time.to_rfc3339());
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "user show",
        &user,
        Some(&human),
    )
}

pub fn run_update(options: UpdateOptions) -> Result<()> {
    let app = open_app(options.dir)?;
    let updated = app.users.update(UpdateUserRequest {
        id: options.id,
        user: UserPatch {
            name: options.name,
            display_name: options.display_name,
        },
    })?;
    let mut human = HumanOutput::new("User updated");
    human.push_summary("ID", updated.id.clone());
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "user update",
        &updated,
        Some(&human),
    )
}

pub fn run_teams(options: ShowOptions) -> Result<()> {
    let app = open_app(options.dir)?;
    let teams = app.users.get_teams(&options.id, app.teams.as_ref())?;
    let output = UserTeamsOutput {
        user: options.id.trim().to_string(),
        total: teams.len(),
        teams,
    };
    let mut human = HumanOutput::new(format!("Teams of user {}", output.user));
    human.push_summary("Total", output.total.to_string());
    for team in &output.teams {
        human.push_detail(format!("{} {} (admin {})", team.id, team.name, team.admin));
    }
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "user teams",
        &output,
        Some(&human),
    )
}
