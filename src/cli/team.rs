//! teamboard team command implementations.

use std::path::PathBuf;

use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::team::{
    CreateTeamRequest, TeamMember, TeamPatch, TeamSummary, TeamUsersRequest, UpdateTeamRequest,
};

use super::open_app;

pub struct CreateOptions {
    pub name: String,
    pub description: String,
    pub admin: String,
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
    pub description: Option<String>,
    pub admin: Option<String>,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct MembersOptions {
    pub id: String,
    pub users: Vec<String>,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct TeamCreateOutput {
    id: String,
    name: String,
    admin: String,
}

#[derive(serde::Serialize)]
struct TeamListOutput {
    total: usize,
    teams: Vec<TeamSummary>,
}

#[derive(serde::Serialize)]
struct TeamShowOutput {
    id: String,
    #[serde(flatten)]
    team: crate::team::TeamRecord,
}

#[derive(serde::Serialize)]
struct TeamMembersOutput {
    id: String,
    total: usize,
    users: Vec<TeamMember>,
}

#[derive(serde::Serialize)]
struct MembershipChangeOutput {
    id: String,
    requested: Vec<String>,
    members: usize,
}

pub fn run_create(options: CreateOptions) -> Result<()> {
    let app = open_app(options.dir)?;
    let created = app.teams.create(CreateTeamRequest {
        name: options.name.clone(),
        description: options.description,
        admin: options.admin.clone(),
    })?;
    let output = TeamCreateOutput {
        id: created.id,
        name: options.name,
        admin: options.admin,
    };
    let mut human = HumanOutput::new("Team created");
    human.push_summary("ID", output.id.clone());
    human.push_summary("Name", output.name.clone());
    human.push_summary("Admin", output.admin.clone());
    human.push_next_step(format!("teamboard team add-users {} <user-id>...", output.id));
    human.push_next_step(format!(
        "teamboard board create <name> --team {} --description <text>",
        output.id
    ));
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "team create",
        &output,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let app = open_app(options.dir)?;
    let teams = app.teams.list()?;
    let output = TeamListOutput {
        total: teams.len(),
        teams,
    };
    let mut human = HumanOutput::new("Teams");
    human.push_summary("Total", output.total.to_string());
    for team in &output.teams {
        human.push_detail(format!("{} {} - {}", team.id, team.name, team.description));
    }
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "team list",
        &output,
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let app = open_app(options.dir)?;
    let team = app.teams.describe(&options.id)?;
    let output = TeamShowOutput {
        id: options.id.trim().to_string(),
        team,
    };
    let mut human = HumanOutput::new(format!("Team {}", output.id));
    human.push_summary("Name", output.team.name.clone());
    human.push_summary("Description", output.team.description.clone());
    human.push_summary("Admin", output.team.admin.clone());
    human.push_summary("Created", output.team.creation_time.to_rfc3339());
    human.push_summary("Members", output.team.users.len().to_string());
    for user in &output.team.users {
        human.push_detail(format!("user {user}"));
    }
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "team show",
        &output,
        Some(&human),
    )
}

pub fn run_update(options: UpdateOptions) -> Result<()> {
    let app = open_app(options.dir)?;
    let updated = app.teams.update(UpdateTeamRequest {
        id: options.id,
        team: TeamPatch {
            name: options.name,
            description: options.description,
            admin: options.admin,
        },
    })?;
    let mut human = HumanOutput::new("Team updated");
    human.push_summary("ID", updated.id.clone());
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "team update",
        &updated,
        Some(&human),
    )
}

pub fn run_add_users(options: MembersOptions) -> Result<()> {
    change_members(options, true)
}

pub fn run_remove_users(options: MembersOptions) -> Result<()> {
    change_members(options, false)
}

fn change_members(options: MembersOptions, add: bool) -> Result<()> {
    let app = open_app(options.dir)?;
    let request = TeamUsersRequest {
        id: options.id,
        users: options.users.clone(),
    };
    let changed = if add {
        app.teams.add_users(request)?
    } else {
        app.teams.remove_users(request)?
    };
    let members = app.teams.describe(&changed.id)?.users.len();
    let output = MembershipChangeOutput {
        id: changed.id,
        requested: options.users,
        members,
    };

    let (header, command) = if add {
        ("Users added", "team add-users")
    } else {
        ("Users removed", "team remove-users")
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("Team", output.id.clone());
    human.push_summary("Requested", output.requested.join(", "));
    human.push_summary("Members", output.members.to_string());
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        command,
        &output,
        Some(&human),
    )
}

pub fn run_users(options: ShowOptions) -> Result<()> {
    let app = open_app(options.dir)?;
    let users = app.teams.list_users(&options.id)?;
    let output = TeamMembersOutput {
        id: options.id.trim().to_string(),
        total: users.len(),
        users,
    };
    let mut human = HumanOutput::new(format!("Members of team {}", output.id));
    human.push_summary("Total", output.total.to_string());
    for user in &output.users {
        human.push_detail(format!("{} {} ({})", user.id, user.name, user.display_name));
    }
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "team users",
        &output,
        Some(&human),
    )
}
