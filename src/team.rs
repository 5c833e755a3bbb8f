//! Team records and the team store.
//!
//! Membership is a set of user ids. Ids are not checked against the user
//! store when added; `list_users` resolves them and fails if any is unknown.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::LimitsConfig;
use crate::error::{Error, Result};
use crate::request::{self, IdResponse};
use crate::storage::{Collection, CollectionBackend, CollectionHandle};
use crate::user::UserDirectory;

pub const TEAM_KIND: &str = "team";

/// A team as stored in `teams.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub name: String,
    pub description: String,
    pub admin: String,
    #[serde(with = "crate::timestamp")]
    pub creation_time: DateTime<Utc>,
    #[serde(default)]
    pub users: BTreeSet<String>,
}

/// Team fields returned by `list`, `describe` and user membership lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub admin: String,
    #[serde(with = "crate::timestamp")]
    pub creation_time: DateTime<Utc>,
}

impl TeamSummary {
    fn from_record(id: &str, record: &TeamRecord) -> Self {
        Self {
            id: id.to_string(),
            name: record.name.clone(),
            description: record.description.clone(),
            admin: record.admin.clone(),
            creation_time: record.creation_time,
        }
    }
}

/// A team member resolved through the user store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTeamRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub admin: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeamPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<String>,
}

impl TeamPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.admin.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTeamRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub team: TeamPatch,
}

/// `{"id": team, "users": [...]}` for add and remove.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamUsersRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub users: Vec<String>,
}

/// Membership lookups for other stores.
pub trait TeamDirectory: Send + Sync {
    fn teams_for_user(&self, user_id: &str) -> Result<Vec<TeamSummary>>;
}

pub struct TeamStore {
    teams: CollectionHandle<TeamRecord>,
    users: Arc<dyn UserDirectory>,
    limits: LimitsConfig,
}

impl TeamStore {
    pub fn new(
        backend: Arc<dyn CollectionBackend<TeamRecord>>,
        users: Arc<dyn UserDirectory>,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            teams: CollectionHandle::new(backend),
            users,
            limits,
        }
    }

    pub fn create(&self, req: CreateTeamRequest) -> Result<IdResponse> {
        let name = request::text("name", &req.name, self.limits.name_max)?;
        let description =
            request::text("description", &req.description, self.limits.description_max)?;
        let admin = request::required("admin", &req.admin)?;

        let id = self.teams.update(|teams| {
            ensure_name_free(teams, name, None)?;
            let id = teams.next_record_id();
            teams.insert(
                id.clone(),
                TeamRecord {
                    name: name.to_string(),
                    description: description.to_string(),
                    admin: admin.to_string(),
                    creation_time: Utc::now(),
                    users: BTreeSet::new(),
                },
            );
            Ok(id)
        })?;

        info!(team_id = %id, name = %name, "created team");
        Ok(IdResponse::new(id))
    }

    pub fn list(&self) -> Result<Vec<TeamSummary>> {
        self.teams.read(|teams| {
            Ok(teams
                .ordered()
                .into_iter()
                .map(|(id, record)| TeamSummary::from_record(id, record))
                .collect())
        })
    }

    pub fn describe(&self, id: &str) -> Result<TeamRecord> {
        let id = request::required("team id", id)?;
        self.teams
            .read(|teams| teams.get(id).cloned().ok_or_else(|| Error::not_found(TEAM_KIND, id)))
    }

    pub fn update(&self, req: UpdateTeamRequest) -> Result<IdResponse> {
        let id = request::required("team id", &req.id)?.to_string();
        if req.team.is_empty() {
            return Err(Error::InvalidArgument(
                "update requires name, description or admin".to_string(),
            ));
        }
        let name = request::optional_text("name", req.team.name.as_deref(), self.limits.name_max)?;
        let description = request::optional_text(
            "description",
            req.team.description.as_deref(),
            self.limits.description_max,
        )?;
        let admin = req
            .team
            .admin
            .as_deref()
            .map(|admin| request::required("admin", admin))
            .transpose()?;

        self.teams.update(|teams| {
            if !teams.records.contains_key(&id) {
                return Err(Error::not_found(TEAM_KIND, id.as_str()));
            }
            if let Some(name) = name {
                ensure_name_free(teams, name, Some(id.as_str()))?;
            }
            let record = teams
                .get_mut(&id)
                .ok_or_else(|| Error::not_found(TEAM_KIND, id.as_str()))?;
            if let Some(name) = name {
                record.name = name.to_string();
            }
            if let Some(description) = description {
                record.description = description.to_string();
            }
            if let Some(admin) = admin {
                record.admin = admin.to_string();
            }
            Ok(())
        })?;

        info!(team_id = %id, "updated team");
        Ok(IdResponse::new(id))
    }

    /// Union `users` into the membership. One request carries at most
    /// `limits.max_users_per_add` entries; the team itself has no cap.
    pub fn add_users(&self, req: TeamUsersRequest) -> Result<IdResponse> {
        let id = request::required("team id", &req.id)?.to_string();
        if req.users.len() > self.limits.max_users_per_add {
            return Err(Error::InvalidArgument(format!(
                "cannot add more than {} users at once (got {})",
                self.limits.max_users_per_add,
                req.users.len()
            )));
        }
        let incoming = member_ids(&req.users)?;

        let size = self.teams.update(|teams| {
            let record = teams
                .get_mut(&id)
                .ok_or_else(|| Error::not_found(TEAM_KIND, id.as_str()))?;
            record.users.extend(incoming);
            Ok(record.users.len())
        })?;

        info!(team_id = %id, members = size, "added users to team");
        Ok(IdResponse::new(id))
    }

    /// Remove `users` from the membership; ids that are not members are ignored.
    pub fn remove_users(&self, req: TeamUsersRequest) -> Result<IdResponse> {
        let id = request::required("team id", &req.id)?.to_string();
        let outgoing = member_ids(&req.users)?;

        let size = self.teams.update(|teams| {
            let record = teams
                .get_mut(&id)
                .ok_or_else(|| Error::not_found(TEAM_KIND, id.as_str()))?;
            record.users.retain(|user| !outgoing.contains(user));
            Ok(record.users.len())
        })?;

        info!(team_id = %id, members = size, "removed users from team");
        Ok(IdResponse::new(id))
    }

    /// Resolve every member through the user directory.
    ///
    /// The team collection lock is released before any user lookup.
    pub fn list_users(&self, id: &str) -> Result<Vec<TeamMember>> {
        let team = self.describe(id)?;
        debug!(team_id = %id.trim(), members = team.users.len(), "resolving team members");
        team.users
            .iter()
            .map(|user_id| {
                let user = self.users.describe_user(user_id)?;
                Ok(TeamMember {
                    id: user.id,
                    name: user.name,
                    display_name: user.display_name,
                })
            })
            .collect()
    }
}

impl TeamDirectory for TeamStore {
    fn teams_for_user(&self, user_id: &str) -> Result<Vec<TeamSummary>> {
        self.teams.read(|teams| {
            Ok(teams
                .ordered()
                .into_iter()
                .filter(|(_, record)| record.users.contains(user_id))
                .map(|(id, record)| TeamSummary::from_record(id, record))
                .collect())
        })
    }
}

fn member_ids(users: &[String]) -> Result<BTreeSet<String>> {
    users
        .iter()
        .map(|user| request::required("user id", user).map(str::to_string))
        .collect()
}

fn ensure_name_free(teams: &Collection<TeamRecord>, name: &str, except: Option<&str>) -> Result<()> {
    let taken = teams
        .records
        .iter()
        .any(|(id, team)| Some(id.as_str()) != except && team.name == name);
    if taken {
        return Err(Error::already_exists(TEAM_KIND, name));
    }
    Ok(())
}
