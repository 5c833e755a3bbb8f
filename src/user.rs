//! User records and the user store.
//!
//! Users are never deleted. Names are unique across the collection and fixed
//! at creation; only the display name can change afterwards.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::LimitsConfig;
use crate::error::{Error, Result};
use crate::request::{self, IdResponse};
use crate::storage::{Collection, CollectionBackend, CollectionHandle};
use crate::team::{TeamDirectory, TeamSummary};

pub const USER_KIND: &str = "user";

/// A user as stored in `users.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,
    pub display_name: String,
    #[serde(with = "crate::timestamp")]
    pub creation_time: DateTime<Utc>,
}

/// A user as returned by `list` and `describe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(with = "crate::timestamp")]
    pub creation_time: DateTime<Utc>,
}

impl User {
    fn from_record(id: &str, record: &UserRecord) -> Self {
        Self {
            id: id.to_string(),
            name: record.name.clone(),
            display_name: record.display_name.clone(),
            creation_time: record.creation_time,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.display_name.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user: UserPatch,
}

/// Read access to users for other stores.
pub trait UserDirectory: Send + Sync {
    fn describe_user(&self, id: &str) -> Result<User>;
}

pub struct UserStore {
    users: CollectionHandle<UserRecord>,
    limits: LimitsConfig,
}

impl UserStore {
    pub fn new(backend: Arc<dyn CollectionBackend<UserRecord>>, limits: LimitsConfig) -> Self {
        Self {
            users: CollectionHandle::new(backend),
            limits,
        }
    }

    pub fn create(&self, req: CreateUserRequest) -> Result<IdResponse> {
        let name = request::text("name", &req.name, self.limits.name_max)?;
        let display_name =
            request::text("display_name", &req.display_name, self.limits.display_name_max)?;

        let id = self.users.update(|users| {
            ensure_name_free(users, name)?;
            let id = users.next_record_id();
            users.insert(
                id.clone(),
                UserRecord {
                    name: name.to_string(),
                    display_name: display_name.to_string(),
                    creation_time: Utc::now(),
                },
            );
            Ok(id)
        })?;

        info!(user_id = %id, name = %name, "created user");
        Ok(IdResponse::new(id))
    }

    pub fn list(&self) -> Result<Vec<User>> {
        self.users.read(|users| {
            Ok(users
                .ordered()
                .into_iter()
                .map(|(id, record)| User::from_record(id, record))
                .collect())
        })
    }

    pub fn describe(&self, id: &str) -> Result<User> {
        let id = request::required("user id", id)?;
        self.users.read(|users| {
            users
                .get(id)
                .map(|record| User::from_record(id, record))
                .ok_or_else(|| Error::not_found(USER_KIND, id))
        })
    }

    /// Apply a partial update. The name is immutable: a patch carrying a
    /// different name is rejected.
    pub fn update(&self, req: UpdateUserRequest) -> Result<IdResponse> {
        let id = request::required("user id", &req.id)?.to_string();
        if req.user.is_empty() {
            return Err(Error::InvalidArgument(
                "update requires name or display_name".to_string(),
            ));
        }
        let name = request::optional_text("name", req.user.name.as_deref(), self.limits.name_max)?;
        let display_name = request::optional_text(
            "display_name",
            req.user.display_name.as_deref(),
            self.limits.display_name_update_max,
        )?;

        self.users.update(|users| {
            let record = users
                .get_mut(&id)
                .ok_or_else(|| Error::not_found(USER_KIND, id.as_str()))?;
            if let Some(name) = name {
                if name != record.name {
                    return Err(Error::InvalidArgument(format!(
                        "user name cannot be changed (is '{}')",
                        record.name
                    )));
                }
            }
            if let Some(display_name) = display_name {
                record.display_name = display_name.to_string();
            }
            Ok(())
        })?;

        info!(user_id = %id, "updated user");
        Ok(IdResponse::new(id))
    }

    /// Teams the user belongs to.
    pub fn get_teams(&self, id: &str, teams: &dyn TeamDirectory) -> Result<Vec<TeamSummary>> {
        let user = self.describe(id)?;
        teams.teams_for_user(&user.id)
    }

    pub fn count(&self) -> Result<usize> {
        self.users.read(|users| Ok(users.len()))
    }
}

impl UserDirectory for UserStore {
    fn describe_user(&self, id: &str) -> Result<User> {
        self.describe(id)
    }
}

fn ensure_name_free(users: &Collection<UserRecord>, name: &str) -> Result<()> {
    if users.values().any(|user| user.name == name) {
        return Err(Error::already_exists(USER_KIND, name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;

    fn store() -> UserStore {
        UserStore::new(Arc::new(MemoryBackend::new("users")), LimitsConfig::default())
    }

    fn create(store: &UserStore, name: &str, display_name: &str) -> Result<IdResponse> {
        store.create(CreateUserRequest {
            name: name.to_string(),
            display_name: display_name.to_string(),
        })
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let store = store();
        assert_eq!(create(&store, "alice", "Alice A").unwrap().id, "1");
        assert_eq!(create(&store, "bob", "Bob B").unwrap().id, "2");

        let user = store.describe("2").unwrap();
        assert_eq!(user.name, "bob");
        assert_eq!(user.display_name, "Bob B");
    }

    #[test]
    fn duplicate_name_rejected_without_growth() {
        let store = store();
        create(&store, "alice", "Alice A").unwrap();
        let err = create(&store, "alice", "Alice B").unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn create_validates_fields() {
        let store = store();
        assert!(matches!(
            create(&store, "", "Nobody"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(create(&store, "x", &"d".repeat(65)).is_err());
        assert!(create(&store, &"n".repeat(65), "d").is_err());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn update_display_name_allows_longer_limit() {
        let store = store();
        create(&store, "alice", "Alice").unwrap();
        store
            .update(UpdateUserRequest {
                id: "1".to_string(),
                user: UserPatch {
                    name: None,
                    display_name: Some("a".repeat(100)),
                },
            })
            .unwrap();
        assert_eq!(store.describe("1").unwrap().display_name.len(), 100);
    }

    #[test]
    fn update_rejects_name_change() {
        let store = store();
        create(&store, "alice", "Alice").unwrap();
        let err = store
            .update(UpdateUserRequest {
                id: "1".to_string(),
                user: UserPatch {
                    name: Some("alicia".to_string()),
                    display_name: None,
                },
            })
            .unwrap_err();
        assert!(err.to_string().contains("cannot be changed"));
        assert_eq!(store.describe("1").unwrap().name, "alice");
    }

    #[test]
    fn update_unknown_user_is_not_found() {
        let store = store();
        let err = store
            .update(UpdateUserRequest {
                id: "9".to_string(),
                user: UserPatch {
                    name: None,
                    display_name: Some("Ghost".to_string()),
                },
            })
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "user", .. }));
    }

    #[test]
    fn list_returns_users_in_id_order() {
        let store = store();
        for idx in 0..11 {
            create(&store, &format!("user{idx}"), "U").unwrap();
        }
        let ids: Vec<String> = store.list().unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(ids.first().map(String::as_str), Some("1"));
        assert_eq!(ids.last().map(String::as_str), Some("11"));
    }

    #[test]
    fn names_are_stored_trimmed() {
        let store = store();
        create(&store, "  alice ", " Alice A ").unwrap();
        assert!(matches!(
            create(&store, "alice", "Other"),
            Err(Error::AlreadyExists { .. })
        ));
        let user = store.describe("1").unwrap();
        assert_eq!(user.name, "alice");
        assert_eq!(user.display_name, "Alice A");
    }

    #[test]
    fn failed_save_leaves_users_and_sequence_unchanged() {
        let backend = Arc::new(MemoryBackend::new("users"));
        let store = UserStore::new(backend.clone(), LimitsConfig::default());
        create(&store, "alice", "Alice A").unwrap();

        backend.set_fail_writes(true);
        assert!(matches!(create(&store, "bob", "Bob B"), Err(Error::Io(_))));
        let patch = UpdateUserRequest {
            id: "1".to_string(),
            user: UserPatch {
                name: None,
                display_name: Some("Alicia".to_string()),
            },
        };
        assert!(store.update(patch).is_err());

        backend.set_fail_writes(false);
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.describe("1").unwrap().display_name, "Alice A");
        assert_eq!(create(&store, "bob", "Bob B").unwrap().id, "2");
    }
}
