//! teamboard - users, teams and project boards
//!
//! This library provides the stores behind the teamboard CLI. Each entity
//! type is persisted as one JSON collection that is loaded, changed and
//! rewritten as a whole under a writer lock.
//!
//! # Core Concepts
//!
//! - **Users**: uniquely named people with a display name
//! - **Teams**: named groups with an admin and a set of member user ids
//! - **Boards**: per-team units of delivery holding tasks; a board closes
//!   once every task is COMPLETE
//!
//! # Module Organization
//!
//! - `api`: JSON operation dispatch over the three stores
//! - `board`: Board and task store
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.teamboard.toml`
//! - `error`: Error types and result aliases
//! - `export`: Plain-text board exports
//! - `lock`: File locking and atomic writes
//! - `output`: Human and JSON output for CLI commands
//! - `request`: Shared request shapes and field checks
//! - `storage`: Collection documents and their backends
//! - `team`: Team store
//! - `timestamp`: Timestamp encoding for stored records
//! - `user`: User store

pub mod api;
pub mod board;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod lock;
pub mod output;
pub mod request;
pub mod storage;
pub mod team;
pub mod timestamp;
pub mod user;

pub use error::{Error, Result};
