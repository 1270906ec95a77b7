//! Grantly database layer
//!
//! Postgres repositories implementing the collaborator traits the bulk
//! upload pipeline consumes: user/system directory lookups and the access
//! grant store.

pub mod db;

pub use db::{GrantRepository, SystemRepository, UserRepository};
