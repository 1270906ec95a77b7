//! Database repositories for data access layer
//!
//! Each repository owns a `PgPool` handle and is responsible for one domain
//! entity. Directory repositories (users, systems) expose name/email lookups;
//! the grant repository exposes the batched existence check and the atomic
//! batch insert used by bulk uploads.

pub mod grants;
pub mod systems;
pub mod users;

pub use grants::GrantRepository;
pub use systems::SystemRepository;
pub use users::UserRepository;
