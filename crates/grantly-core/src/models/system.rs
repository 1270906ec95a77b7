use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// An external application or service for which access can be granted
/// (e.g. "Salesforce").
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct System {
    pub id: Uuid,
    pub name: String,
}

/// A named permission level scoped to one system (e.g. "Admin", "Viewer").
///
/// Tier names are only meaningful within their system: an "Admin" tier on
/// System A is unrelated to an "Admin" tier on System B.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AccessTier {
    pub id: Uuid,
    pub system_id: Uuid,
    pub name: String,
}

/// A named deployment/environment scoped to one system (e.g. "Production").
///
/// A grant with no instance means "all instances" of the system.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SystemInstance {
    pub id: Uuid,
    pub system_id: Uuid,
    pub name: String,
}
