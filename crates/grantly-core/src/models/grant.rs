use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle state of an access grant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "grant_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum GrantStatus {
    Active,
    Removed,
}

/// Persisted access grant: a user holds a tier on a system, optionally
/// scoped to one instance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AccessGrant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub system_id: Uuid,
    pub instance_id: Option<Uuid>,
    pub tier_id: Uuid,
    pub status: GrantStatus,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Composite identity of an active grant: at most one active grant may
/// exist per key.
///
/// `instance_id = None` ("all instances") is a distinct key value, not a
/// wildcard. A typed key with derived equality replaces delimiter-joined
/// strings so an instance literally named "null" cannot collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GrantKey {
    pub user_id: Uuid,
    pub system_id: Uuid,
    pub tier_id: Uuid,
    pub instance_id: Option<Uuid>,
}

/// Input for a single grant insertion within a batch.
#[derive(Debug, Clone)]
pub struct NewGrant {
    pub user_id: Uuid,
    pub system_id: Uuid,
    pub instance_id: Option<Uuid>,
    pub tier_id: Uuid,
    pub notes: Option<String>,
}

impl NewGrant {
    pub fn key(&self) -> GrantKey {
        GrantKey {
            user_id: self.user_id,
            system_id: self.system_id,
            tier_id: self.tier_id,
            instance_id: self.instance_id,
        }
    }
}

/// Access grant hydrated with the canonical names of its related entities,
/// for response display.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct GrantDetails {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub system_id: Uuid,
    pub system_name: String,
    pub tier_id: Uuid,
    pub tier_name: String,
    pub instance_id: Option<Uuid>,
    pub instance_name: Option<String>,
    pub status: GrantStatus,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_key_distinguishes_missing_instance() {
        let user_id = Uuid::new_v4();
        let system_id = Uuid::new_v4();
        let tier_id = Uuid::new_v4();
        let scoped = GrantKey {
            user_id,
            system_id,
            tier_id,
            instance_id: Some(Uuid::new_v4()),
        };
        let all_instances = GrantKey {
            user_id,
            system_id,
            tier_id,
            instance_id: None,
        };
        assert_ne!(scoped, all_instances);
    }

    #[test]
    fn test_grant_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&GrantStatus::Active).unwrap(),
            "\"active\""
        );
        assert_eq!(
            serde_json::to_string(&GrantStatus::Removed).unwrap(),
            "\"removed\""
        );
    }
}
