//! Collaborator traits for the bulk upload pipeline.
//!
//! The pipeline never talks to storage directly; it resolves references and
//! writes grants through these seams. `grantly-db` provides the Postgres
//! implementations; tests substitute in-memory ones.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{AccessTier, GrantDetails, GrantKey, NewGrant, System, SystemInstance, User};

/// Lookup of users by email. Matching is case-insensitive.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}

/// Lookup of systems by name, with tier and instance lookup scoped to a
/// system. All name matching is case-insensitive; returned entities carry
/// their canonical stored names.
#[async_trait]
pub trait SystemDirectory: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<System>, AppError>;

    async fn find_tier_by_name(
        &self,
        system_id: Uuid,
        name: &str,
    ) -> Result<Option<AccessTier>, AppError>;

    async fn find_instance_by_name(
        &self,
        system_id: Uuid,
        name: &str,
    ) -> Result<Option<SystemInstance>, AppError>;
}

/// Access grant persistence used by the pipeline.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Of the given candidate keys, return those that already have an
    /// active grant. One batched query, not one per key.
    async fn existing_active_grants(&self, keys: &[GrantKey]) -> Result<Vec<GrantKey>, AppError>;

    /// Insert every grant atomically with `status = active`, the supplied
    /// `granted_by`, and a single shared `granted_at` timestamp. Either all
    /// rows are persisted or none are.
    async fn create_many(
        &self,
        grants: &[NewGrant],
        granted_by: Uuid,
    ) -> Result<Vec<GrantDetails>, AppError>;
}
