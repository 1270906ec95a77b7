use async_trait::async_trait;
use grantly_core::{
    models::{AccessTier, System, SystemInstance},
    AppError, SystemDirectory,
};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for system directory lookups.
///
/// Tier and instance lookups are scoped to a system: a tier named "Admin"
/// under one system never matches a lookup against another system.
#[derive(Clone)]
pub struct SystemRepository {
    pool: PgPool,
}

impl SystemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a system by name, case-insensitively
    #[tracing::instrument(skip(self), fields(db.table = "systems", db.operation = "select"))]
    pub async fn find_by_name(&self, name: &str) -> Result<Option<System>, AppError> {
        let system = sqlx::query_as::<Postgres, System>(
            "SELECT id, name FROM systems WHERE lower(name) = lower($1)",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(system)
    }

    /// Find an access tier by name within one system, case-insensitively
    #[tracing::instrument(skip(self), fields(db.table = "access_tiers", db.operation = "select"))]
    pub async fn find_tier_by_name(
        &self,
        system_id: Uuid,
        name: &str,
    ) -> Result<Option<AccessTier>, AppError> {
        let tier = sqlx::query_as::<Postgres, AccessTier>(
            "SELECT id, system_id, name FROM access_tiers WHERE system_id = $1 AND lower(name) = lower($2)",
        )
        .bind(system_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tier)
    }

    /// Find a system instance by name within one system, case-insensitively
    #[tracing::instrument(skip(self), fields(db.table = "system_instances", db.operation = "select"))]
    pub async fn find_instance_by_name(
        &self,
        system_id: Uuid,
        name: &str,
    ) -> Result<Option<SystemInstance>, AppError> {
        let instance = sqlx::query_as::<Postgres, SystemInstance>(
            "SELECT id, system_id, name FROM system_instances WHERE system_id = $1 AND lower(name) = lower($2)",
        )
        .bind(system_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(instance)
    }
}

#[async_trait]
impl SystemDirectory for SystemRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<System>, AppError> {
        SystemRepository::find_by_name(self, name).await
    }

    async fn find_tier_by_name(
        &self,
        system_id: Uuid,
        name: &str,
    ) -> Result<Option<AccessTier>, AppError> {
        SystemRepository::find_tier_by_name(self, system_id, name).await
    }

    async fn find_instance_by_name(
        &self,
        system_id: Uuid,
        name: &str,
    ) -> Result<Option<SystemInstance>, AppError> {
        SystemRepository::find_instance_by_name(self, system_id, name).await
    }
}
