use async_trait::async_trait;
use chrono::Utc;
use grantly_core::{
    models::{GrantDetails, GrantKey, NewGrant},
    AppError, GrantStore,
};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for access grants.
///
/// The two entry points used by bulk uploads are deliberately batch-shaped:
/// one round trip for the existence check over all candidate keys, one
/// transaction for the whole insert.
#[derive(Clone)]
pub struct GrantRepository {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct GrantKeyRow {
    user_id: Uuid,
    system_id: Uuid,
    tier_id: Uuid,
    instance_id: Option<Uuid>,
}

impl From<GrantKeyRow> for GrantKey {
    fn from(row: GrantKeyRow) -> Self {
        GrantKey {
            user_id: row.user_id,
            system_id: row.system_id,
            tier_id: row.tier_id,
            instance_id: row.instance_id,
        }
    }
}

impl GrantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Return the subset of `keys` that already have an active grant.
    ///
    /// One query for the whole batch: the candidate tuples are passed as
    /// parallel arrays and joined via UNNEST. `IS NOT DISTINCT FROM` makes
    /// a null instance_id match only a null instance_id ("all instances" is
    /// a distinct tuple value, not a wildcard).
    #[tracing::instrument(
        skip(self, keys),
        fields(db.table = "access_grants", db.operation = "select", batch.size = keys.len())
    )]
    pub async fn existing_active_grants(
        &self,
        keys: &[GrantKey],
    ) -> Result<Vec<GrantKey>, AppError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let user_ids: Vec<Uuid> = keys.iter().map(|k| k.user_id).collect();
        let system_ids: Vec<Uuid> = keys.iter().map(|k| k.system_id).collect();
        let tier_ids: Vec<Uuid> = keys.iter().map(|k| k.tier_id).collect();
        let instance_ids: Vec<Option<Uuid>> = keys.iter().map(|k| k.instance_id).collect();

        let rows = sqlx::query_as::<Postgres, GrantKeyRow>(
            r#"
            SELECT DISTINCT g.user_id, g.system_id, g.tier_id, g.instance_id
            FROM access_grants g
            JOIN UNNEST($1::uuid[], $2::uuid[], $3::uuid[], $4::uuid[])
                AS c(user_id, system_id, tier_id, instance_id)
              ON g.user_id = c.user_id
             AND g.system_id = c.system_id
             AND g.tier_id = c.tier_id
             AND g.instance_id IS NOT DISTINCT FROM c.instance_id
            WHERE g.status = 'active'
            "#,
        )
        .bind(&user_ids)
        .bind(&system_ids)
        .bind(&tier_ids)
        .bind(&instance_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(GrantKey::from).collect())
    }

    /// Insert a batch of grants atomically and return them hydrated with
    /// related entity names, in input order.
    ///
    /// All rows share one `granted_at` timestamp captured once for the
    /// batch. Any failure rolls the whole transaction back; a unique
    /// violation on the active-grant index (a concurrent upload won the
    /// race) surfaces as `AppError::Conflict`.
    #[tracing::instrument(
        skip(self, grants),
        fields(db.table = "access_grants", db.operation = "insert", batch.size = grants.len())
    )]
    pub async fn create_many(
        &self,
        grants: &[NewGrant],
        granted_by: Uuid,
    ) -> Result<Vec<GrantDetails>, AppError> {
        if grants.is_empty() {
            return Ok(Vec::new());
        }

        let user_ids: Vec<Uuid> = grants.iter().map(|g| g.user_id).collect();
        let system_ids: Vec<Uuid> = grants.iter().map(|g| g.system_id).collect();
        let instance_ids: Vec<Option<Uuid>> = grants.iter().map(|g| g.instance_id).collect();
        let tier_ids: Vec<Uuid> = grants.iter().map(|g| g.tier_id).collect();
        let notes: Vec<Option<String>> = grants.iter().map(|g| g.notes.clone()).collect();

        let granted_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        let insert_result = sqlx::query_scalar::<Postgres, Uuid>(
            r#"
            INSERT INTO access_grants
                (user_id, system_id, instance_id, tier_id, status, granted_by, granted_at, notes)
            SELECT c.user_id, c.system_id, c.instance_id, c.tier_id, 'active', $5, $6, c.notes
            FROM UNNEST($1::uuid[], $2::uuid[], $3::uuid[], $4::uuid[], $7::text[])
                AS c(user_id, system_id, instance_id, tier_id, notes)
            RETURNING id
            "#,
        )
        .bind(&user_ids)
        .bind(&system_ids)
        .bind(&instance_ids)
        .bind(&tier_ids)
        .bind(granted_by)
        .bind(granted_at)
        .bind(&notes)
        .fetch_all(&mut *tx)
        .await;

        let ids = match insert_result {
            Ok(ids) => ids,
            Err(err) => {
                tx.rollback().await.ok();
                return Err(map_insert_error(err));
            }
        };

        let details = sqlx::query_as::<Postgres, GrantDetails>(
            r#"
            SELECT g.id,
                   g.user_id, u.email AS user_email, u.name AS user_name,
                   g.system_id, s.name AS system_name,
                   g.tier_id, t.name AS tier_name,
                   g.instance_id, i.name AS instance_name,
                   g.status, g.granted_by, g.granted_at, g.notes
            FROM UNNEST($1::uuid[]) WITH ORDINALITY AS ord(id, n)
            JOIN access_grants g ON g.id = ord.id
            JOIN users u ON u.id = g.user_id
            JOIN systems s ON s.id = g.system_id
            JOIN access_tiers t ON t.id = g.tier_id
            LEFT JOIN system_instances i ON i.id = g.instance_id
            ORDER BY ord.n
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(details)
    }
}

/// Map a failed batch insert to a domain error. A unique violation means a
/// concurrent request created an identical active grant between our
/// existence check and this insert; the partial unique index on active
/// grants is the final arbiter.
fn map_insert_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.kind() == sqlx::error::ErrorKind::UniqueViolation {
            return AppError::Conflict(
                "An identical active grant was created concurrently; no records were inserted"
                    .to_string(),
            );
        }
    }
    AppError::from(err)
}

#[async_trait]
impl GrantStore for GrantRepository {
    async fn existing_active_grants(&self, keys: &[GrantKey]) -> Result<Vec<GrantKey>, AppError> {
        GrantRepository::existing_active_grants(self, keys).await
    }

    async fn create_many(
        &self,
        grants: &[NewGrant],
        granted_by: Uuid,
    ) -> Result<Vec<GrantDetails>, AppError> {
        GrantRepository::create_many(self, grants, granted_by).await
    }
}
