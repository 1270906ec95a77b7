//! Bulk grant upload pipeline.
//!
//! Flow: raw CSV text (or a JSON row array) -> parser -> resolution cache
//! -> row validation -> all-or-nothing insert. Any error row blocks the
//! whole batch; the report always carries the complete valid/error row
//! breakdown so the caller can fix the file in one round trip.

pub mod cache;
pub mod engine;
pub mod parser;

use std::sync::Arc;

use grantly_core::{
    models::{BulkUploadReport, NewGrant, RawGrantRow, UploadRow, UploadSummary},
    AppError, GrantStore, SystemDirectory, UserDirectory,
};
use uuid::Uuid;

use cache::ResolutionCache;

/// Service driving one bulk upload from raw input to report.
#[derive(Clone)]
pub struct BulkUploadService {
    users: Arc<dyn UserDirectory>,
    systems: Arc<dyn SystemDirectory>,
    grants: Arc<dyn GrantStore>,
}

impl BulkUploadService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        systems: Arc<dyn SystemDirectory>,
        grants: Arc<dyn GrantStore>,
    ) -> Self {
        Self {
            users,
            systems,
            grants,
        }
    }

    /// Process a CSV upload on behalf of `granted_by`.
    ///
    /// Structural parse errors short-circuit before validation with a
    /// zero-row failure report. Row-level errors never abort the scan;
    /// every row is validated and reported.
    #[tracing::instrument(skip(self, content), fields(operation = "bulk_upload_csv"))]
    pub async fn process_csv(
        &self,
        content: &str,
        granted_by: Uuid,
    ) -> Result<BulkUploadReport, AppError> {
        let parsed = parser::parse_csv(content);
        if !parsed.errors.is_empty() {
            tracing::debug!(errors = ?parsed.errors, "Bulk upload failed to parse");
            return Ok(structural_failure(parsed.errors));
        }
        self.run(parsed.rows, granted_by).await
    }

    /// Process the JSON-array transport: same validation and insert logic,
    /// with rows numbered from 2 to mirror CSV line numbering.
    #[tracing::instrument(skip(self, rows), fields(operation = "bulk_upload_rows", rows = rows.len()))]
    pub async fn process_rows(
        &self,
        rows: Vec<RawGrantRow>,
        granted_by: Uuid,
    ) -> Result<BulkUploadReport, AppError> {
        if rows.is_empty() {
            return Ok(structural_failure(vec![
                "Upload contains no rows".to_string()
            ]));
        }
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, raw)| UploadRow::from_raw(i as u32 + 2, raw))
            .collect();
        self.run(rows, granted_by).await
    }

    async fn run(
        &self,
        rows: Vec<UploadRow>,
        granted_by: Uuid,
    ) -> Result<BulkUploadReport, AppError> {
        let total_rows = rows.len();

        let cache = ResolutionCache::build(
            &rows,
            self.users.as_ref(),
            self.systems.as_ref(),
            self.grants.as_ref(),
        )
        .await?;

        let outcome = engine::validate_rows(rows, &cache);

        if !outcome.error_rows.is_empty() {
            tracing::warn!(
                total_rows,
                valid_rows = outcome.valid_rows.len(),
                error_rows = outcome.error_rows.len(),
                "Bulk upload blocked by row errors"
            );
            let message = format!(
                "{} of {} rows failed validation; no records were inserted",
                outcome.error_rows.len(),
                total_rows
            );
            return Ok(BulkUploadReport {
                success: false,
                message,
                summary: UploadSummary {
                    total_rows,
                    valid_rows: outcome.valid_rows.len(),
                    error_rows: outcome.error_rows.len(),
                    inserted_count: 0,
                },
                valid_rows: outcome.valid_rows,
                error_rows: outcome.error_rows,
                created_grants: None,
            });
        }

        let new_grants: Vec<NewGrant> = outcome
            .valid_rows
            .iter()
            .map(|v| NewGrant {
                user_id: v.resolved.user_id,
                system_id: v.resolved.system_id,
                instance_id: v.resolved.instance_id,
                tier_id: v.resolved.tier_id,
                notes: v.resolved.notes.clone(),
            })
            .collect();

        // Rows are pre-validated; the store does no re-checking beyond its
        // own uniqueness backstop. A mid-batch failure rolls everything
        // back and propagates as a whole-batch error.
        let created = self.grants.create_many(&new_grants, granted_by).await?;

        tracing::info!(
            total_rows,
            inserted = created.len(),
            "Bulk upload committed"
        );

        Ok(BulkUploadReport {
            success: true,
            message: format!("{} access grants created", created.len()),
            summary: UploadSummary {
                total_rows,
                valid_rows: outcome.valid_rows.len(),
                error_rows: 0,
                inserted_count: created.len(),
            },
            valid_rows: outcome.valid_rows,
            error_rows: Vec::new(),
            created_grants: Some(created),
        })
    }
}

/// Failure report for an upload that never reached validation.
fn structural_failure(errors: Vec<String>) -> BulkUploadReport {
    BulkUploadReport {
        success: false,
        message: errors.join("; "),
        summary: UploadSummary {
            total_rows: 0,
            valid_rows: 0,
            error_rows: 0,
            inserted_count: 0,
        },
        valid_rows: Vec::new(),
        error_rows: Vec::new(),
        created_grants: None,
    }
}
