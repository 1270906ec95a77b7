//! Ephemeral bulk-upload row types.
//!
//! Everything in this module lives only for the duration of one upload
//! request: rows come out of the parser (or the JSON transport), pass
//! through validation, and end up in the response as valid/error rows.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::grant::GrantDetails;

/// Raw grant row as supplied by the caller, before row numbering.
///
/// This is the JSON transport shape: an array of objects carrying the same
/// five keys as the CSV columns. Missing optional fields default to empty,
/// matching a CSV cell that is simply absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RawGrantRow {
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub system_name: String,
    #[serde(default)]
    pub instance_name: String,
    #[serde(default)]
    pub access_tier_name: String,
    #[serde(default)]
    pub notes: String,
}

/// One data row of an upload, positioned within the original file.
///
/// `row_number` is the 1-indexed line of the original file, so it is always
/// >= 2 (line 1 is the header). Empty strings in `instance_name`/`notes`
/// mean "absent".
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadRow {
    pub row_number: u32,
    pub user_email: String,
    pub system_name: String,
    pub instance_name: String,
    pub access_tier_name: String,
    pub notes: String,
}

impl UploadRow {
    pub fn from_raw(row_number: u32, raw: RawGrantRow) -> Self {
        Self {
            row_number,
            user_email: raw.user_email,
            system_name: raw.system_name,
            instance_name: raw.instance_name,
            access_tier_name: raw.access_tier_name,
            notes: raw.notes,
        }
    }

    /// Instance name with "empty means absent" applied.
    pub fn instance_name_opt(&self) -> Option<&str> {
        let trimmed = self.instance_name.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Notes with "empty means absent" applied. Non-empty notes are kept
    /// verbatim, not trimmed.
    pub fn notes_opt(&self) -> Option<&str> {
        (!self.notes.trim().is_empty()).then_some(self.notes.as_str())
    }
}

/// Foreign keys a row resolved to. Every id refers to an entity that exists
/// and is internally consistent (tier and instance belong to the system).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResolvedGrant {
    pub user_id: Uuid,
    pub system_id: Uuid,
    pub instance_id: Option<Uuid>,
    pub tier_id: Uuid,
    pub notes: Option<String>,
}

/// A row that passed every validation check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidRow {
    pub row: UploadRow,
    pub resolved: ResolvedGrant,
}

/// A row that failed validation, with every applicable error message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorRow {
    pub row: UploadRow,
    pub errors: Vec<String>,
}

/// Row counts for one upload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct UploadSummary {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub error_rows: usize,
    pub inserted_count: usize,
}

/// Full outcome of one bulk upload, consumed by the UI layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkUploadReport {
    pub success: bool,
    pub message: String,
    pub summary: UploadSummary,
    pub valid_rows: Vec<ValidRow>,
    pub error_rows: Vec<ErrorRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_grants: Option<Vec<GrantDetails>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(instance: &str, notes: &str) -> UploadRow {
        UploadRow {
            row_number: 2,
            user_email: "a@example.com".to_string(),
            system_name: "GitHub".to_string(),
            instance_name: instance.to_string(),
            access_tier_name: "Admin".to_string(),
            notes: notes.to_string(),
        }
    }

    #[test]
    fn test_empty_optional_fields_are_absent() {
        let r = row("", "   ");
        assert_eq!(r.instance_name_opt(), None);
        assert_eq!(r.notes_opt(), None);
    }

    #[test]
    fn test_notes_kept_verbatim_when_present() {
        let r = row("Production", "granted for oncall, temporary");
        assert_eq!(r.instance_name_opt(), Some("Production"));
        assert_eq!(r.notes_opt(), Some("granted for oncall, temporary"));
    }
}
