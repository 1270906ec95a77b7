//! Per-row validation against the resolution cache.
//!
//! Check order per row: schema first (failing rows stop there), then entity
//! resolution, referential scoping, the in-file duplicate check, and the
//! pre-existing-grant check. Every check past schema accumulates into one
//! combined error list so the caller sees the complete picture for a row in
//! one pass.

use std::collections::HashSet;

use grantly_core::{
    models::{ErrorRow, GrantKey, ResolvedGrant, UploadRow, ValidRow},
    validation::validate_row_schema,
};

use super::cache::ResolutionCache;

pub const DUPLICATE_ROW_ERROR: &str =
    "Duplicate row: User already has a grant for this system/tier/instance in this file";

/// Validation result for one upload: rows in input order, every row
/// accounted for exactly once.
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub valid_rows: Vec<ValidRow>,
    pub error_rows: Vec<ErrorRow>,
}

/// Validate every row, tracking in-file duplicates across the run.
///
/// The duplicate policy is first-wins: the first row to claim a grant key
/// is never flagged, every later row with the same key is. Keys are
/// recorded as soon as user/system/tier resolve, even when the row errors
/// for other reasons, so a later identical row is still a duplicate.
pub fn validate_rows(rows: Vec<UploadRow>, cache: &ResolutionCache) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();
    let mut seen_keys: HashSet<GrantKey> = HashSet::new();

    for row in rows {
        match validate_row(&row, cache, &mut seen_keys) {
            Ok(resolved) => outcome.valid_rows.push(ValidRow { row, resolved }),
            Err(errors) => outcome.error_rows.push(ErrorRow { row, errors }),
        }
    }

    outcome
}

/// Validate one row. Schema failure short-circuits; everything after
/// accumulates.
fn validate_row(
    row: &UploadRow,
    cache: &ResolutionCache,
    seen_keys: &mut HashSet<GrantKey>,
) -> Result<ResolvedGrant, Vec<String>> {
    let schema_errors = validate_row_schema(row);
    if !schema_errors.is_empty() {
        return Err(schema_errors);
    }

    let mut errors = Vec::new();

    let user = cache.user(&row.user_email);
    if user.is_none() {
        errors.push(format!("Unknown user_email: {}", row.user_email.trim()));
    }

    let system = cache.system(&row.system_name);
    if system.is_none() {
        errors.push(format!("Unknown system_name: {}", row.system_name.trim()));
    }

    // Tier and instance errors are system-scoped; a missing system already
    // stands on its own, so these checks only run once the system resolved.
    let tier = system.and_then(|s| cache.tier(s.id, &row.access_tier_name));
    if system.is_some() && tier.is_none() {
        errors.push(format!(
            "Unknown access_tier_name \"{}\" for system \"{}\"",
            row.access_tier_name.trim(),
            row.system_name.trim()
        ));
    }

    let mut instance = None;
    if let (Some(s), Some(name)) = (system, row.instance_name_opt()) {
        instance = cache.instance(s.id, name);
        if instance.is_none() {
            errors.push(format!(
                "Instance \"{}\" does not belong to system \"{}\"",
                name,
                row.system_name.trim()
            ));
        }
    }

    if let (Some(user), Some(system), Some(tier)) = (user, system, tier) {
        let key = GrantKey {
            user_id: user.id,
            system_id: system.id,
            tier_id: tier.id,
            instance_id: instance.map(|i| i.id),
        };

        // Recording and checking in one step: insert returns false when an
        // earlier row already claimed this key.
        if !seen_keys.insert(key) {
            errors.push(DUPLICATE_ROW_ERROR.to_string());
        }

        // The existing-grant check only applies to otherwise clean rows.
        if errors.is_empty() && cache.has_active_grant(&key) {
            let mut message =
                "User already has an active grant for this system/tier".to_string();
            if row.instance_name_opt().is_some() {
                message.push_str("/instance");
            }
            errors.push(message);
        }

        if errors.is_empty() {
            return Ok(ResolvedGrant {
                user_id: user.id,
                system_id: system.id,
                instance_id: instance.map(|i| i.id),
                tier_id: tier.id,
                notes: row.notes_opt().map(str::to_string),
            });
        }
    }

    Err(errors)
}
