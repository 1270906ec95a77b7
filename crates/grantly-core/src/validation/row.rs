//! Per-row shape validation for bulk uploads.
//!
//! Shape validation runs before any entity resolution: a row with missing
//! or malformed required fields is rejected here and never reaches the
//! directories. Messages are formatted `"<field>: <message>"`, one per
//! failed field.

use validator::ValidateEmail;

use crate::models::UploadRow;

const MSG_REQUIRED: &str = "Required";
const MSG_INVALID_EMAIL: &str = "Invalid email";

/// Validate the shape of one upload row.
///
/// Returns an empty vec when the row is well-formed. Required fields are
/// `user_email` (must parse as an email), `system_name`, and
/// `access_tier_name`; `instance_name` and `notes` are optional and an
/// empty string is not an error.
pub fn validate_row_schema(row: &UploadRow) -> Vec<String> {
    let mut errors = Vec::new();

    let email = row.user_email.trim();
    if email.is_empty() {
        errors.push(format!("user_email: {}", MSG_REQUIRED));
    } else if !email.validate_email() {
        errors.push(format!("user_email: {}", MSG_INVALID_EMAIL));
    }

    if row.system_name.trim().is_empty() {
        errors.push(format!("system_name: {}", MSG_REQUIRED));
    }

    if row.access_tier_name.trim().is_empty() {
        errors.push(format!("access_tier_name: {}", MSG_REQUIRED));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(email: &str, system: &str, tier: &str) -> UploadRow {
        UploadRow {
            row_number: 2,
            user_email: email.to_string(),
            system_name: system.to_string(),
            instance_name: String::new(),
            access_tier_name: tier.to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_well_formed_row_passes() {
        let errors = validate_row_schema(&row("alice@example.com", "GitHub", "Admin"));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_missing_required_fields() {
        let errors = validate_row_schema(&row("", "  ", ""));
        assert_eq!(
            errors,
            vec![
                "user_email: Required",
                "system_name: Required",
                "access_tier_name: Required",
            ]
        );
    }

    #[test]
    fn test_malformed_email() {
        let errors = validate_row_schema(&row("not-an-email", "GitHub", "Admin"));
        assert_eq!(errors, vec!["user_email: Invalid email"]);
    }

    #[test]
    fn test_optional_fields_never_error() {
        let mut r = row("alice@example.com", "GitHub", "Admin");
        r.instance_name = String::new();
        r.notes = String::new();
        assert!(validate_row_schema(&r).is_empty());
    }

    #[test]
    fn test_email_surrounded_by_whitespace_is_accepted() {
        let errors = validate_row_schema(&row("  alice@example.com  ", "GitHub", "Admin"));
        assert!(errors.is_empty());
    }
}
