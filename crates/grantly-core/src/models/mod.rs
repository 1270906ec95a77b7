//! Domain models

pub mod grant;
pub mod system;
pub mod upload;
pub mod user;

pub use grant::{AccessGrant, GrantDetails, GrantKey, GrantStatus, NewGrant};
pub use system::{AccessTier, System, SystemInstance};
pub use upload::{
    BulkUploadReport, ErrorRow, RawGrantRow, ResolvedGrant, UploadRow, UploadSummary, ValidRow,
};
pub use user::User;
