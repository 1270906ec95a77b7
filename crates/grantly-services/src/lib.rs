//! Grantly services
//!
//! Business services on top of the collaborator traits from grantly-core.
//! The main export is the bulk upload pipeline: CSV parsing, batched entity
//! resolution, row validation, and the all-or-nothing grant insert.

pub mod bulk_upload;

pub use bulk_upload::BulkUploadService;
