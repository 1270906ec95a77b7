//! Validation modules

pub mod row;

pub use row::validate_row_schema;
