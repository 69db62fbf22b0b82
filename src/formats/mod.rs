//! Artifact payload parsing and dataset output

pub mod csv_output;
pub mod eco_ci;

pub use csv_output::{OutputRow, write_rows};
pub use eco_ci::extract_measurements;
