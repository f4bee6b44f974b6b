//! Where fetched records end up once a run is complete.

pub mod json_file;
pub mod sqlite;

pub use json_file::{output_file_name, write_json};
pub use sqlite::SqliteSink;
