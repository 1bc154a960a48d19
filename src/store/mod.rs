pub mod drive;
pub mod local;
pub mod repo;
pub mod table;

pub use repo::TableStore;
pub use table::{LoadedTable, Table};

/// Default artifact name inside the configured folder.
pub const DEFAULT_TABLE_NAME: &str = "job_applications.csv";
