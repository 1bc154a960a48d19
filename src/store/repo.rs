use crate::error::Result;
use crate::store::table::{LoadedTable, Table};

/// Durable home of the table artifact. `save` replaces the whole artifact.
pub trait TableStore {
    fn load(&self) -> Result<LoadedTable>;
    fn save(&self, table: &Table) -> Result<()>;
}
