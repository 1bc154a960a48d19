use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};
use crate::store::repo::TableStore;
use crate::store::table::{self, LoadedTable, Table};

/// Table artifact kept as a CSV file on disk.
pub struct LocalTableStore {
    path: PathBuf,
}

impl LocalTableStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableStore for LocalTableStore {
    fn load(&self) -> Result<LoadedTable> {
        if !self.path.exists() {
            debug!("no table at {}", self.path.display());
            return Ok(LoadedTable::default());
        }
        let bytes = fs::read(&self.path)?;
        Ok(table::decode(&bytes))
    }

    fn save(&self, table: &Table) -> Result<()> {
        let bytes = table::encode(table)?;

        // Write beside the target then rename, so readers never see a partial file.
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        debug!("wrote {} rows to {}", table.len(), self.path.display());
        Ok(())
    }
}
