use std::collections::HashSet;

use log::{debug, warn};

use crate::domain::{Category, IdentityKey, Record};
use crate::error::{Error, Result};

pub const HEADER: [&str; 5] = ["Date", "Category", "Sender", "Subject", "Snippet"];

/// In-memory table: rows in stable order, unique by identity key.
#[derive(Debug, Clone, Default)]
pub struct Table {
    rows: Vec<Record>,
    seen: HashSet<IdentityKey>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `record` unless a row with the same identity is present.
    pub fn insert(&mut self, record: Record) -> bool {
        if !self.seen.insert(record.identity()) {
            return false;
        }
        self.rows.push(record);
        true
    }

    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.seen.contains(key)
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<Record> for Table {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut t = Table::new();
        for r in iter {
            t.insert(r);
        }
        t
    }
}

/// Result of loading the table artifact.
#[derive(Debug, Clone, Default)]
pub struct LoadedTable {
    pub table: Table,
    /// At least one well-formed data row was parsed.
    pub had_data_rows: bool,
}

/// Parses the artifact. The first row is the header and is discarded; rows
/// without exactly five columns are skipped.
pub fn decode(bytes: &[u8]) -> LoadedTable {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let mut loaded = LoadedTable::default();
    for (idx, row) in reader.records().enumerate() {
        let row = match row {
            Ok(r) => r,
            Err(e) => {
                debug!("skipping unreadable table row {}: {e}", idx + 1);
                continue;
            }
        };
        if row.len() != HEADER.len() {
            debug!(
                "skipping table row {} with {} columns",
                idx + 1,
                row.len()
            );
            continue;
        }
        loaded.had_data_rows = true;

        let record = Record {
            received_at: row[0].to_string(),
            category: Category::from_label(&row[1]),
            sender: row[2].to_string(),
            subject: row[3].to_string(),
            snippet: row[4].to_string(),
        };
        if !loaded.table.insert(record) {
            warn!("dropping duplicate table row {}", idx + 1);
        }
    }
    loaded
}

/// Serializes header + rows.
pub fn encode(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for r in table.rows() {
        writer.write_record([
            r.received_at.as_str(),
            r.category.label(),
            r.sender.as_str(),
            r.subject.as_str(),
            r.snippet.as_str(),
        ])?;
    }
    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}
