//! Output formatting and persistence for aggregated tables.
//!
//! Supports JSON summaries and the CSV cache file written
//! at every directory level.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::table::ActivityTable;

/// The directory level a table was aggregated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Class,
    Module,
    Course,
}

/// Shape of an aggregated table, reported after a run.
#[derive(Debug, Serialize)]
pub struct TableSummary {
    pub generated_at: DateTime<Utc>,
    pub level: Level,
    pub identity: Vec<String>,
    pub students: usize,
    pub actions: usize,
    pub columns: Vec<String>,
}

impl TableSummary {
    pub fn new(level: Level, table: &ActivityTable) -> Self {
        Self {
            generated_at: Utc::now(),
            level,
            identity: table.identity.clone(),
            students: table.len(),
            actions: table.actions.len(),
            columns: table.headers(),
        }
    }
}

/// Logs a summary as pretty-printed JSON.
pub fn print_json(summary: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

/// Writes `table` as CSV to `path`, replacing any previous file.
///
/// The rows go to a temporary file in the same directory which is then
/// renamed over `path`, so readers never see a partial cache.
pub fn write_cached_table(path: &Path, table: &ActivityTable) -> crate::error::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;

    {
        let mut writer = WriterBuilder::new().from_writer(tmp.as_file_mut());
        writer.write_record(table.headers())?;
        for row in &table.rows {
            writer.write_record(table.record(row))?;
        }
        writer.flush()?;
    }

    tmp.persist(path)?;
    debug!(
        path = %path.display(),
        rows = table.len(),
        columns = table.headers().len(),
        "Wrote cache file"
    );

    Ok(())
}
