//! Spreadsheet and cache readers.
//!
//! Each loader looks for its fixed file name inside a directory. A missing
//! file is reported with a `warn!` and returned as
//! [`RollupError::MissingInput`]; callers decide whether that is fatal.

use calamine::{Data, Reader, open_workbook_auto};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{InputKind, Result, RollupError};
use crate::table::{ActivityTable, GRADES_COLUMN, NAME_COLUMN, StudentRow};

/// The first worksheet of a workbook, split into a header row and data rows.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Data>>,
}

impl Sheet {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column(name).ok_or_else(|| RollupError::MissingColumn {
            column: name.to_string(),
            path: self.path.clone(),
        })
    }
}

/// Renders a cell as trimmed text. Empty cells become an empty string.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Reads a cell as a number, accepting a decimal comma in text cells.
pub fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

/// Loads the log export of `dir`, skipping the title rows above its header.
pub fn load_logs(dir: &Path, config: &Config) -> Result<Sheet> {
    let path = require_file(config.logs_path(dir), InputKind::Logs)?;
    read_sheet(&path, config.log_preamble_rows)
}

/// Loads the grade roster of `dir`.
pub fn load_grades(dir: &Path, config: &Config) -> Result<Sheet> {
    let path = require_file(config.grades_path(dir), InputKind::Grades)?;
    read_sheet(&path, 0)
}

/// Loads the cached table written by a previous aggregation of `dir`.
pub fn load_cached_table(dir: &Path, config: &Config) -> Result<ActivityTable> {
    let path = require_file(config.cache_path(dir), InputKind::Cache)?;
    let file = File::open(&path)?;
    let mut rdr = csv::Reader::from_reader(file);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let name_col = headers
        .iter()
        .position(|h| h == NAME_COLUMN)
        .ok_or_else(|| RollupError::malformed(&path, "no Name column"))?;
    let grades_col = headers
        .iter()
        .position(|h| h == GRADES_COLUMN)
        .ok_or_else(|| RollupError::malformed(&path, "no Grades column"))?;

    let identity_cols: Vec<usize> = (0..name_col).filter(|&i| i != grades_col).collect();
    let action_cols: Vec<usize> = (0..headers.len())
        .filter(|&i| i != name_col && i != grades_col && !identity_cols.contains(&i))
        .collect();

    let mut table = ActivityTable {
        identity: identity_cols.iter().map(|&i| headers[i].clone()).collect(),
        actions: action_cols.iter().map(|&i| headers[i].clone()).collect(),
        rows: Vec::new(),
    };

    for result in rdr.records() {
        let record = result?;
        let field = |i: usize| record.get(i).unwrap_or("");

        let grade = match field(grades_col).trim() {
            "" => None,
            raw => {
                let parsed = raw.parse::<f64>().ok();
                if parsed.is_none() {
                    debug!(path = %path.display(), value = raw, "Unparseable grade treated as empty");
                }
                parsed
            }
        };

        let counts = action_cols
            .iter()
            .map(|&i| parse_count(field(i)).ok_or_else(|| {
                RollupError::malformed(
                    &path,
                    format!("invalid count '{}' in column '{}'", field(i), headers[i]),
                )
            }))
            .collect::<Result<Vec<u64>>>()?;

        table.rows.push(StudentRow {
            identity: identity_cols.iter().map(|&i| field(i).to_string()).collect(),
            name: field(name_col).to_string(),
            grade,
            counts,
        });
    }

    debug!(
        path = %path.display(),
        rows = table.len(),
        actions = table.actions.len(),
        "Loaded cached table"
    );
    Ok(table)
}

fn require_file(path: PathBuf, kind: InputKind) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path);
    }
    warn!(path = %path.display(), kind = %kind, "Input file not found");
    Err(RollupError::missing(kind, path))
}

/// Counts are written as integers, but integral floats ("2.0") and empty
/// cells are accepted too.
fn parse_count(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(0);
    }
    if let Ok(n) = raw.parse::<u64>() {
        return Some(n);
    }
    match raw.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 => Some(f as u64),
        _ => None,
    }
}

fn read_sheet(path: &Path, skip_rows: usize) -> Result<Sheet> {
    let spreadsheet_err = |source| RollupError::Spreadsheet {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| RollupError::EmptySheet {
            path: path.to_path_buf(),
        })?
        .map_err(spreadsheet_err)?;

    // The range starts at the first non-empty cell, not at row 0.
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut rows = range.rows().skip(skip_rows.saturating_sub(first_row));

    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| RollupError::EmptySheet {
            path: path.to_path_buf(),
        })?
        .iter()
        .map(cell_text)
        .collect();

    let rows: Vec<Vec<Data>> = rows
        .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|row| row.to_vec())
        .collect();

    debug!(path = %path.display(), rows = rows.len(), columns = headers.len(), "Read worksheet");

    Ok(Sheet {
        path: path.to_path_buf(),
        headers,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_cell_number_accepts_decimal_comma() {
        assert_eq!(cell_number(&Data::String("8,5".to_string())), Some(8.5));
        assert_eq!(cell_number(&Data::Float(7.25)), Some(7.25));
        assert_eq!(cell_number(&Data::Int(9)), Some(9.0));
        assert_eq!(cell_number(&Data::String("-".to_string())), None);
        assert_eq!(cell_number(&Data::Empty), None);
    }

    #[test]
    fn test_cell_text_trims() {
        assert_eq!(cell_text(&Data::String("  Ana Silva ".to_string())), "Ana Silva");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("3"), Some(3));
        assert_eq!(parse_count("2.0"), Some(2));
        assert_eq!(parse_count(""), Some(0));
        assert_eq!(parse_count("-1"), None);
        assert_eq!(parse_count("1.5"), None);
        assert_eq!(parse_count("abc"), None);
    }

    #[test]
    fn test_missing_files_are_reported_as_missing_input() {
        let dir = tempdir().unwrap();
        let config = Config::default();

        let err = load_logs(dir.path(), &config).unwrap_err();
        assert!(err.is_missing_input());

        let err = load_grades(dir.path(), &config).unwrap_err();
        assert!(matches!(
            err,
            RollupError::MissingInput { kind: InputKind::Grades, .. }
        ));

        let err = load_cached_table(dir.path(), &config).unwrap_err();
        assert!(err.to_string().ends_with("input.csv"));
    }

    #[test]
    fn test_load_cached_table_parses_identity_as_text() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("input.csv"),
            "Module,Class,Name,Grades,View,Submit\n\
             2019,01,Ana Silva,8.5,2,1\n\
             2019,02,Bruno Lima,,0.0,\n",
        )
        .unwrap();

        let table = load_cached_table(dir.path(), &Config::default()).unwrap();

        assert_eq!(table.identity, vec!["Module", "Class"]);
        assert_eq!(table.actions, vec!["View", "Submit"]);
        assert_eq!(table.rows[0].identity, vec!["2019", "01"]);
        assert_eq!(table.rows[0].grade, Some(8.5));
        assert_eq!(table.rows[1].grade, None);
        assert_eq!(table.rows[1].counts, vec![0, 0]);
    }

    #[test]
    fn test_load_cached_table_rejects_bad_counts() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("input.csv"),
            "Name,Grades,View\nAna Silva,8.5,many\n",
        )
        .unwrap();

        let err = load_cached_table(dir.path(), &Config::default()).unwrap_err();
        assert!(matches!(err, RollupError::MalformedCache { .. }));
    }

    #[test]
    fn test_load_cached_table_requires_name_column() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("input.csv"), "Student,Grades\nAna,1\n").unwrap();

        let err = load_cached_table(dir.path(), &Config::default()).unwrap_err();
        assert!(err.to_string().contains("no Name column"));
    }
}
