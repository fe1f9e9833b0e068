use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::aggregators::utility::{clean_action, require_inputs};
use crate::config::{Config, UnknownStudents};
use crate::error::{Result, RollupError};
use crate::output::write_cached_table;
use crate::reader::{Sheet, cell_number, cell_text, load_grades, load_logs};
use crate::table::ActivityTable;

static LOG_NAME_COLUMN: &str = "User full name";
static LOG_ACTION_COLUMN: &str = "Action";
static FIRST_NAME_COLUMN: &str = "First name";
static SURNAME_COLUMN: &str = "Surname";

/// One log line: who did what, with the action label already cleaned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub name: String,
    pub action: String,
}

/// One roster line. `name` is first name and surname joined by a space.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeEntry {
    pub name: String,
    pub grade: Option<f64>,
}

/// Extracts `(student, action)` pairs from a log sheet.
///
/// Rows without a name are skipped. So are rows whose label is nothing but
/// an annotation, such as `"(link)"`: they carry no action, so they never
/// become an unnamed action column.
pub fn log_entries(sheet: &Sheet) -> Result<Vec<LogEntry>> {
    let name_col = sheet.require_column(LOG_NAME_COLUMN)?;
    let action_col = sheet.require_column(LOG_ACTION_COLUMN)?;

    let mut entries = Vec::with_capacity(sheet.rows.len());
    let mut skipped = 0usize;

    for row in &sheet.rows {
        let name = row.get(name_col).map(cell_text).unwrap_or_default();
        let raw = row.get(action_col).map(cell_text).unwrap_or_default();
        let action = clean_action(&raw);

        if name.is_empty() || action.is_empty() {
            skipped += 1;
            continue;
        }

        entries.push(LogEntry {
            name,
            action: action.to_string(),
        });
    }

    if skipped > 0 {
        debug!(path = %sheet.path.display(), skipped, "Skipped incomplete log rows");
    }

    Ok(entries)
}

/// Extracts the roster from a grade sheet, using the first configured grade
/// column that is present.
pub fn grade_entries(sheet: &Sheet, config: &Config) -> Result<Vec<GradeEntry>> {
    let first_col = sheet.require_column(FIRST_NAME_COLUMN)?;
    let surname_col = sheet.require_column(SURNAME_COLUMN)?;
    let grade_col = config
        .grade_columns
        .iter()
        .find_map(|c| sheet.column(c))
        .ok_or_else(|| RollupError::MissingGradeColumn {
            expected: config.grade_columns.clone(),
            path: sheet.path.clone(),
        })?;

    let entries = sheet
        .rows
        .iter()
        .map(|row| {
            let first = row.get(first_col).map(cell_text).unwrap_or_default();
            let surname = row.get(surname_col).map(cell_text).unwrap_or_default();
            GradeEntry {
                name: format!("{first} {surname}"),
                grade: row.get(grade_col).and_then(cell_number),
            }
        })
        .collect();

    Ok(entries)
}

/// Builds the class table: one row per distinct roster name, one column per
/// distinct action in first-occurrence order.
pub fn build_class_table(
    logs: &[LogEntry],
    roster: &[GradeEntry],
    unknown: UnknownStudents,
) -> ActivityTable {
    let mut actions: Vec<String> = Vec::new();
    let mut action_idx: HashMap<&str, usize> = HashMap::new();
    for entry in logs {
        if !action_idx.contains_key(entry.action.as_str()) {
            action_idx.insert(&entry.action, actions.len());
            actions.push(entry.action.clone());
        }
    }

    // Student order of first appearance in the logs, for appended unknowns.
    let mut log_students: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, Vec<u64>> = HashMap::new();
    for entry in logs {
        let row = counts.entry(&entry.name).or_insert_with(|| {
            log_students.push(&entry.name);
            vec![0; actions.len()]
        });
        row[action_idx[entry.action.as_str()]] += 1;
    }

    let mut table = ActivityTable::new(actions);
    let mut seen: HashSet<&str> = HashSet::new();

    for student in roster {
        if !seen.insert(&student.name) {
            warn!(name = %student.name, "Duplicate name in grade roster, keeping first");
            continue;
        }
        let row = counts.get(student.name.as_str()).cloned().unwrap_or_default();
        table.push(student.name.clone(), student.grade, row);
    }

    let unknown_names: Vec<&str> = log_students
        .into_iter()
        .filter(|name| !seen.contains(name))
        .collect();

    if !unknown_names.is_empty() {
        match unknown {
            UnknownStudents::Drop => {
                debug!(count = unknown_names.len(), "Dropping students missing from roster");
            }
            UnknownStudents::Include => {
                for name in unknown_names {
                    table.push(name, None, counts[name].clone());
                }
            }
        }
    }

    table
}

/// Builds the class table of `dir` without touching its cache file.
pub fn build_class(dir: &Path, config: &Config) -> Result<ActivityTable> {
    require_inputs(dir, config)?;

    let logs = log_entries(&load_logs(dir, config)?)?;
    let roster = grade_entries(&load_grades(dir, config)?, config)?;

    Ok(build_class_table(&logs, &roster, config.unknown_students))
}

/// Aggregates one class directory and writes its cache file.
#[tracing::instrument(skip(dir, config), fields(dir = %dir.display()))]
pub fn aggregate_class(dir: &Path, config: &Config) -> Result<ActivityTable> {
    let table = build_class(dir, config)?;
    if table.is_empty() {
        warn!("Grade roster has no students");
    }
    write_cached_table(&config.cache_path(dir), &table)?;

    info!(
        students = table.len(),
        actions = table.actions.len(),
        "Class aggregated"
    );
    Ok(table)
}

/// Frequency of one action in a log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionCount {
    pub action: String,
    pub count: usize,
}

/// What a log file holds, without aggregating it.
#[derive(Debug, Serialize)]
pub struct LogReport {
    pub entries: usize,
    pub students: usize,
    pub actions: Vec<ActionCount>,
}

impl LogReport {
    pub fn from_entries(entries: &[LogEntry]) -> Self {
        let mut actions: Vec<ActionCount> = Vec::new();
        for entry in entries {
            match actions.iter_mut().find(|a| a.action == entry.action) {
                Some(a) => a.count += 1,
                None => actions.push(ActionCount {
                    action: entry.action.clone(),
                    count: 1,
                }),
            }
        }
        actions.sort_by(|a, b| b.count.cmp(&a.count));

        let students: HashSet<&str> = entries.iter().map(|e| e.name.as_str()).collect();

        Self {
            entries: entries.len(),
            students: students.len(),
            actions,
        }
    }
}

/// Loads the log spreadsheet of `dir` and reports its action frequencies.
#[tracing::instrument(skip(dir, config), fields(dir = %dir.display()))]
pub fn inspect_logs(dir: &Path, config: &Config) -> Result<LogReport> {
    let entries = log_entries(&load_logs(dir, config)?)?;
    Ok(LogReport::from_entries(&entries))
}
