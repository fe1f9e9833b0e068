use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{InputKind, Result, RollupError};
use crate::reader::load_cached_table;
use crate::table::ActivityTable;

/// An immediate subdirectory: its file name and full path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subdir {
    pub name: String,
    pub path: PathBuf,
}

/// Lists the immediate subdirectories of `dir`, sorted by name.
pub fn list_subdirs(dir: &Path) -> Result<Vec<Subdir>> {
    let mut subdirs = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            subdirs.push(Subdir {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
            });
        }
    }

    subdirs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(subdirs)
}

/// Strips a trailing parenthesized annotation and surrounding whitespace.
///
/// `"Course module viewed (https://...)"` becomes `"Course module viewed"`.
pub fn clean_action(raw: &str) -> &str {
    raw.split_once('(').map_or(raw, |(head, _)| head).trim()
}

/// Fails with [`RollupError::MissingInput`] unless `dir` holds both the log
/// and the grade spreadsheet. Logs are checked first.
pub fn require_inputs(dir: &Path, config: &Config) -> Result<()> {
    for (path, kind) in [
        (config.logs_path(dir), InputKind::Logs),
        (config.grades_path(dir), InputKind::Grades),
    ] {
        if !path.exists() {
            warn!(dir = %dir.display(), path = %path.display(), kind = %kind, "Missing input");
            return Err(RollupError::missing(kind, path));
        }
    }
    Ok(())
}

/// Returns the cached table of `dir` if one exists, otherwise runs
/// `aggregate` on it (which writes the cache).
pub fn load_or_aggregate<F>(dir: &Path, config: &Config, aggregate: F) -> Result<ActivityTable>
where
    F: FnOnce(&Path, &Config) -> Result<ActivityTable>,
{
    if config.cache_path(dir).exists() {
        debug!(dir = %dir.display(), "Using cached table");
        return load_cached_table(dir, config);
    }
    aggregate(dir, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_clean_action_strips_link() {
        assert_eq!(clean_action("View(link)"), "View");
        assert_eq!(clean_action("  Quiz attempt submitted (https://x/y) "), "Quiz attempt submitted");
        assert_eq!(clean_action("Submit"), "Submit");
        assert_eq!(clean_action("(only link)"), "");
    }

    #[test]
    fn test_list_subdirs_sorted_and_skips_files() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("input.csv"), "").unwrap();

        let names: Vec<_> = list_subdirs(dir.path())
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();

        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_require_inputs_reports_logs_first() {
        let dir = tempdir().unwrap();
        let config = Config::default();

        let err = require_inputs(dir.path(), &config).unwrap_err();
        assert!(matches!(err, RollupError::MissingInput { kind: InputKind::Logs, .. }));

        fs::write(dir.path().join("logs.xlsx"), "").unwrap();
        let err = require_inputs(dir.path(), &config).unwrap_err();
        assert!(matches!(err, RollupError::MissingInput { kind: InputKind::Grades, .. }));

        fs::write(dir.path().join("Grades.xlsx"), "").unwrap();
        assert!(require_inputs(dir.path(), &config).is_ok());
    }

    #[test]
    fn test_load_or_aggregate_prefers_cache() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("input.csv"), "Name,Grades,View\nAna,5,1\n").unwrap();

        let table = load_or_aggregate(dir.path(), &Config::default(), |_, _| {
            panic!("aggregate must not run when a cache exists")
        })
        .unwrap();

        assert_eq!(table.count("Ana", "View"), Some(1));
    }
}
