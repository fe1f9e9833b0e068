//! Immutable run configuration passed down the aggregation call chain.

use std::path::{Path, PathBuf};

pub const DEFAULT_GRADES_FILE: &str = "Grades.xlsx";
pub const DEFAULT_LOGS_FILE: &str = "logs.xlsx";
pub const DEFAULT_CACHE_FILE: &str = "input.csv";
pub const DEFAULT_SINGLE_CLASS: &str = "Turma_Unica";

/// Final-grade headers, in order of preference.
static GRADE_COLUMNS: &[&str] = &["Média Final", "Course total"];

/// What to do with students that show up in the logs but not in the roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum UnknownStudents {
    /// Leave them out of the class table.
    #[default]
    Drop,
    /// Append them after the roster with an empty grade.
    Include,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub grades_file: String,
    pub logs_file: String,
    pub cache_file: String,
    /// Title rows above the header row of the log export.
    pub log_preamble_rows: usize,
    pub grade_columns: Vec<String>,
    /// Class name used when a module has no class subdirectories.
    pub single_class_name: String,
    pub unknown_students: UnknownStudents,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grades_file: DEFAULT_GRADES_FILE.to_string(),
            logs_file: DEFAULT_LOGS_FILE.to_string(),
            cache_file: DEFAULT_CACHE_FILE.to_string(),
            log_preamble_rows: 2,
            grade_columns: GRADE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            single_class_name: DEFAULT_SINGLE_CLASS.to_string(),
            unknown_students: UnknownStudents::Drop,
        }
    }
}

impl Config {
    /// Builds a config from the defaults, overridden by `ROLLUP_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("ROLLUP_GRADES_FILE") {
            config.grades_file = v;
        }
        if let Ok(v) = std::env::var("ROLLUP_LOGS_FILE") {
            config.logs_file = v;
        }
        if let Ok(v) = std::env::var("ROLLUP_CACHE_FILE") {
            config.cache_file = v;
        }
        if let Ok(v) = std::env::var("ROLLUP_SINGLE_CLASS") {
            config.single_class_name = v;
        }

        config
    }

    pub fn with_unknown_students(mut self, policy: UnknownStudents) -> Self {
        self.unknown_students = policy;
        self
    }

    pub fn logs_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.logs_file)
    }

    pub fn grades_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.grades_file)
    }

    pub fn cache_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.cache_file)
    }
}
