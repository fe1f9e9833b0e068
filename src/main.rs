//! CLI entry point for the course rollup tool.
//!
//! Provides subcommands for aggregating a single class, a module or a whole
//! course into `input.csv` tables, checking a course for missing inputs, and
//! inspecting a log export.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use course_rollup::aggregators::{
    aggregate_class, aggregate_course, aggregate_module, find_missing_input, inspect_logs,
};
use course_rollup::output::{Level, TableSummary, print_json};
use course_rollup::{ActivityTable, Config, UnknownStudents};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "course_rollup")]
#[command(about = "Aggregate course activity logs and grades into per-student tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// What to do with students found in the logs but not in the grade roster
    #[arg(long, global = true, value_enum, default_value_t = UnknownStudents::Drop)]
    unknown_students: UnknownStudents,

    /// Print the result summary as JSON
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate one class directory
    Class {
        #[command(flatten)]
        location: Location,
    },
    /// Aggregate every class of a module
    Module {
        #[command(flatten)]
        location: Location,
    },
    /// Check inputs, then aggregate every module of a course
    Course {
        #[command(flatten)]
        location: Location,
    },
    /// Check that every class of a course has logs and grades
    Check {
        #[command(flatten)]
        location: Location,
    },
    /// Report the action frequencies of a log export
    Logs {
        #[command(flatten)]
        location: Location,
    },
}

/// Where a command runs: `<root>/<course>/<module>/<class>` or an explicit path.
#[derive(Args, Debug)]
struct Location {
    /// Dataset root holding one directory per course
    #[arg(long, default_value = "../../Dataset_UNASUS_UFMA")]
    root: PathBuf,

    #[arg(long)]
    course: Option<String>,

    #[arg(long)]
    module: Option<String>,

    #[arg(long = "class")]
    class: Option<String>,

    /// Use this directory directly, ignoring --root and the path components
    #[arg(short, long)]
    path: Option<PathBuf>,
}

impl Location {
    /// Number of leading path components given on the command line.
    fn depth(&self) -> usize {
        [&self.course, &self.module, &self.class]
            .into_iter()
            .take_while(|c| c.is_some())
            .count()
    }

    /// Resolves the target directory from the first `depth` components
    /// (course, module, class) unless `--path` is given.
    fn resolve(&self, depth: usize) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }

        let components: Vec<&String> = [&self.course, &self.module, &self.class]
            .into_iter()
            .map_while(Option::as_ref)
            .take(depth)
            .collect();

        if components.len() < depth {
            let needed = ["--course", "--module", "--class"][..depth].join(", ");
            bail!("{needed} required (or --path)");
        }

        Ok(components
            .iter()
            .fold(self.root.clone(), |dir, c| dir.join(c.as_str())))
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/course_rollup.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("course_rollup.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().with_unknown_students(cli.unknown_students);

    match cli.command {
        Commands::Class { location } => {
            let dir = location.resolve(3)?;
            let table = aggregate_class(&dir, &config)?;
            report(Level::Class, &table, cli.json)?;
        }
        Commands::Module { location } => {
            let dir = location.resolve(2)?;
            let table = aggregate_module(&dir, &config)?;
            report(Level::Module, &table, cli.json)?;
        }
        Commands::Course { location } => {
            let dir = location.resolve(1)?;
            let table = aggregate_course(&dir, &config)?;
            report(Level::Course, &table, cli.json)?;
        }
        Commands::Check { location } => {
            let dir = location.resolve(1)?;
            if let Some(missing) = find_missing_input(&dir, &config)? {
                bail!("course check failed for {}: {missing}", dir.display());
            }
            info!(dir = %dir.display(), "All modules have logs and grades");
        }
        Commands::Logs { location } => {
            let dir = location.resolve(location.depth().max(1))?;
            let log_report = inspect_logs(&dir, &config)?;
            if cli.json {
                print_json(&log_report)?;
            } else {
                info!(
                    entries = log_report.entries,
                    students = log_report.students,
                    actions = log_report.actions.len(),
                    "Log summary"
                );
                for action in &log_report.actions {
                    info!(action = %action.action, count = action.count, "Action");
                }
            }
        }
    }

    Ok(())
}

fn report(level: Level, table: &ActivityTable, json: bool) -> Result<()> {
    let summary = TableSummary::new(level, table);
    if json {
        print_json(&summary)?;
    } else {
        info!(
            level = ?summary.level,
            students = summary.students,
            actions = summary.actions,
            "Table written"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(course: Option<&str>, module: Option<&str>, class: Option<&str>) -> Location {
        Location {
            root: PathBuf::from("/data"),
            course: course.map(str::to_string),
            module: module.map(str::to_string),
            class: class.map(str::to_string),
            path: None,
        }
    }

    #[test]
    fn test_resolve_joins_components() {
        let loc = location(Some("C1"), Some("M1"), Some("T1"));
        assert_eq!(loc.resolve(3).unwrap(), PathBuf::from("/data/C1/M1/T1"));
        assert_eq!(loc.resolve(1).unwrap(), PathBuf::from("/data/C1"));
        assert_eq!(loc.depth(), 3);
    }

    #[test]
    fn test_resolve_requires_depth() {
        let loc = location(Some("C1"), None, None);
        let err = loc.resolve(2).unwrap_err();
        assert_eq!(err.to_string(), "--course, --module required (or --path)");
    }

    #[test]
    fn test_resolve_path_override() {
        let mut loc = location(None, None, None);
        loc.path = Some(PathBuf::from("/elsewhere/M1"));
        assert_eq!(loc.resolve(2).unwrap(), PathBuf::from("/elsewhere/M1"));
    }

    #[test]
    fn test_cli_parses_policy() {
        let cli = Cli::parse_from([
            "course_rollup",
            "module",
            "--course",
            "C1",
            "--module",
            "M1",
            "--unknown-students",
            "include",
        ]);
        assert_eq!(cli.unknown_students, UnknownStudents::Include);
    }
}
