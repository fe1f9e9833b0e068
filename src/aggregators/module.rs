use std::path::Path;
use tracing::info;

use crate::aggregators::class::{aggregate_class, build_class};
use crate::aggregators::utility::{list_subdirs, load_or_aggregate};
use crate::config::Config;
use crate::error::Result;
use crate::output::write_cached_table;
use crate::table::{ActivityTable, CLASS_COLUMN};

/// Aggregates every class of a module and writes the module cache file.
///
/// Class subdirectories are visited in name order, reusing their cache files
/// when present. A module with no subdirectories is a single implicit class
/// whose spreadsheets live in the module directory itself; its class table is
/// built in memory since the module table owns that directory's cache file.
#[tracing::instrument(skip(dir, config), fields(dir = %dir.display()))]
pub fn aggregate_module(dir: &Path, config: &Config) -> Result<ActivityTable> {
    let classes = list_subdirs(dir)?;

    let tables = if classes.is_empty() {
        info!(class = %config.single_class_name, "No class directories, using module as single class");
        vec![build_class(dir, config)?.with_identity(CLASS_COLUMN, &config.single_class_name)]
    } else {
        let mut tables = Vec::with_capacity(classes.len());
        for class in &classes {
            info!(class = %class.name, "Collecting class");
            let table = load_or_aggregate(&class.path, config, aggregate_class)?;
            tables.push(table.with_identity(CLASS_COLUMN, &class.name));
        }
        tables
    };

    let mut table = ActivityTable::concat(tables);
    table.fill_missing();
    write_cached_table(&config.cache_path(dir), &table)?;

    info!(
        classes = classes.len().max(1),
        students = table.len(),
        actions = table.actions.len(),
        "Module aggregated"
    );
    Ok(table)
}
