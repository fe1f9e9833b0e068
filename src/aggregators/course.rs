use std::path::Path;
use tracing::info;

use crate::aggregators::check::find_missing_input;
use crate::aggregators::module::aggregate_module;
use crate::aggregators::utility::{list_subdirs, load_or_aggregate};
use crate::config::Config;
use crate::error::{Result, RollupError};
use crate::output::write_cached_table;
use crate::table::{ActivityTable, MODULE_COLUMN};

/// Aggregates every module of a course and writes the course cache file.
///
/// Checks every class for its inputs first and returns
/// [`RollupError::CheckFailed`], wrapping the first missing file, before
/// anything is written.
#[tracing::instrument(skip(dir, config), fields(dir = %dir.display()))]
pub fn aggregate_course(dir: &Path, config: &Config) -> Result<ActivityTable> {
    info!("Checking course inputs");
    if let Some(missing) = find_missing_input(dir, config)? {
        return Err(RollupError::CheckFailed {
            path: dir.to_path_buf(),
            missing: Box::new(missing),
        });
    }

    let modules = list_subdirs(dir)?;
    if modules.is_empty() {
        return Err(RollupError::NoSubdirectories {
            path: dir.to_path_buf(),
        });
    }

    let mut tables = Vec::with_capacity(modules.len());
    for module in &modules {
        info!(module = %module.name, "Collecting module");
        let table = load_or_aggregate(&module.path, config, aggregate_module)?;
        tables.push(table.with_identity(MODULE_COLUMN, &module.name));
    }

    let mut table = ActivityTable::concat(tables);
    table.fill_missing();
    write_cached_table(&config.cache_path(dir), &table)?;

    info!(
        modules = modules.len(),
        students = table.len(),
        actions = table.actions.len(),
        "Course aggregated"
    );
    Ok(table)
}
