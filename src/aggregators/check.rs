use std::path::Path;
use tracing::{debug, info};

use crate::aggregators::utility::{list_subdirs, require_inputs};
use crate::config::Config;
use crate::error::{Result, RollupError};

/// Finds the first class of `dir` lacking a log or grade spreadsheet.
///
/// Modules are visited in name order. A module without class directories
/// must hold the files itself. The miss is returned as the
/// [`RollupError::MissingInput`] naming the absent file; I/O errors while
/// listing directories are returned as errors. Nothing is written.
#[tracing::instrument(skip(dir, config), fields(dir = %dir.display()))]
pub fn find_missing_input(dir: &Path, config: &Config) -> Result<Option<RollupError>> {
    for module in list_subdirs(dir)? {
        let classes = list_subdirs(&module.path)?;

        if classes.is_empty() {
            if let Err(e) = require_inputs(&module.path, config) {
                info!(module = %module.name, error = %e, "Course check failed");
                return Ok(Some(e));
            }
            continue;
        }

        for class in &classes {
            if let Err(e) = require_inputs(&class.path, config) {
                info!(module = %module.name, class = %class.name, error = %e, "Course check failed");
                return Ok(Some(e));
            }
        }
        debug!(module = %module.name, classes = classes.len(), "Module inputs present");
    }

    Ok(None)
}

/// Returns `true` when every class of every module in `dir` has both a log
/// and a grade spreadsheet.
pub fn check_course(dir: &Path, config: &Config) -> Result<bool> {
    Ok(find_missing_input(dir, config)?.is_none())
}
