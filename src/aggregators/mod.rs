//! Bottom-up aggregation of the course → module → class directory tree.
//!
//! Each level reuses the cache file of the level below when one exists,
//! otherwise aggregates it, then stacks the results over the union of
//! their action columns and writes its own cache file.

pub mod check;
pub mod class;
pub mod course;
pub mod module;
pub mod utility;

pub use check::{check_course, find_missing_input};
pub use class::{aggregate_class, inspect_logs};
pub use course::aggregate_course;
pub use module::aggregate_module;
