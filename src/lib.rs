pub mod aggregators;
pub mod config;
pub mod error;
pub mod output;
pub mod reader;
pub mod table;

pub use config::{Config, UnknownStudents};
pub use error::{Result, RollupError};
pub use table::ActivityTable;
