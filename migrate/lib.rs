pub mod error;
pub mod migration;
pub mod runner;
pub mod set;

pub use error::{Error, Result};
pub use migration::{Migration, MigrationId, Transform};
pub use runner::{Direction, Report, Runner};
pub use set::MigrationSet;
