pub mod error;
pub mod meta;
mod schema;

pub use error::StoreError;
pub use meta::{MetaStore, MigrationRecord};
