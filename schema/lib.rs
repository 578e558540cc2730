pub mod collection;
pub mod error;
pub mod field;

pub use collection::{Collection, RuleKind};
pub use error::SchemaError;
pub use field::{Field, FieldType};
