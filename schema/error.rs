use thiserror::Error;

/// Errors raised by pure schema mutations.
///
/// All of these indicate either schema drift (a migration meets a collection
/// in an unexpected shape) or a bug in a migration definition. The runner
/// treats every variant as fatal for the current batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("duplicate field id {id:?}")]
    DuplicateFieldId { id: String },
    #[error("duplicate field name {name:?}")]
    DuplicateFieldName { name: String },
    #[error("field index {index} is out of range for {len} fields")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("field {id:?} not found")]
    FieldNotFound { id: String },
}
