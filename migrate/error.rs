use strata_schema::SchemaError;
use strata_store::StoreError;
use thiserror::Error;

use crate::migration::MigrationId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can halt a migration batch.
///
/// All errors halt the batch immediately and leave the store in the last
/// fully-committed state; no partial batch is rolled back automatically.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("duplicate migration id {0}")]
    DuplicateId(MigrationId),
    #[error("no migration definition found for applied record {0}")]
    UnknownMigration(MigrationId),
    #[error("migration {id} could not be applied")]
    Apply {
        id: MigrationId,
        #[source]
        source: Box<Error>,
    },
    #[error("migration {id} could not be rolled back")]
    Revert {
        id: MigrationId,
        #[source]
        source: Box<Error>,
    },
    /// The transform ran but its record could not be updated. The store is
    /// now inconsistent and needs the operator; retrying could double-apply.
    #[error("migration {id} ran, but updating its record failed; manual intervention required")]
    Inconsistent {
        id: MigrationId,
        #[source]
        source: StoreError,
    },
}

impl Error {
    /// True when another batch holds the advisory lock; the caller may retry
    /// later.
    pub fn is_locked(&self) -> bool {
        matches!(self, Error::Store(StoreError::Locked))
    }

    /// The migration the batch halted on, when there is one.
    pub fn migration_id(&self) -> Option<&MigrationId> {
        match self {
            Error::Apply { id, .. }
            | Error::Revert { id, .. }
            | Error::Inconsistent { id, .. }
            | Error::UnknownMigration(id)
            | Error::DuplicateId(id) => Some(id),
            Error::Schema(_) | Error::Store(_) => None,
        }
    }
}
