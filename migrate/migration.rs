use std::fmt;

use futures::future::BoxFuture;
use strata_store::MetaStore;

use crate::error::Result;

/// Identifier of a migration: unique and totally ordered.
///
/// By convention this is `<unix-timestamp>_<label>`, so the lexicographic
/// order used here is also chronological. The engine only relies on the
/// ordering and uniqueness, not on the timestamp convention.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MigrationId(String);

impl MigrationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MigrationId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for MigrationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One direction of a migration. The store handle is passed explicitly; there
/// is no ambient "current app" context.
pub type Transform = for<'a> fn(&'a MetaStore) -> BoxFuture<'a, Result<()>>;

/// A versioned, reversible schema transformation.
///
/// `down` is expected to undo `up` for the fields and rules it touches. That
/// symmetry is the author's contract; the engine enforces ordering,
/// uniqueness and at-most-once application, not semantic inversibility.
#[derive(Debug)]
pub struct Migration {
    pub id: MigrationId,
    pub up: Transform,
    pub down: Transform,
}

impl Migration {
    pub fn new(id: impl Into<MigrationId>, up: Transform, down: Transform) -> Self {
        Self { id: id.into(), up, down }
    }
}
