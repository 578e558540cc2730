use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::migration::{Migration, MigrationId};

/// All migration definitions known to a runner.
///
/// Registration order does not matter: iteration is always in ascending id
/// order, which is the only order migrations may apply in.
#[derive(Debug, Default)]
pub struct MigrationSet {
    migrations: BTreeMap<MigrationId, Migration>,
}

impl MigrationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, migration: Migration) -> Result<()> {
        if self.migrations.contains_key(&migration.id) {
            return Err(Error::DuplicateId(migration.id));
        }
        self.migrations.insert(migration.id.clone(), migration);
        Ok(())
    }

    pub fn get(&self, id: &MigrationId) -> Option<&Migration> {
        self.migrations.get(id)
    }

    /// Iterates in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.values()
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use strata_store::MetaStore;

    fn noop(_store: &MetaStore) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    #[test]
    fn iterates_in_ascending_id_order() {
        let mut set = MigrationSet::new();
        set.register(Migration::new("1734599932_b", noop, noop)).unwrap();
        set.register(Migration::new("1734500000_a", noop, noop)).unwrap();
        set.register(Migration::new("1734700000_c", noop, noop)).unwrap();

        let ids: Vec<&str> = set.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["1734500000_a", "1734599932_b", "1734700000_c"]);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut set = MigrationSet::new();
        set.register(Migration::new("1734500000_a", noop, noop)).unwrap();
        let err = set.register(Migration::new("1734500000_a", noop, noop)).unwrap_err();
        assert!(matches!(err, Error::DuplicateId(id) if id.as_str() == "1734500000_a"));
        assert_eq!(set.len(), 1);
    }
}
