use std::collections::HashSet;

use log::{info, warn};
use strata_store::MetaStore;

use crate::error::{Error, Result};
use crate::migration::MigrationId;
use crate::set::MigrationSet;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Outcome of a completed batch.
#[derive(Debug)]
pub struct Report {
    pub direction: Direction,
    pub migrations: Vec<MigrationId>,
}

/// Orchestrates one migration batch against a store.
///
/// A batch is strictly sequential: the runner holds the store's advisory lock
/// from before the first migration until after the last, and a second runner
/// observing the lock fails fast instead of waiting. Each migration either
/// completes or halts the batch; nothing applied earlier in the batch is
/// undone on failure.
#[derive(Debug)]
pub struct Runner<'a> {
    store: &'a MetaStore,
    set: &'a MigrationSet,
}

impl<'a> Runner<'a> {
    pub fn new(store: &'a MetaStore, set: &'a MigrationSet) -> Self {
        Self { store, set }
    }

    /// Applies every pending migration in ascending id order, recording each
    /// success before moving to the next.
    pub async fn up(&self) -> Result<Report> {
        self.store.acquire_lock().await?;
        let result = self.up_locked().await;
        self.unlock(result).await
    }

    /// Rolls back the `count` most recently applied migrations, most recent
    /// first, deleting each record on success.
    pub async fn down(&self, count: usize) -> Result<Report> {
        self.store.acquire_lock().await?;
        let result = self.down_locked(count).await;
        self.unlock(result).await
    }

    // The lock is released on every exit path. A release failure on an
    // otherwise successful batch is still an error; after a failed batch the
    // original error wins and the release failure is only logged.
    async fn unlock(&self, result: Result<Report>) -> Result<Report> {
        match (result, self.store.release_lock().await) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(release_err)) => Err(release_err.into()),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(release_err)) => {
                warn!("could not release the migration lock: {}", release_err);
                Err(err)
            }
        }
    }

    async fn up_locked(&self) -> Result<Report> {
        let applied: HashSet<String> = self
            .store
            .applied_migrations()
            .await?
            .into_iter()
            .map(|record| record.id)
            .collect();

        let mut migrations = Vec::new();
        for migration in self.set.iter() {
            // at-most-once: an id with a record never runs again
            if applied.contains(migration.id.as_str()) {
                continue;
            }
            info!("applying migration {}", migration.id);
            (migration.up)(self.store).await.map_err(|source| Error::Apply {
                id: migration.id.clone(),
                source: Box::new(source),
            })?;
            self.store
                .record_applied(migration.id.as_str())
                .await
                .map_err(|source| Error::Inconsistent { id: migration.id.clone(), source })?;
            migrations.push(migration.id.clone());
        }

        info!("applied {} migration(s)", migrations.len());
        Ok(Report { direction: Direction::Up, migrations })
    }

    async fn down_locked(&self, count: usize) -> Result<Report> {
        let applied = self.store.applied_migrations().await?;

        let mut migrations = Vec::new();
        for record in applied.iter().rev().take(count) {
            let id = MigrationId::from(record.id.as_str());
            let migration = self
                .set
                .get(&id)
                .ok_or_else(|| Error::UnknownMigration(id.clone()))?;
            info!("rolling back migration {}", migration.id);
            (migration.down)(self.store).await.map_err(|source| Error::Revert {
                id: migration.id.clone(),
                source: Box::new(source),
            })?;
            self.store
                .delete_record(migration.id.as_str())
                .await
                .map_err(|source| Error::Inconsistent { id: migration.id.clone(), source })?;
            migrations.push(migration.id.clone());
        }

        info!("rolled back {} migration(s)", migrations.len());
        Ok(Report { direction: Direction::Down, migrations })
    }
}
