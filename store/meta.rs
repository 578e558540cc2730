use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use sea_query::{PostgresQueryBuilder, SchemaBuilder, SqliteQueryBuilder};
use sqlx::any::{AnyKind, AnyPoolOptions};
use sqlx::{AnyPool, Row};
use strata_schema::Collection;

use crate::error::StoreError;
use crate::schema;

const LOCK_ID: &str = "strata";

/// Durable store for collection schemas and migration records.
///
/// Collections are stored as JSON documents; the migration engine treats this
/// as an opaque store and never assumes a particular backing engine beyond
/// SQLite or Postgres, chosen by the connection URI. The pool is exposed for
/// callers that need to run their own statements against the same database.
#[derive(Debug, Clone)]
pub struct MetaStore {
    pub pool: AnyPool,
}

/// One applied migration: created on a successful `up`, deleted on a
/// successful `down`. The set of records is the durable "current schema
/// version" marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    pub id: String,
    pub applied: i64,
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

// Unique-constraint violations are how the single-row lock reports
// contention. SQLite uses extended result codes 1555 (primary key) and 2067
// (unique index); Postgres uses SQLSTATE 23505.
fn is_unique_violation(err: &dyn sqlx::error::DatabaseError) -> bool {
    matches!(err.code().as_deref(), Some("1555") | Some("2067") | Some("23505"))
}

impl MetaStore {
    pub async fn connect(uri: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect(uri)
            .await
            .map_err(|source| StoreError::Connect { uri: uri.to_owned(), source })?;
        Ok(Self { pool })
    }

    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    fn schema_builder(&self) -> &dyn SchemaBuilder {
        match self.pool.any_kind() {
            AnyKind::Postgres => &PostgresQueryBuilder,
            AnyKind::Sqlite => &SqliteQueryBuilder,
        }
    }

    /// Creates the meta tables if they do not exist yet. Safe to call on
    /// every startup.
    pub async fn create_tables(&self) -> Result<(), StoreError> {
        let builder = self.schema_builder();
        for table in schema::tables() {
            let sql = table.build_any(builder);
            debug!("creating meta table: {}", sql);
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Resolves a collection by either its id or its name.
    pub async fn find_collection_by_name_or_id(
        &self,
        reference: &str,
    ) -> Result<Collection, StoreError> {
        let query = sqlx::query("SELECT data FROM collections WHERE collection_id = $1 OR name = $1")
            .bind(reference.to_owned());
        match query.fetch_optional(&self.pool).await? {
            Some(row) => {
                let data: String = row.get("data");
                Ok(serde_json::from_str(&data)?)
            }
            None => Err(StoreError::CollectionNotFound(reference.to_owned())),
        }
    }

    /// Persists a collection in a single statement. If this fails, the
    /// in-memory value the caller holds was never committed.
    pub async fn save_collection(&self, collection: &Collection) -> Result<(), StoreError> {
        let data = serde_json::to_string(collection)?;
        let query = sqlx::query(
            r#"
            INSERT INTO collections (collection_id, name, data)
            VALUES ($1, $2, $3)
            ON CONFLICT(collection_id) DO UPDATE SET name = $2, data = $3"#,
        )
        .bind(collection.id.clone())
        .bind(collection.name.clone())
        .bind(data);
        query.execute(&self.pool).await?;
        Ok(())
    }

    pub async fn delete_collection(&self, reference: &str) -> Result<(), StoreError> {
        let query = sqlx::query("DELETE FROM collections WHERE collection_id = $1 OR name = $1")
            .bind(reference.to_owned());
        query.execute(&self.pool).await?;
        Ok(())
    }

    /// All applied migration records, in ascending id order.
    pub async fn applied_migrations(&self) -> Result<Vec<MigrationRecord>, StoreError> {
        let query = sqlx::query(
            "SELECT migration_id, applied FROM migrations ORDER BY migration_id ASC",
        );
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| MigrationRecord {
                id: row.get("migration_id"),
                applied: row.get("applied"),
            })
            .collect())
    }

    pub async fn record_applied(&self, migration_id: &str) -> Result<(), StoreError> {
        let query = sqlx::query("INSERT INTO migrations (migration_id, applied) VALUES ($1, $2)")
            .bind(migration_id.to_owned())
            .bind(unix_now());
        query.execute(&self.pool).await?;
        Ok(())
    }

    pub async fn delete_record(&self, migration_id: &str) -> Result<(), StoreError> {
        let query = sqlx::query("DELETE FROM migrations WHERE migration_id = $1")
            .bind(migration_id.to_owned());
        query.execute(&self.pool).await?;
        Ok(())
    }

    /// Acquires the advisory migration lock, failing fast with
    /// [`StoreError::Locked`] when another batch holds it. The lock is a
    /// single row, so a concurrent insert trips a unique violation; any
    /// other database failure is a storage error, not contention.
    pub async fn acquire_lock(&self) -> Result<(), StoreError> {
        let query = sqlx::query("INSERT INTO migration_lock (lock_id, acquired) VALUES ($1, $2)")
            .bind(LOCK_ID.to_owned())
            .bind(unix_now());
        match query.execute(&self.pool).await {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(err)) if is_unique_violation(err.as_ref()) => {
                Err(StoreError::Locked)
            }
            Err(err) => Err(StoreError::Persistence(err)),
        }
    }

    /// Releases the advisory lock. Also used by the operator to clear a lock
    /// left behind by a crashed batch.
    pub async fn release_lock(&self) -> Result<(), StoreError> {
        let query = sqlx::query("DELETE FROM migration_lock WHERE lock_id = $1")
            .bind(LOCK_ID.to_owned());
        query.execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_schema::{Field, FieldType, RuleKind};
    use tempdir::TempDir;

    async fn test_store(dir: &TempDir) -> MetaStore {
        let path = dir.path().join("strata.db");
        let uri = format!("sqlite://{}?mode=rwc", path.display());
        let store = MetaStore::connect(&uri, 1).await.unwrap();
        store.create_tables().await.unwrap();
        store
    }

    #[tokio::test]
    async fn create_tables_is_idempotent() {
        let dir = TempDir::new("create_tables").unwrap();
        let store = test_store(&dir).await;
        store.create_tables().await.unwrap();
    }

    #[tokio::test]
    async fn save_and_find_collection() {
        let dir = TempDir::new("save_and_find").unwrap();
        let store = test_store(&dir).await;

        let mut donations = Collection::new("pbc_2848092154", "donations");
        donations
            .add_field(Field::new("text1", "username", FieldType::text()))
            .unwrap();
        donations.set_rule(RuleKind::List, Some("@request.auth.id != \"\"".into()));
        store.save_collection(&donations).await.unwrap();

        let by_id = store
            .find_collection_by_name_or_id("pbc_2848092154")
            .await
            .unwrap();
        let by_name = store.find_collection_by_name_or_id("donations").await.unwrap();
        assert_eq!(by_id, donations);
        assert_eq!(by_name, donations);

        let err = store.find_collection_by_name_or_id("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::CollectionNotFound(r) if r == "nope"));
    }

    #[tokio::test]
    async fn save_collection_upserts() {
        let dir = TempDir::new("upsert").unwrap();
        let store = test_store(&dir).await;

        let mut c = Collection::new("pbc_1", "donations");
        store.save_collection(&c).await.unwrap();

        c.add_field(Field::new("bool1", "anonymous", FieldType::Bool)).unwrap();
        store.save_collection(&c).await.unwrap();

        let loaded = store.find_collection_by_name_or_id("pbc_1").await.unwrap();
        assert_eq!(loaded.fields.len(), 1);
    }

    #[tokio::test]
    async fn delete_collection_removes_it() {
        let dir = TempDir::new("delete_collection").unwrap();
        let store = test_store(&dir).await;

        store.save_collection(&Collection::new("pbc_1", "donations")).await.unwrap();
        store.delete_collection("donations").await.unwrap();
        let err = store.find_collection_by_name_or_id("pbc_1").await.unwrap_err();
        assert!(matches!(err, StoreError::CollectionNotFound(_)));
    }

    #[tokio::test]
    async fn migration_records_are_sorted() {
        let dir = TempDir::new("records").unwrap();
        let store = test_store(&dir).await;

        store.record_applied("1734599932_updated_donations").await.unwrap();
        store.record_applied("1734500000_seed_donations").await.unwrap();

        let records = store.applied_migrations().await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1734500000_seed_donations", "1734599932_updated_donations"]);
        assert!(records.iter().all(|r| r.applied > 0));

        store.delete_record("1734599932_updated_donations").await.unwrap();
        let records = store.applied_migrations().await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn lock_is_exclusive() {
        let dir = TempDir::new("lock").unwrap();
        let store = test_store(&dir).await;

        store.acquire_lock().await.unwrap();
        let err = store.acquire_lock().await.unwrap_err();
        assert!(matches!(err, StoreError::Locked));

        store.release_lock().await.unwrap();
        store.acquire_lock().await.unwrap();
    }

    #[tokio::test]
    async fn lock_storage_failures_are_not_contention() {
        let dir = TempDir::new("lock_no_tables").unwrap();
        let path = dir.path().join("strata.db");
        let uri = format!("sqlite://{}?mode=rwc", path.display());
        // no create_tables: the lock insert hits a missing table
        let store = MetaStore::connect(&uri, 1).await.unwrap();

        let err = store.acquire_lock().await.unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)), "got {err:?}");
    }
}
