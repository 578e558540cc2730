//! The donations migration set.
//!
//! Three migrations covering the life of the `donations` collection: seeding
//! it, adding the `status` select field, and the later change that extends
//! the select values and locks updates behind authentication. Each `down` is
//! the inverse of its `up`.

use futures::future::BoxFuture;
use strata_migrate::{Migration, MigrationSet, Result};
use strata_schema::{Collection, Field, FieldType, RuleKind};
use strata_store::MetaStore;

const DONATIONS: &str = "pbc_2848092154";

pub fn set() -> Result<MigrationSet> {
    let mut set = MigrationSet::new();
    set.register(Migration::new(
        "1734500000_seed_donations",
        seed_donations_up,
        seed_donations_down,
    ))?;
    set.register(Migration::new(
        "1734550000_add_status",
        add_status_up,
        add_status_down,
    ))?;
    set.register(Migration::new(
        "1734599932_updated_donations",
        updated_donations_up,
        updated_donations_down,
    ))?;
    Ok(set)
}

fn status_field(values: &[&str]) -> Field {
    Field::new("select2063623452", "status", FieldType::select(1, values))
}

fn seed_donations_up(store: &MetaStore) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let mut collection = Collection::new(DONATIONS, "donations");
        collection.add_field(Field::new("text3208210256", "username", FieldType::text()))?;
        collection.add_field(Field::new("text2599078931", "message", FieldType::text()))?;
        collection.add_field(Field::new("number2392944706", "amount", FieldType::number()))?;
        store.save_collection(&collection).await?;
        Ok(())
    })
}

fn seed_donations_down(store: &MetaStore) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        store.delete_collection(DONATIONS).await?;
        Ok(())
    })
}

fn add_status_up(store: &MetaStore) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let mut collection = store.find_collection_by_name_or_id(DONATIONS).await?;
        collection.add_field_at(3, status_field(&["pending_review", "in_review", "accepted"]))?;
        store.save_collection(&collection).await?;
        Ok(())
    })
}

fn add_status_down(store: &MetaStore) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let mut collection = store.find_collection_by_name_or_id(DONATIONS).await?;
        collection.remove_field("select2063623452")?;
        store.save_collection(&collection).await?;
        Ok(())
    })
}

fn updated_donations_up(store: &MetaStore) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let mut collection = store.find_collection_by_name_or_id(DONATIONS).await?;
        collection.set_rule(RuleKind::Update, Some("@request.auth.id != \"\"".into()));
        collection.replace_field(status_field(&[
            "pending_review",
            "in_review",
            "rejected",
            "accepted",
        ]))?;
        store.save_collection(&collection).await?;
        Ok(())
    })
}

fn updated_donations_down(store: &MetaStore) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let mut collection = store.find_collection_by_name_or_id(DONATIONS).await?;
        collection.set_rule(RuleKind::Update, None);
        collection.replace_field(status_field(&["pending_review", "in_review", "accepted"]))?;
        store.save_collection(&collection).await?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_migrate::Runner;
    use strata_store::StoreError;
    use tempdir::TempDir;

    #[tokio::test]
    async fn demo_set_applies_and_unwinds() {
        let dir = TempDir::new("demo_set").unwrap();
        let path = dir.path().join("strata.db");
        let uri = format!("sqlite://{}?mode=rwc", path.display());
        let store = MetaStore::connect(&uri, 1).await.unwrap();
        store.create_tables().await.unwrap();

        let set = super::set().unwrap();
        let runner = Runner::new(&store, &set);

        let report = runner.up().await.unwrap();
        assert_eq!(report.migrations.len(), 3);

        let collection = store.find_collection_by_name_or_id("donations").await.unwrap();
        assert_eq!(collection.fields.len(), 4);
        assert_eq!(collection.fields[3].name, "status");
        assert_eq!(collection.update_rule.as_deref(), Some("@request.auth.id != \"\""));
        match &collection.fields[3].type_ {
            FieldType::Select { values, .. } => assert_eq!(values.len(), 4),
            other => panic!("unexpected field type: {other:?}"),
        }

        runner.down(3).await.unwrap();
        let err = store.find_collection_by_name_or_id("donations").await.unwrap_err();
        assert!(matches!(err, StoreError::CollectionNotFound(_)));
    }
}
