//! Meta table definitions.
//!
//! Collections, migration records and the advisory lock all live in the same
//! durable medium, so "what the store thinks is applied" cannot drift from
//! the schema that is actually stored.

use sea_query::{ColumnDef, Iden, Table, TableCreateStatement};

#[derive(Iden)]
pub enum Collections {
    Table,
    CollectionId,
    Name,
    Data,
}

#[derive(Iden)]
pub enum Migrations {
    Table,
    MigrationId,
    Applied,
}

#[derive(Iden)]
pub enum MigrationLock {
    Table,
    LockId,
    Acquired,
}

pub fn tables() -> Vec<TableCreateStatement> {
    vec![
        Table::create()
            .table(Collections::Table)
            .if_not_exists()
            .col(ColumnDef::new(Collections::CollectionId).text().not_null().primary_key())
            .col(ColumnDef::new(Collections::Name).text().not_null().unique_key())
            .col(ColumnDef::new(Collections::Data).text().not_null())
            .to_owned(),
        Table::create()
            .table(Migrations::Table)
            .if_not_exists()
            .col(ColumnDef::new(Migrations::MigrationId).text().not_null().primary_key())
            .col(ColumnDef::new(Migrations::Applied).big_integer().not_null())
            .to_owned(),
        Table::create()
            .table(MigrationLock::Table)
            .if_not_exists()
            .col(ColumnDef::new(MigrationLock::LockId).text().not_null().primary_key())
            .col(ColumnDef::new(MigrationLock::Acquired).big_integer().not_null())
            .to_owned(),
    ]
}
