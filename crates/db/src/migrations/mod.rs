//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20261018_000001_create_participant_table;
mod m20261018_000002_create_config_tables;
mod m20261018_000003_create_interaction_tables;
mod m20261018_000004_create_answer_tables;
mod m20261018_000005_create_vote_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261018_000001_create_participant_table::Migration),
            Box::new(m20261018_000002_create_config_tables::Migration),
            Box::new(m20261018_000003_create_interaction_tables::Migration),
            Box::new(m20261018_000004_create_answer_tables::Migration),
            Box::new(m20261018_000005_create_vote_table::Migration),
        ]
    }
}
