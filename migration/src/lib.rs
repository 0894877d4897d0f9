//! Database migrations using SeaORM

use sea_orm_migration::prelude::*;

mod m20260115_000001_create_kv_store;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![Box::new(m20260115_000001_create_kv_store::Migration)]
  }
}
