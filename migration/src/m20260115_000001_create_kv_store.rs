use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(KvStore::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(KvStore::Key)
              .string()
              .not_null()
              .primary_key(),
          )
          .col(ColumnDef::new(KvStore::Value).text().not_null())
          .col(ColumnDef::new(KvStore::UpdatedAt).date_time().not_null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(KvStore::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum KvStore {
  Table,
  Key,
  Value,
  UpdatedAt,
}
