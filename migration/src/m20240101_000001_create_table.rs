use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table("packages")
                    .if_not_exists()
                    .col(
                        ColumnDef::new("id")
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new("name")
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new("created_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new("updated_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("releases")
                    .if_not_exists()
                    .col(
                        ColumnDef::new("id")
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new("package_id").integer().not_null())
                    .col(ColumnDef::new("version").string().not_null())
                    .col(
                        ColumnDef::new("created_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new("updated_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-releases-package_id")
                            .from("releases", "package_id")
                            .to("packages", "id"),
                    )
                    .to_owned(),
            )
            .await?;

        // Closes the check-then-insert race on concurrent publishes of
        // the same version; the pre-insert validation alone is not enough.
        manager
            .create_index(
                Index::create()
                    .name("idx-releases-package_id-version")
                    .table("releases")
                    .col("package_id")
                    .col("version")
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("requirements")
                    .if_not_exists()
                    .col(
                        ColumnDef::new("id")
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new("release_id").integer().not_null())
                    .col(ColumnDef::new("dependency_id").integer().not_null())
                    .col(ColumnDef::new("requirement").string().null())
                    .col(
                        ColumnDef::new("created_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new("updated_at")
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-requirements-release_id")
                            .from("requirements", "release_id")
                            .to("releases", "id"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-requirements-dependency_id")
                            .from("requirements", "dependency_id")
                            .to("packages", "id"),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table("requirements").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table("releases").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table("packages").to_owned())
            .await?;

        Ok(())
    }
}
