//! Schema bootstrap: every catalog table, created from the entity definitions.

use sea_orm::{EntityTrait, Schema};
use sea_orm_migration::prelude::*;

use crate::entities::{benchmark, benchmark_result, flavor, result_tags, site, tag, user};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateCatalogTables)]
    }
}

pub struct CreateCatalogTables;

impl MigrationName for CreateCatalogTables {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_catalog_tables"
    }
}

async fn create<E: EntityTrait>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr> {
    let schema = Schema::new(manager.get_database_backend());
    manager
        .create_table(schema.create_table_from_entity(entity).if_not_exists().to_owned())
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for CreateCatalogTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Referenced tables first.
        create(manager, user::Entity).await?;
        create(manager, tag::Entity).await?;
        create(manager, benchmark::Entity).await?;
        create(manager, site::Entity).await?;
        create(manager, flavor::Entity).await?;
        create(manager, benchmark_result::Entity).await?;
        create(manager, result_tags::Entity).await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_benchmark_docker_image_tag")
                    .table(benchmark::Entity)
                    .col(benchmark::Column::DockerImage)
                    .col(benchmark::Column::DockerTag)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("ux_flavor_site_name")
                    .table(flavor::Entity)
                    .col(flavor::Column::SiteId)
                    .col(flavor::Column::Name)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("ix_result_execution_datetime")
                    .table(benchmark_result::Entity)
                    .col(benchmark_result::Column::ExecutionDatetime)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            result_tags::Entity.into_table_ref(),
            benchmark_result::Entity.into_table_ref(),
            flavor::Entity.into_table_ref(),
            site::Entity.into_table_ref(),
            benchmark::Entity.into_table_ref(),
            tag::Entity.into_table_ref(),
            user::Entity.into_table_ref(),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}
