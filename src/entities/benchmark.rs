use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use sea_orm::{Condition, entity::prelude::*};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::ApprovalStatus;
use crate::core::CatalogResource;
use crate::filtering::{
    FieldSpec, FilterSpec, pagination_options, search, search_options, status_options,
    upload_options,
};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "benchmark")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub docker_image: String,
    pub docker_tag: String,
    pub description: Option<String>,
    pub status: ApprovalStatus,
    pub uploader_iss: String,
    pub uploader_sub: String,
    pub upload_datetime: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "(Column::UploaderIss, Column::UploaderSub)",
        to = "(super::user::Column::Iss, super::user::Column::Sub)"
    )]
    Uploader,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Uploader.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A containerized benchmark, identified by its docker image and tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Benchmark {
    pub id: Uuid,
    pub docker_image: String,
    pub docker_tag: String,
    pub description: Option<String>,
    pub status: ApprovalStatus,
    pub upload_datetime: DateTime<Utc>,
}

impl From<Model> for Benchmark {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            docker_image: model.docker_image,
            docker_tag: model.docker_tag,
            description: model.description,
            status: model.status,
            upload_datetime: model.upload_datetime,
        }
    }
}

static FILTERS: LazyLock<FilterSpec> = LazyLock::new(|| {
    FilterSpec::new(Benchmark::RESOURCE_NAME_PLURAL)
        .with(pagination_options())
        .with(upload_options())
        .with(status_options())
        .field(
            FieldSpec::equals("docker_image")
                .describe("String with a docker hub container name"),
        )
        .field(FieldSpec::equals("docker_tag").describe("String with a docker hub container tag"))
        .sort_default("+docker_image")
});

static SEARCH: LazyLock<FilterSpec> = LazyLock::new(|| {
    FilterSpec::new(Benchmark::RESOURCE_NAME_PLURAL)
        .with(pagination_options())
        .with(upload_options())
        .with(status_options())
        .with(search_options())
        .sort_default("+docker_image")
});

impl CatalogResource for Benchmark {
    type EntityType = Entity;
    type ColumnType = Column;

    const RESOURCE_NAME_SINGULAR: &'static str = "benchmark";
    const RESOURCE_NAME_PLURAL: &'static str = "benchmarks";
    const RESOURCE_DESCRIPTION: &'static str = "Containerized benchmarks";

    fn filter_spec() -> &'static FilterSpec {
        &FILTERS
    }

    fn search_spec() -> &'static FilterSpec {
        &SEARCH
    }

    fn sortable_columns() -> Vec<(&'static str, Column)> {
        vec![
            ("id", Column::Id),
            ("docker_image", Column::DockerImage),
            ("docker_tag", Column::DockerTag),
            ("upload_datetime", Column::UploadDatetime),
        ]
    }

    fn search_condition(keyword: &str) -> Condition {
        search::contains_any(
            &[Column::DockerImage, Column::DockerTag, Column::Description],
            keyword,
        )
    }

    fn status_column() -> Option<Column> {
        Some(Column::Status)
    }

    fn uploader_columns() -> Option<(Column, Column)> {
        Some((Column::UploaderIss, Column::UploaderSub))
    }
}
