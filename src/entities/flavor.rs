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
#[sea_orm(table_name = "flavor")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub site_id: Uuid,
    pub status: ApprovalStatus,
    pub uploader_iss: String,
    pub uploader_sub: String,
    pub upload_datetime: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::site::Entity",
        from = "Column::SiteId",
        to = "super::site::Column::Id"
    )]
    Site,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "(Column::UploaderIss, Column::UploaderSub)",
        to = "(super::user::Column::Iss, super::user::Column::Sub)"
    )]
    Uploader,
}

impl Related<super::site::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Site.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Uploader.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A virtual hardware template offered by a site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Flavor {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub site_id: Uuid,
    pub status: ApprovalStatus,
    pub upload_datetime: DateTime<Utc>,
}

impl From<Model> for Flavor {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            site_id: model.site_id,
            status: model.status,
            upload_datetime: model.upload_datetime,
        }
    }
}

static FILTERS: LazyLock<FilterSpec> = LazyLock::new(|| {
    FilterSpec::new(Flavor::RESOURCE_NAME_PLURAL)
        .with(pagination_options())
        .with(upload_options())
        .with(status_options())
        .field(
            FieldSpec::equals("name")
                .describe("String with virtual hardware template identification"),
        )
        .sort_default("+name")
});

static SEARCH: LazyLock<FilterSpec> = LazyLock::new(|| {
    FilterSpec::new(Flavor::RESOURCE_NAME_PLURAL)
        .with(pagination_options())
        .with(upload_options())
        .with(status_options())
        .with(search_options())
        .sort_default("+name")
});

impl CatalogResource for Flavor {
    type EntityType = Entity;
    type ColumnType = Column;

    const RESOURCE_NAME_SINGULAR: &'static str = "flavor";
    const RESOURCE_NAME_PLURAL: &'static str = "flavors";
    const RESOURCE_DESCRIPTION: &'static str = "Virtual hardware templates";

    fn filter_spec() -> &'static FilterSpec {
        &FILTERS
    }

    fn search_spec() -> &'static FilterSpec {
        &SEARCH
    }

    fn sortable_columns() -> Vec<(&'static str, Column)> {
        vec![
            ("id", Column::Id),
            ("name", Column::Name),
            ("site_id", Column::SiteId),
            ("upload_datetime", Column::UploadDatetime),
        ]
    }

    fn search_condition(keyword: &str) -> Condition {
        search::contains_any(&[Column::Name, Column::Description], keyword)
    }

    fn status_column() -> Option<Column> {
        Some(Column::Status)
    }

    fn uploader_columns() -> Option<(Column, Column)> {
        Some((Column::UploaderIss, Column::UploaderSub))
    }
}
