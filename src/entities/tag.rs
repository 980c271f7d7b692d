use std::sync::LazyLock;

use sea_orm::{Condition, entity::prelude::*};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::CatalogResource;
use crate::filtering::{FieldSpec, FilterSpec, pagination_options, search, search_options};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tag")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Short label used to classify results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl From<Model> for Tag {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
        }
    }
}

static FILTERS: LazyLock<FilterSpec> = LazyLock::new(|| {
    FilterSpec::new(Tag::RESOURCE_NAME_PLURAL)
        .with(pagination_options())
        .field(FieldSpec::equals("name").describe("String with short feature identification"))
        .sort_default("+name")
});

static SEARCH: LazyLock<FilterSpec> = LazyLock::new(|| {
    FilterSpec::new(Tag::RESOURCE_NAME_PLURAL)
        .with(pagination_options())
        .with(search_options())
        .sort_default("+name")
});

impl CatalogResource for Tag {
    type EntityType = Entity;
    type ColumnType = Column;

    const RESOURCE_NAME_SINGULAR: &'static str = "tag";
    const RESOURCE_NAME_PLURAL: &'static str = "tags";
    const RESOURCE_DESCRIPTION: &'static str = "Labels attached to results";

    fn filter_spec() -> &'static FilterSpec {
        &FILTERS
    }

    fn search_spec() -> &'static FilterSpec {
        &SEARCH
    }

    fn sortable_columns() -> Vec<(&'static str, Column)> {
        vec![("id", Column::Id), ("name", Column::Name)]
    }

    fn search_condition(keyword: &str) -> Condition {
        search::contains_any(&[Column::Name, Column::Description], keyword)
    }
}
