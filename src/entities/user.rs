use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use sea_orm::{Condition, entity::prelude::*};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::CatalogResource;
use crate::filtering::{FieldSpec, FilterSpec, pagination_options, search, search_options};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub iss: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub sub: String,
    pub email: String,
    pub registration_datetime: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// A registered OIDC identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// OIDC subject
    pub sub: String,
    /// OIDC issuer
    pub iss: String,
    pub email: String,
    pub registration_datetime: DateTime<Utc>,
}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            sub: model.sub,
            iss: model.iss,
            email: model.email,
            registration_datetime: model.registration_datetime,
        }
    }
}

static FILTERS: LazyLock<FilterSpec> = LazyLock::new(|| {
    FilterSpec::new(User::RESOURCE_NAME_PLURAL)
        .with(pagination_options())
        .field(FieldSpec::equals("sub").describe("String containing an OIDC subject"))
        .field(FieldSpec::equals("iss").describe("String containing an OIDC issuer"))
        .field(FieldSpec::equals("email").describe("Email of user collected by the OIDC token"))
        .sort_default("+iss,+sub")
});

static SEARCH: LazyLock<FilterSpec> = LazyLock::new(|| {
    FilterSpec::new(User::RESOURCE_NAME_PLURAL)
        .with(pagination_options())
        .with(search_options())
        .sort_default("+iss,+sub")
});

impl CatalogResource for User {
    type EntityType = Entity;
    type ColumnType = Column;

    const RESOURCE_NAME_SINGULAR: &'static str = "user";
    const RESOURCE_NAME_PLURAL: &'static str = "users";
    const RESOURCE_DESCRIPTION: &'static str = "Registered users";

    fn filter_spec() -> &'static FilterSpec {
        &FILTERS
    }

    fn search_spec() -> &'static FilterSpec {
        &SEARCH
    }

    fn sortable_columns() -> Vec<(&'static str, Column)> {
        vec![
            ("iss", Column::Iss),
            ("sub", Column::Sub),
            ("email", Column::Email),
            ("registration_datetime", Column::RegistrationDatetime),
        ]
    }

    fn search_condition(keyword: &str) -> Condition {
        search::contains_any(&[Column::Email, Column::Iss, Column::Sub], keyword)
    }
}
