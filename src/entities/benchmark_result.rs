use std::collections::HashMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    Condition, DatabaseConnection, QueryFilter, QueryOrder,
    entity::prelude::*,
    sea_query::{Expr, Query, SimpleExpr},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{benchmark, flavor, result_tags, site, tag};
use crate::core::CatalogResource;
use crate::filtering::{
    FieldKind, FieldRole, FieldSpec, FilterSpec, pagination_options, search, search_options,
    upload_options,
};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "result")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub execution_datetime: DateTime<Utc>,
    pub json: Json,
    pub benchmark_id: Uuid,
    pub site_id: Uuid,
    pub flavor_id: Uuid,
    pub uploader_iss: String,
    pub uploader_sub: String,
    pub upload_datetime: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::benchmark::Entity",
        from = "Column::BenchmarkId",
        to = "super::benchmark::Column::Id"
    )]
    Benchmark,
    #[sea_orm(
        belongs_to = "super::site::Entity",
        from = "Column::SiteId",
        to = "super::site::Column::Id"
    )]
    Site,
    #[sea_orm(
        belongs_to = "super::flavor::Entity",
        from = "Column::FlavorId",
        to = "super::flavor::Column::Id"
    )]
    Flavor,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "(Column::UploaderIss, Column::UploaderSub)",
        to = "(super::user::Column::Iss, super::user::Column::Sub)"
    )]
    Uploader,
    #[sea_orm(has_many = "super::result_tags::Entity")]
    ResultTags,
}

impl Related<super::benchmark::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Benchmark.def()
    }
}

impl Related<super::site::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Site.def()
    }
}

impl Related<super::flavor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Flavor.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::result_tags::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::result_tags::Relation::BenchmarkResult.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// The JSON output of one benchmark execution and its context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BenchmarkResult {
    pub id: Uuid,
    /// START execution datetime of the result
    pub execution_datetime: DateTime<Utc>,
    #[schema(value_type = Object)]
    pub json: serde_json::Value,
    pub benchmark_id: Uuid,
    pub site_id: Uuid,
    pub flavor_id: Uuid,
    pub tags_ids: Vec<Uuid>,
    pub upload_datetime: DateTime<Utc>,
}

impl From<Model> for BenchmarkResult {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            execution_datetime: model.execution_datetime,
            json: model.json,
            benchmark_id: model.benchmark_id,
            site_id: model.site_id,
            flavor_id: model.flavor_id,
            tags_ids: Vec::new(),
            upload_datetime: model.upload_datetime,
        }
    }
}

static FILTERS: LazyLock<FilterSpec> = LazyLock::new(|| {
    FilterSpec::new(BenchmarkResult::RESOURCE_NAME_PLURAL)
        .with(pagination_options())
        .with(upload_options())
        .field(
            FieldSpec::new(
                "execution_before",
                FieldKind::Date,
                FieldRole::OnOrBefore("execution_datetime"),
            )
            .describe("Results executed on or before date (ISO8601)"),
        )
        .field(
            FieldSpec::new(
                "execution_after",
                FieldKind::Date,
                FieldRole::OnOrAfter("execution_datetime"),
            )
            .describe("Results executed on or after date (ISO8601)"),
        )
        .field(FieldSpec::uuid("benchmark_id").describe("UUID benchmark unique identification"))
        .field(FieldSpec::uuid("site_id").describe("UUID site unique identification"))
        .field(FieldSpec::uuid("flavor_id").describe("UUID flavor unique identification"))
        .field(
            FieldSpec::new("tags_ids", FieldKind::UuidList, FieldRole::Related)
                .describe("Results carrying at least one of the tags"),
        )
        .field(
            FieldSpec::new("filters", FieldKind::TextList, FieldRole::Predicates)
                .describe("JSON filter conditions: <json.path> <operator> <value>"),
        )
        .sort_default("+execution_datetime")
});

static SEARCH: LazyLock<FilterSpec> = LazyLock::new(|| {
    FilterSpec::new(BenchmarkResult::RESOURCE_NAME_PLURAL)
        .with(pagination_options())
        .with(upload_options())
        .with(search_options())
        .sort_default("+execution_datetime")
});

fn benchmark_matches(keyword: &str) -> SimpleExpr {
    Column::BenchmarkId.in_subquery(
        Query::select()
            .column(benchmark::Column::Id)
            .from(benchmark::Entity)
            .cond_where(search::contains_any(
                &[benchmark::Column::DockerImage, benchmark::Column::DockerTag],
                keyword,
            ))
            .to_owned(),
    )
}

fn site_matches(keyword: &str) -> SimpleExpr {
    Column::SiteId.in_subquery(
        Query::select()
            .column(site::Column::Id)
            .from(site::Entity)
            .cond_where(search::contains_any(&[site::Column::Name], keyword))
            .to_owned(),
    )
}

fn flavor_matches(keyword: &str) -> SimpleExpr {
    Column::FlavorId.in_subquery(
        Query::select()
            .column(flavor::Column::Id)
            .from(flavor::Entity)
            .cond_where(search::contains_any(&[flavor::Column::Name], keyword))
            .to_owned(),
    )
}

fn tag_matches(keyword: &str) -> SimpleExpr {
    Column::Id.in_subquery(
        Query::select()
            .column((result_tags::Entity, result_tags::Column::ResultId))
            .from(result_tags::Entity)
            .inner_join(
                tag::Entity,
                Expr::col((tag::Entity, tag::Column::Id))
                    .equals((result_tags::Entity, result_tags::Column::TagId)),
            )
            .cond_where(search::contains_any(&[tag::Column::Name], keyword))
            .to_owned(),
    )
}

impl BenchmarkResult {
    async fn load_tags(
        db: &DatabaseConnection,
        results: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Uuid>>, DbErr> {
        let links = result_tags::Entity::find()
            .filter(result_tags::Column::ResultId.is_in(results.iter().copied()))
            .order_by_asc(result_tags::Column::TagId)
            .all(db)
            .await?;
        let mut tags: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for link in links {
            tags.entry(link.result_id).or_default().push(link.tag_id);
        }
        Ok(tags)
    }
}

#[async_trait]
impl CatalogResource for BenchmarkResult {
    type EntityType = Entity;
    type ColumnType = Column;

    const RESOURCE_NAME_SINGULAR: &'static str = "result";
    const RESOURCE_NAME_PLURAL: &'static str = "results";
    const RESOURCE_DESCRIPTION: &'static str = "Benchmark execution results";

    fn filter_spec() -> &'static FilterSpec {
        &FILTERS
    }

    fn search_spec() -> &'static FilterSpec {
        &SEARCH
    }

    fn sortable_columns() -> Vec<(&'static str, Column)> {
        vec![
            ("id", Column::Id),
            ("execution_datetime", Column::ExecutionDatetime),
            ("upload_datetime", Column::UploadDatetime),
            ("benchmark_id", Column::BenchmarkId),
            ("site_id", Column::SiteId),
            ("flavor_id", Column::FlavorId),
        ]
    }

    /// Docker image, docker tag, site name, flavor name or a tag name
    /// containing the keyword.
    fn search_condition(keyword: &str) -> Condition {
        Condition::any()
            .add(benchmark_matches(keyword))
            .add(site_matches(keyword))
            .add(flavor_matches(keyword))
            .add(tag_matches(keyword))
    }

    fn uploader_columns() -> Option<(Column, Column)> {
        Some((Column::UploaderIss, Column::UploaderSub))
    }

    fn document_column() -> Option<Column> {
        Some(Column::Json)
    }

    fn related_condition(field: &str, ids: &[Uuid]) -> Option<Condition> {
        match field {
            "tags_ids" => Some(
                Condition::all().add(
                    Column::Id.in_subquery(
                        Query::select()
                            .column(result_tags::Column::ResultId)
                            .from(result_tags::Entity)
                            .and_where(result_tags::Column::TagId.is_in(ids.iter().copied()))
                            .to_owned(),
                    ),
                ),
            ),
            _ => None,
        }
    }

    async fn enrich(db: &DatabaseConnection, items: &mut [Self]) -> Result<(), DbErr> {
        if items.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();
        let mut tags = Self::load_tags(db, &ids).await?;
        for item in items.iter_mut() {
            item.tags_ids = tags.remove(&item.id).unwrap_or_default();
        }
        Ok(())
    }
}
