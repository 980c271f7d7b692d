use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, Iterable, PrimaryKeyToColumn,
};
use serde::Serialize;
use uuid::Uuid;

use crate::filtering::FilterSpec;

/// A catalog entity exposed through filtered listings and keyword search.
///
/// Implementors describe their parameters declaratively through
/// [`FilterSpec`]s and hand the query builder the columns it cannot infer by
/// name: the approval status, the uploader identity, the JSON document and
/// the relationships reachable through id lists or keyword search.
#[async_trait]
pub trait CatalogResource: Sized + Send + Sync + Serialize
where
    Self: From<<Self::EntityType as EntityTrait>::Model>,
{
    type EntityType: EntityTrait<Column = Self::ColumnType> + Sync;
    type ColumnType: ColumnTrait + std::fmt::Debug;

    const RESOURCE_NAME_SINGULAR: &'static str;
    const RESOURCE_NAME_PLURAL: &'static str;
    const RESOURCE_DESCRIPTION: &'static str = "";

    /// Parameters accepted by `GET /{resource}`.
    fn filter_spec() -> &'static FilterSpec;

    /// Parameters accepted by `GET /{resource}/search`.
    fn search_spec() -> &'static FilterSpec;

    #[must_use]
    fn sortable_columns() -> Vec<(&'static str, Self::ColumnType)>;

    /// Rows where `keyword` is contained in any searchable projection.
    fn search_condition(keyword: &str) -> Condition;

    /// Columns appended to every ORDER BY so that it is a total order.
    #[must_use]
    fn tie_break_columns() -> Vec<Self::ColumnType> {
        <Self::EntityType as EntityTrait>::PrimaryKey::iter()
            .map(PrimaryKeyToColumn::into_column)
            .collect()
    }

    #[must_use]
    fn status_column() -> Option<Self::ColumnType> {
        None
    }

    /// Issuer and subject columns of the uploader.
    #[must_use]
    fn uploader_columns() -> Option<(Self::ColumnType, Self::ColumnType)> {
        None
    }

    /// Column holding the JSON document addressed by predicates.
    #[must_use]
    fn document_column() -> Option<Self::ColumnType> {
        None
    }

    /// Rows related to at least one of `ids` through the list field `field`.
    #[must_use]
    fn related_condition(field: &str, ids: &[Uuid]) -> Option<Condition> {
        let _ = (field, ids);
        None
    }

    /// Fill in values that live outside the entity's own table.
    async fn enrich(db: &DatabaseConnection, items: &mut [Self]) -> Result<(), DbErr> {
        let _ = (db, items);
        Ok(())
    }
}
