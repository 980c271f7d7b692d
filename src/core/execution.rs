//! Runs composed listings against the store and shapes the results.

use std::future::Future;
use std::time::Duration;

use sea_orm::{
    DatabaseConnection, EntityTrait, PaginatorTrait, PrimaryKeyTrait, QueryFilter, QuerySelect,
};
use uuid::Uuid;

use super::query_builder::ListingQuery;
use super::traits::CatalogResource;
use crate::filtering::{Page, QueryError};

async fn within<T, F>(timeout: Option<Duration>, operation: F) -> Result<T, QueryError>
where
    F: Future<Output = Result<T, QueryError>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, operation)
            .await
            .map_err(|_| QueryError::Timeout(limit))?,
        None => operation.await,
    }
}

/// Fetch one page of a listing together with the total number of matches.
///
/// Before any row is read, each JSON predicate is checked against the rows
/// matching the other filters: a present, non-null value of a kind its
/// literal cannot be compared with fails the whole request.
///
/// # Errors
///
/// [`QueryError::UnsupportedPredicateType`] for an incomparable predicate,
/// [`QueryError::StoreUnavailable`] when the store fails and
/// [`QueryError::Timeout`] when `timeout` elapses first.
pub async fn fetch_page<R>(
    db: &DatabaseConnection,
    query: &ListingQuery<R>,
    timeout: Option<Duration>,
) -> Result<Page<R>, QueryError>
where
    R: CatalogResource,
    <R::EntityType as EntityTrait>::Model: Sync,
{
    within(timeout, async {
        for (predicate, mismatch) in query.type_probes() {
            let incomparable = R::EntityType::find()
                .filter(query.base_condition().add(mismatch.clone()))
                .count(db)
                .await?;
            if incomparable > 0 {
                tracing::debug!(
                    resource = R::RESOURCE_NAME_PLURAL,
                    %predicate,
                    incomparable,
                    "predicate rejected"
                );
                return Err(predicate.unsupported());
            }
        }

        let page = query.page();
        let total = query.select().count(db).await?;
        let models = query
            .select()
            .offset(page.offset())
            .limit(page.limit())
            .all(db)
            .await?;

        let mut items: Vec<R> = models.into_iter().map(R::from).collect();
        R::enrich(db, &mut items).await?;
        Ok(Page::new(items, total, page))
    })
    .await
}

/// Fetch one record by id.
///
/// # Errors
///
/// [`QueryError::StoreUnavailable`] when the store fails and
/// [`QueryError::Timeout`] when `timeout` elapses first.
pub async fn fetch_one<R>(
    db: &DatabaseConnection,
    id: Uuid,
    timeout: Option<Duration>,
) -> Result<Option<R>, QueryError>
where
    R: CatalogResource,
    <<R::EntityType as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
{
    within(timeout, async {
        let Some(model) = R::EntityType::find_by_id(id).one(db).await? else {
            return Ok(None);
        };
        let mut items = [R::from(model)];
        R::enrich(db, &mut items).await?;
        let [item] = items;
        Ok(Some(item))
    })
    .await
}
