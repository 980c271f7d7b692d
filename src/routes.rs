use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, RawQuery, State},
    routing::get,
};
use hyper::HeaderMap;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, PrimaryKeyTrait};
use uuid::Uuid;

use crate::core::{Caller, CatalogResource, QueryBuilder, fetch_one, fetch_page};
use crate::entities::{Benchmark, BenchmarkResult, Flavor, Site, Tag, User};
use crate::errors::ApiError;
use crate::filtering::{FilterSpec, Page, PageLimits, QueryParams, content_range};
use crate::openapi;

/// Shared by every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub limits: PageLimits,
    pub query_timeout: Option<Duration>,
}

impl AppState {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            limits: PageLimits::default(),
            query_timeout: None,
        }
    }

    #[must_use]
    pub const fn limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub const fn query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }
}

type Listing<R> = Result<(HeaderMap, Json<Page<R>>), ApiError>;

async fn listing<R>(
    state: &AppState,
    spec: &FilterSpec,
    caller: &Caller,
    query: Option<String>,
) -> Listing<R>
where
    R: CatalogResource,
    <R::EntityType as EntityTrait>::Model: Sync,
{
    let params = QueryParams::parse(query.as_deref().unwrap_or_default());
    let listing = QueryBuilder::new(spec, state.db.get_database_backend())
        .limits(state.limits)
        .caller(caller.identity())
        .build::<R>(&params)?;
    let page = fetch_page(&state.db, &listing, state.query_timeout).await?;
    let headers = content_range(&page, R::RESOURCE_NAME_PLURAL);
    Ok((headers, Json(page)))
}

/// `GET /{resource}`: filter, sort and paginate.
///
/// # Errors
///
/// 400 for invalid parameters, 401 for `mine=true` without a caller and
/// 5xx when the store fails.
pub async fn get_all<R>(
    State(state): State<AppState>,
    caller: Caller,
    RawQuery(query): RawQuery,
) -> Listing<R>
where
    R: CatalogResource,
    <R::EntityType as EntityTrait>::Model: Sync,
{
    listing::<R>(&state, R::filter_spec(), &caller, query).await
}

/// `GET /{resource}/search`: every keyword of `terms` must match.
///
/// # Errors
///
/// As [`get_all`].
pub async fn search<R>(
    State(state): State<AppState>,
    caller: Caller,
    RawQuery(query): RawQuery,
) -> Listing<R>
where
    R: CatalogResource,
    <R::EntityType as EntityTrait>::Model: Sync,
{
    listing::<R>(&state, R::search_spec(), &caller, query).await
}

/// `GET /{resource}/{id}`
///
/// # Errors
///
/// 404 when no record has the id, 5xx when the store fails.
pub async fn get_one<R>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<R>, ApiError>
where
    R: CatalogResource,
    <<R::EntityType as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
{
    fetch_one::<R>(&state.db, id, state.query_timeout)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(R::RESOURCE_NAME_SINGULAR, Some(id.to_string())))
}

/// Listing and search routes of one resource.
pub fn listing_routes<R>() -> Router<AppState>
where
    R: CatalogResource + 'static,
    <R::EntityType as EntityTrait>::Model: Sync,
{
    let base = format!("/{}", R::RESOURCE_NAME_PLURAL);
    Router::new()
        .route(&base, get(get_all::<R>))
        .route(&format!("{base}/search"), get(search::<R>))
}

/// Listing, search and by-id routes of one resource.
pub fn resource_routes<R>() -> Router<AppState>
where
    R: CatalogResource + 'static,
    <R::EntityType as EntityTrait>::Model: Sync,
    <<R::EntityType as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
{
    listing_routes::<R>().route(
        &format!("/{}/{{id}}", R::RESOURCE_NAME_PLURAL),
        get(get_one::<R>),
    )
}

/// Every catalog route plus `/api-spec.json`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(listing_routes::<User>())
        .merge(resource_routes::<Tag>())
        .merge(resource_routes::<Benchmark>())
        .merge(resource_routes::<Site>())
        .merge(resource_routes::<Flavor>())
        .merge(resource_routes::<BenchmarkResult>())
        .route("/api-spec.json", get(openapi::api_spec))
        .with_state(state)
}
