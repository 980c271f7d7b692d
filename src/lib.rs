//! # eosc-perf
//!
//! Read side of a catalog of benchmark results: users, tags, benchmarks,
//! sites, flavors and results, each exposed as a filtered, searchable,
//! paginated listing over Axum and Sea-ORM.
//!
//! Each resource declares the parameters it accepts as a
//! [`FilterSpec`](crate::filtering::FilterSpec). A request is validated against it,
//! composed into one [`ListingQuery`](crate::core::ListingQuery) by the
//! [`QueryBuilder`](crate::core::QueryBuilder) and executed with
//! [`fetch_page`](crate::core::fetch_page), which returns the page together with the
//! total number of matches.
//!
//! ```rust,no_run
//! use eosc_perf::{AppState, router};
//! use sea_orm::Database;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite::memory:").await?;
//! let app = router(AppState::new(db));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod errors;
pub mod filtering;
pub mod migration;
pub mod openapi;
pub mod routes;

pub use config::{ConfigError, Settings};
pub use crate::core::{Caller, CatalogResource, Identity, QueryBuilder, fetch_one, fetch_page};
pub use errors::{ApiError, ErrorResponse};
pub use filtering::{Page, PageLimits, QueryError, QueryParams};
pub use migration::Migrator;
pub use routes::{AppState, router};
