pub mod execution;
pub mod identity;
pub mod query_builder;
pub mod traits;

pub use execution::{fetch_one, fetch_page};
pub use identity::{Caller, Identity};
pub use query_builder::{ListingQuery, QueryBuilder};
pub use traits::CatalogResource;
