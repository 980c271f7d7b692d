//! # Filtering & Search
//!
//! Turns raw listing parameters into SQL conditions, sort orders and page
//! windows. Nothing in this module touches the database.
//!
//! ## Query Parameter Examples
//!
//! ```text
//! // Exact match and approval status
//! GET /sites?name=KIT&status=on_review
//!
//! // Date ranges (inclusive days)
//! GET /results?execution_after=2019-09-07&execution_before=2059-03-10
//!
//! // Membership and JSON document predicates
//! GET /results?tags_ids[]=<uuid>&filters[]=machine.cpu.count%20>%204
//!
//! // Multi-key sort and pagination
//! GET /benchmarks?sort_by=+docker_image,-docker_tag&page=2&per_page=50
//!
//! // Keyword search
//! GET /results/search?terms[]=deephdc&terms[]=gpu
//! ```

pub mod conditions;
pub mod error;
pub mod pagination;
pub mod predicate;
pub mod search;
pub mod sort;
pub mod spec;

pub use error::QueryError;
pub use pagination::{Page, PageLimits, PageRequest, content_range};
pub use predicate::{ComparisonOp, JsonPath, Literal, Predicate, parse_predicates};
pub use sort::{Direction, SortExpression, SortKey};
pub use spec::{
    FieldKind, FieldRole, FieldSpec, FieldValue, FilterSpec, FilterValues, OptionSet, QueryParams,
    STATUS_ALL, STATUS_APPROVED, STATUS_ON_REVIEW, pagination_options, search_options,
    status_options, upload_options,
};
