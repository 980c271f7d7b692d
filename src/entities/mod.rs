//! Catalog entities and their listing behavior.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::filtering::{STATUS_APPROVED, STATUS_ON_REVIEW};

pub mod benchmark;
pub mod benchmark_result;
pub mod flavor;
pub mod result_tags;
pub mod site;
pub mod tag;
pub mod user;

pub use benchmark::Benchmark;
pub use benchmark_result::BenchmarkResult;
pub use flavor::Flavor;
pub use site::Site;
pub use tag::Tag;
pub use user::User;

/// Review state of user submitted resources.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "on_review")]
    OnReview,
}

impl ApprovalStatus {
    /// Status named by a `status` query parameter; `all` is not a status.
    #[must_use]
    pub fn from_filter(value: &str) -> Option<Self> {
        match value {
            STATUS_APPROVED => Some(Self::Approved),
            STATUS_ON_REVIEW => Some(Self::OnReview),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_filter() {
        assert_eq!(ApprovalStatus::from_filter("approved"), Some(ApprovalStatus::Approved));
        assert_eq!(ApprovalStatus::from_filter("on_review"), Some(ApprovalStatus::OnReview));
        assert_eq!(ApprovalStatus::from_filter("all"), None);
    }

    #[test]
    fn test_status_serializes_like_the_filter_values() {
        assert_eq!(
            serde_json::to_value(ApprovalStatus::OnReview).unwrap(),
            serde_json::json!("on_review")
        );
        assert_eq!(ApprovalStatus::Approved.to_value(), "approved");
    }
}
