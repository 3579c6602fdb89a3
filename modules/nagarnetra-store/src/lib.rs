mod memory;
mod postgres;

pub use memory::MemoryIssueStore;
pub use postgres::PgIssueStore;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use nagarnetra_common::Issue;

/// Persistence boundary for issue records.
///
/// `issues_by_type` is an O(issues-of-this-type) scan: the backend filters
/// by an equality predicate and returns rows in stable creation order, and
/// the caller walks them computing distances. Fine at municipal scale; a
/// spatial bucket index is the hardening point if it ever is not.
#[async_trait]
pub trait IssueStore: Send + Sync {
    /// All issues whose `issue_type` equals the argument, oldest first.
    async fn issues_by_type(&self, issue_type: &str) -> Result<Vec<Issue>>;

    /// Persist a fully-constructed issue in a single write.
    async fn insert(&self, issue: &Issue) -> Result<()>;

    /// Merge-path mutation: set the new vote count and touch `updated_at`.
    /// No other field of the record changes after creation.
    async fn record_vote(&self, id: Uuid, votes: u32, updated_at: DateTime<Utc>) -> Result<()>;

    async fn get(&self, id: Uuid) -> Result<Option<Issue>>;

    /// Most recently updated issues, for the read API.
    async fn recent(&self, limit: u32) -> Result<Vec<Issue>>;
}
