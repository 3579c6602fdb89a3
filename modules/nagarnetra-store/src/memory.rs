use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use nagarnetra_common::Issue;

use crate::IssueStore;

/// In-memory issue store. Backs engine tests and local runs without
/// Postgres. Insertion order is preserved so the first-match duplicate scan
/// behaves exactly like the database-backed scan.
#[derive(Default)]
pub struct MemoryIssueStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    issues: HashMap<Uuid, Issue>,
    order: Vec<Uuid>,
}

impl MemoryIssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored issues. Test convenience.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IssueStore for MemoryIssueStore {
    async fn issues_by_type(&self, issue_type: &str) -> Result<Vec<Issue>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.issues.get(id))
            .filter(|i| i.issue_type == issue_type)
            .cloned()
            .collect())
    }

    async fn insert(&self, issue: &Issue) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.issues.insert(issue.id, issue.clone()).is_none() {
            inner.order.push(issue.id);
        }
        Ok(())
    }

    async fn record_vote(&self, id: Uuid, votes: u32, updated_at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.issues.get_mut(&id) {
            Some(issue) => {
                issue.votes = votes;
                issue.updated_at = updated_at;
                Ok(())
            }
            None => bail!("no issue with id {id}"),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Issue>> {
        Ok(self.inner.lock().unwrap().issues.get(&id).cloned())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<Issue>> {
        let inner = self.inner.lock().unwrap();
        let mut all: Vec<Issue> = inner.issues.values().cloned().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        all.truncate(limit as usize);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nagarnetra_common::{BoundingBox, Detection, InsightBundle, IssueStatus, SeverityLevel};

    fn issue(issue_type: &str, lat: f64) -> Issue {
        let now = Utc::now();
        Issue {
            id: Uuid::new_v4(),
            issue_type: issue_type.to_string(),
            severity: 7,
            confidence: 0.8,
            detections: vec![Detection {
                label: issue_type.to_string(),
                confidence: 0.8,
                severity: 7,
                bbox: BoundingBox { x1: 0, y1: 0, x2: 10, y2: 10 },
            }],
            latitude: lat,
            longitude: 77.2,
            votes: 1,
            voters: vec![],
            status: IssueStatus::Open,
            department: "Roads Department".to_string(),
            ai: InsightBundle {
                description_en: "x".to_string(),
                description_hi: "x".to_string(),
                why_it_matters: "x".to_string(),
                severity_level: SeverityLevel::High,
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn scan_preserves_insertion_order_and_filters_type() {
        let store = MemoryIssueStore::new();
        let first = issue("pothole", 28.61);
        let second = issue("garbage pile", 28.62);
        let third = issue("pothole", 28.63);
        store.insert(&first).await.unwrap();
        store.insert(&second).await.unwrap();
        store.insert(&third).await.unwrap();

        let potholes = store.issues_by_type("pothole").await.unwrap();
        assert_eq!(potholes.len(), 2);
        assert_eq!(potholes[0].id, first.id);
        assert_eq!(potholes[1].id, third.id);
    }

    #[tokio::test]
    async fn record_vote_touches_only_votes_and_updated_at() {
        let store = MemoryIssueStore::new();
        let original = issue("open drain", 28.61);
        store.insert(&original).await.unwrap();

        let later = original.updated_at + chrono::Duration::minutes(5);
        store.record_vote(original.id, 2, later).await.unwrap();

        let stored = store.get(original.id).await.unwrap().unwrap();
        assert_eq!(stored.votes, 2);
        assert_eq!(stored.updated_at, later);
        assert_eq!(stored.created_at, original.created_at);
        assert_eq!(stored.latitude, original.latitude);
    }

    #[tokio::test]
    async fn record_vote_on_unknown_id_errors() {
        let store = MemoryIssueStore::new();
        let err = store.record_vote(Uuid::new_v4(), 2, Utc::now()).await;
        assert!(err.is_err());
    }
}
