// Postgres persistence for issue records.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use nagarnetra_common::{Detection, InsightBundle, Issue, IssueStatus};

use crate::IssueStore;

pub struct PgIssueStore {
    pool: PgPool,
}

/// A row from the issues table. Jsonb columns stay untyped here and are
/// validated when converting to the domain type.
#[derive(Debug, sqlx::FromRow)]
struct IssueRow {
    id: Uuid,
    issue_type: String,
    severity: i16,
    confidence: f32,
    detections: serde_json::Value,
    latitude: f64,
    longitude: f64,
    votes: i32,
    voters: serde_json::Value,
    status: String,
    department: String,
    ai: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl IssueRow {
    /// Validate on read: corrupt jsonb is an error, never a silent default.
    fn into_issue(self) -> Result<Issue> {
        let detections: Vec<Detection> = serde_json::from_value(self.detections)
            .with_context(|| format!("corrupt detections jsonb for issue {}", self.id))?;
        let voters: Vec<Uuid> = serde_json::from_value(self.voters)
            .with_context(|| format!("corrupt voters jsonb for issue {}", self.id))?;
        let ai: InsightBundle = serde_json::from_value(self.ai)
            .with_context(|| format!("corrupt ai jsonb for issue {}", self.id))?;

        Ok(Issue {
            id: self.id,
            issue_type: self.issue_type,
            severity: self.severity as u8,
            confidence: self.confidence,
            detections,
            latitude: self.latitude,
            longitude: self.longitude,
            votes: self.votes as u32,
            voters,
            status: IssueStatus::from_str_loose(&self.status),
            department: self.department,
            ai,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PgIssueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("running issue store migrations")?;
        info!("Issue store migrations applied");
        Ok(())
    }
}

#[async_trait]
impl IssueStore for PgIssueStore {
    async fn issues_by_type(&self, issue_type: &str) -> Result<Vec<Issue>> {
        let rows = sqlx::query_as::<_, IssueRow>(
            r#"
            SELECT * FROM issues
            WHERE issue_type = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(issue_type)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(IssueRow::into_issue).collect()
    }

    async fn insert(&self, issue: &Issue) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO issues
                (id, issue_type, severity, confidence, detections,
                 latitude, longitude, votes, voters, status,
                 department, ai, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(issue.id)
        .bind(&issue.issue_type)
        .bind(issue.severity as i16)
        .bind(issue.confidence)
        .bind(serde_json::to_value(&issue.detections)?)
        .bind(issue.latitude)
        .bind(issue.longitude)
        .bind(issue.votes as i32)
        .bind(serde_json::to_value(&issue.voters)?)
        .bind(issue.status.to_string())
        .bind(&issue.department)
        .bind(serde_json::to_value(&issue.ai)?)
        .bind(issue.created_at)
        .bind(issue.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_vote(&self, id: Uuid, votes: u32, updated_at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE issues SET votes = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(votes as i32)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("no issue with id {id}");
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Issue>> {
        let row = sqlx::query_as::<_, IssueRow>("SELECT * FROM issues WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(IssueRow::into_issue).transpose()
    }

    async fn recent(&self, limit: u32) -> Result<Vec<Issue>> {
        let rows = sqlx::query_as::<_, IssueRow>(
            r#"
            SELECT * FROM issues
            ORDER BY updated_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(IssueRow::into_issue).collect()
    }
}
