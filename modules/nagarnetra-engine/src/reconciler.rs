//! The submission orchestrator: detect, summarize, deduplicate, persist.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use nagarnetra_common::{
    geo, Detection, InsightBundle, Issue, IssueStatus,
};
use nagarnetra_store::IssueStore;

use crate::adapter::{analyze, primary_issue, ObjectDetector};
use crate::insight::{generate_insights, InsightModel};
use crate::routing::assign_department;

/// The analysis shared by every outcome that found something.
#[derive(Debug, Clone)]
pub struct IssueReport {
    pub detections: Vec<Detection>,
    pub primary: Detection,
    pub ai: InsightBundle,
}

/// Terminal state of one submission.
#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    /// Nothing survived confidence filtering. Not an error.
    NoDetection,
    /// No coordinates were given: analysis only, nothing persisted.
    Analyzed { report: IssueReport },
    /// An existing same-type issue within the duplicate radius absorbed
    /// this report as a vote.
    Merged {
        report: IssueReport,
        issue_id: Uuid,
        distance_meters: f64,
        votes: u32,
    },
    /// First report of this (type, ~location) cluster.
    Created {
        report: IssueReport,
        issue_id: Uuid,
        votes: u32,
    },
}

/// Orchestrates one submission end to end. Collaborators are injected and
/// owned by the process, not ambient globals.
pub struct IssueReconciler {
    detector: Arc<dyn ObjectDetector>,
    insights: Arc<dyn InsightModel>,
    store: Arc<dyn IssueStore>,
}

impl IssueReconciler {
    pub fn new(
        detector: Arc<dyn ObjectDetector>,
        insights: Arc<dyn InsightModel>,
        store: Arc<dyn IssueStore>,
    ) -> Self {
        Self {
            detector,
            insights,
            store,
        }
    }

    /// Process one submission: image bytes plus optional coordinates.
    ///
    /// The duplicate scan takes the *first* stored same-type issue within
    /// 100 m in creation order, not the globally nearest. The scan and the
    /// conditional write are not transactional: two near-simultaneous first
    /// reports of the same new issue can both miss each other and create
    /// two records.
    pub async fn submit(
        &self,
        image: &[u8],
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<SubmissionOutcome> {
        // A failed detector call reads the same as an empty one: "no issue
        // found". Citizens get a usable response either way.
        let detections = match analyze(self.detector.as_ref(), image).await {
            Ok(detections) => detections,
            Err(e) => {
                warn!(error = %e, "Detector call failed, treating as no detection");
                return Ok(SubmissionOutcome::NoDetection);
            }
        };

        let Some(primary) = primary_issue(&detections).cloned() else {
            info!("No civic issue detected in submission");
            return Ok(SubmissionOutcome::NoDetection);
        };

        let ai = generate_insights(self.insights.as_ref(), &primary.label, primary.severity).await;
        let report = IssueReport {
            detections,
            primary,
            ai,
        };

        let (Some(lat), Some(lng)) = (latitude, longitude) else {
            info!(label = %report.primary.label, "Submission without location, analysis only");
            return Ok(SubmissionOutcome::Analyzed { report });
        };

        // First-match-wins duplicate scan over same-type issues.
        for candidate in self.store.issues_by_type(&report.primary.label).await? {
            let distance = geo::distance_meters(
                Some(lat),
                Some(lng),
                Some(candidate.latitude),
                Some(candidate.longitude),
            );
            if geo::within_duplicate_radius(distance) {
                let votes = candidate.votes + 1;
                self.store
                    .record_vote(candidate.id, votes, Utc::now())
                    .await?;
                info!(
                    issue_id = %candidate.id,
                    label = %report.primary.label,
                    distance_meters = distance,
                    votes,
                    "Merged duplicate report"
                );
                return Ok(SubmissionOutcome::Merged {
                    report,
                    issue_id: candidate.id,
                    distance_meters: distance,
                    votes,
                });
            }
        }

        let now = Utc::now();
        let issue = Issue {
            id: Uuid::new_v4(),
            issue_type: report.primary.label.clone(),
            severity: report.primary.severity,
            confidence: report.primary.confidence,
            detections: report.detections.clone(),
            latitude: lat,
            longitude: lng,
            votes: 1,
            voters: vec![],
            status: IssueStatus::Open,
            department: assign_department(&report.primary.label).to_string(),
            ai: report.ai.clone(),
            created_at: now,
            updated_at: now,
        };
        self.store.insert(&issue).await?;
        info!(
            issue_id = %issue.id,
            label = %issue.issue_type,
            department = %issue.department,
            "Created new issue"
        );

        Ok(SubmissionOutcome::Created {
            report,
            issue_id: issue.id,
            votes: 1,
        })
    }
}
