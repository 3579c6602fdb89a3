pub mod adapter;
pub mod insight;
pub mod reconciler;
pub mod routing;
pub mod testing;

pub use adapter::{analyze, primary_issue, ObjectDetector, CIVIC_PROMPT, CONFIDENCE_FLOOR};
pub use insight::{fallback_bundle, generate_insights, no_issue_bundle, InsightModel};
pub use reconciler::{IssueReconciler, IssueReport, SubmissionOutcome};
pub use routing::assign_department;
