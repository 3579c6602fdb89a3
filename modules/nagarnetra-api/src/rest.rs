use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use nagarnetra_common::NagarnetraError;
use nagarnetra_engine::{no_issue_bundle, SubmissionOutcome};

use crate::AppState;

// --- POST /detect ---

struct DetectForm {
    image: Vec<u8>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

fn bad_request(message: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": message})),
    )
        .into_response()
}

async fn read_detect_form(multipart: &mut Multipart) -> Result<DetectForm, NagarnetraError> {
    let invalid = |message: String| NagarnetraError::Validation(message);

    let mut image: Option<Vec<u8>> = None;
    let mut latitude: Option<f64> = None;
    let mut longitude: Option<f64> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| invalid(format!("malformed multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "image" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| invalid(format!("failed to read image part: {e}")))?;
                image = Some(bytes.to_vec());
            }
            "latitude" => {
                let text = field.text().await.map_err(|e| invalid(e.to_string()))?;
                latitude = Some(text.trim().parse().map_err(|_| {
                    invalid(format!("latitude must be a number, got {text:?}"))
                })?);
            }
            "longitude" => {
                let text = field.text().await.map_err(|e| invalid(e.to_string()))?;
                longitude = Some(text.trim().parse().map_err(|_| {
                    invalid(format!("longitude must be a number, got {text:?}"))
                })?);
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| invalid("image part is required".to_string()))?;
    if image.is_empty() {
        return Err(invalid("image part is empty".to_string()));
    }
    Ok(DetectForm {
        image,
        latitude,
        longitude,
    })
}

/// Response JSON for each submission outcome. The duplicate distance is
/// reported in whole meters.
fn outcome_json(outcome: &SubmissionOutcome) -> serde_json::Value {
    match outcome {
        SubmissionOutcome::NoDetection => serde_json::json!({
            "detections": [],
            "primary_issue": "Unknown",
            "ai": no_issue_bundle(),
            "duplicate": null,
        }),
        SubmissionOutcome::Analyzed { report } => serde_json::json!({
            "detections": report.detections,
            "primary_issue": report.primary.label,
            "ai": report.ai,
            "duplicate": null,
        }),
        SubmissionOutcome::Merged {
            report,
            issue_id,
            distance_meters,
            votes,
        } => serde_json::json!({
            "detections": report.detections,
            "primary_issue": report.primary.label,
            "ai": report.ai,
            "duplicate": {
                "issueId": issue_id.to_string(),
                "distanceMeters": distance_meters.round() as i64,
                "reportCount": votes,
            },
        }),
        SubmissionOutcome::Created {
            report,
            issue_id,
            votes,
        } => serde_json::json!({
            "detections": report.detections,
            "primary_issue": report.primary.label,
            "ai": report.ai,
            "issueId": issue_id.to_string(),
            "votes": votes,
        }),
    }
}

pub async fn detect(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let form = match read_detect_form(&mut multipart).await {
        Ok(form) => form,
        Err(e) => return bad_request(&e.to_string()),
    };

    // Fail fast on unreadable uploads, before the detector is invoked.
    if image::io::Reader::new(Cursor::new(&form.image))
        .with_guessed_format()
        .ok()
        .and_then(|r| r.into_dimensions().ok())
        .is_none()
    {
        return bad_request("Unreadable image");
    }

    match state
        .reconciler
        .submit(&form.image, form.latitude, form.longitude)
        .await
    {
        Ok(outcome) => Json(outcome_json(&outcome)).into_response(),
        // Detector and insight failures are absorbed inside the pipeline;
        // only persistence errors surface here.
        Err(e) => {
            warn!(error = %e, "Submission failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to process submission"})),
            )
                .into_response()
        }
    }
}

// --- GET /api/issues ---

#[derive(Deserialize)]
pub struct IssuesQuery {
    limit: Option<u32>,
}

pub async fn api_issues(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IssuesQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(50).min(200);
    match state.store.recent(limit).await {
        Ok(issues) => Json(serde_json::json!({ "issues": issues })).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to list issues");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn api_issue_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.store.get(id).await {
        Ok(Some(issue)) => Json(issue).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!(error = %e, issue_id = %id, "Failed to load issue");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// --- POST /api/analyze ---

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    description: String,
}

/// Keyword triage for text-only reports. No collaborators, no persistence.
fn triage(description: &str) -> (&'static str, &'static str, u32) {
    let lower = description.to_lowercase();
    if lower.contains("garbage") || lower.contains("waste") {
        ("Garbage Overflow", "Important", 85)
    } else {
        ("Unknown Issue", "Normal", 40)
    }
}

pub async fn api_analyze(Json(body): Json<AnalyzeRequest>) -> impl IntoResponse {
    let (issue_type, priority, urgency_score) = triage(&body.description);
    Json(serde_json::json!({
        "detected_issue": issue_type,
        "priority": priority,
        "urgency_score": urgency_score,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nagarnetra_common::{BoundingBox, Detection};
    use nagarnetra_engine::{fallback_bundle, IssueReport};

    fn report(label: &str) -> IssueReport {
        IssueReport {
            detections: vec![Detection {
                label: label.to_string(),
                confidence: 0.8,
                severity: 7,
                bbox: BoundingBox { x1: 1, y1: 2, x2: 3, y2: 4 },
            }],
            primary: Detection {
                label: label.to_string(),
                confidence: 0.8,
                severity: 7,
                bbox: BoundingBox { x1: 1, y1: 2, x2: 3, y2: 4 },
            },
            ai: fallback_bundle(label, 7),
        }
    }

    #[test]
    fn no_detection_response_shape() {
        let v = outcome_json(&SubmissionOutcome::NoDetection);
        assert_eq!(v["primary_issue"], "Unknown");
        assert_eq!(v["detections"].as_array().unwrap().len(), 0);
        assert!(v["duplicate"].is_null());
        assert_eq!(v["ai"]["severity_level"], "Low");
    }

    #[test]
    fn analyzed_response_has_no_persistence_fields() {
        let v = outcome_json(&SubmissionOutcome::Analyzed { report: report("pothole") });
        assert_eq!(v["primary_issue"], "pothole");
        assert!(v["duplicate"].is_null());
        assert!(v.get("issueId").is_none());
        assert!(v.get("votes").is_none());
    }

    #[test]
    fn merged_response_rounds_distance_to_whole_meters() {
        let id = Uuid::new_v4();
        let v = outcome_json(&SubmissionOutcome::Merged {
            report: report("pothole"),
            issue_id: id,
            distance_meters: 41.7,
            votes: 3,
        });
        assert_eq!(v["duplicate"]["issueId"], id.to_string());
        assert_eq!(v["duplicate"]["distanceMeters"], 42);
        assert_eq!(v["duplicate"]["reportCount"], 3);
    }

    #[test]
    fn created_response_carries_id_and_votes() {
        let id = Uuid::new_v4();
        let v = outcome_json(&SubmissionOutcome::Created {
            report: report("open drain"),
            issue_id: id,
            votes: 1,
        });
        assert_eq!(v["issueId"], id.to_string());
        assert_eq!(v["votes"], 1);
        assert!(v.get("duplicate").is_none());
    }

    #[test]
    fn triage_matches_garbage_keywords() {
        assert_eq!(triage("Garbage overflowing near market").0, "Garbage Overflow");
        assert_eq!(triage("waste dumped on the street").0, "Garbage Overflow");
        let (issue, priority, score) = triage("strange smell");
        assert_eq!(issue, "Unknown Issue");
        assert_eq!(priority, "Normal");
        assert_eq!(score, 40);
    }
}
