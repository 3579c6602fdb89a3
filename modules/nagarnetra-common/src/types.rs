use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Detection Types ---

/// Absolute pixel coordinates of a detected region (top-left, bottom-right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

/// One labeled bounding box that survived confidence filtering, with its
/// derived 0-10 severity score. At most one per distinct label per image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub severity: u8,
    pub bbox: BoundingBox,
}

// --- Severity ---

/// Citizen-facing severity tier. Serialized capitalized ("Low", "Critical")
/// because that is the wire contract with both the mobile client and the
/// insight model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum SeverityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityLevel {
    /// Rule-based mapping from a 0-10 severity score.
    pub fn from_score(score: u8) -> Self {
        match score {
            8.. => SeverityLevel::Critical,
            6..=7 => SeverityLevel::High,
            4..=5 => SeverityLevel::Medium,
            _ => SeverityLevel::Low,
        }
    }

    /// Parse model output leniently. Unknown strings are `None` so the
    /// caller can apply its deterministic fallback.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(SeverityLevel::Low),
            "medium" => Some(SeverityLevel::Medium),
            "high" => Some(SeverityLevel::High),
            "critical" => Some(SeverityLevel::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeverityLevel::Low => write!(f, "Low"),
            SeverityLevel::Medium => write!(f, "Medium"),
            SeverityLevel::High => write!(f, "High"),
            SeverityLevel::Critical => write!(f, "Critical"),
        }
    }
}

// --- Insight Bundle ---

/// Bilingual summary attached to an issue. Always fully populated: every
/// field either comes from the insight model or from the deterministic
/// fallback. Partial bundles are never surfaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InsightBundle {
    pub description_en: String,
    pub description_hi: String,
    pub why_it_matters: String,
    pub severity_level: SeverityLevel,
}

// --- Issue Record ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    InProgress,
    Resolved,
}

impl IssueStatus {
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "in_progress" | "in progress" => IssueStatus::InProgress,
            "resolved" | "closed" => IssueStatus::Resolved,
            _ => IssueStatus::Open,
        }
    }
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueStatus::Open => write!(f, "open"),
            IssueStatus::InProgress => write!(f, "in_progress"),
            IssueStatus::Resolved => write!(f, "resolved"),
        }
    }
}

/// A persisted civic issue. Created exactly once per (type, ~location)
/// cluster; subsequent same-type reports within the duplicate radius
/// increment `votes` on this record instead of creating a new one.
///
/// After creation only `votes` and `updated_at` mutate. `issue_type`,
/// `latitude` and `longitude` are immutable, and `votes` only increases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: Uuid,
    pub issue_type: String,
    pub severity: u8,
    pub confidence: f32,
    pub detections: Vec<Detection>,
    pub latitude: f64,
    pub longitude: f64,
    pub votes: u32,
    /// Reporter identities. No identity system exists yet, so this stays
    /// empty, but the stored schema carries it.
    pub voters: Vec<Uuid>,
    pub status: IssueStatus,
    pub department: String,
    pub ai: InsightBundle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_level_boundaries() {
        assert_eq!(SeverityLevel::from_score(0), SeverityLevel::Low);
        assert_eq!(SeverityLevel::from_score(3), SeverityLevel::Low);
        assert_eq!(SeverityLevel::from_score(4), SeverityLevel::Medium);
        assert_eq!(SeverityLevel::from_score(5), SeverityLevel::Medium);
        assert_eq!(SeverityLevel::from_score(6), SeverityLevel::High);
        assert_eq!(SeverityLevel::from_score(7), SeverityLevel::High);
        assert_eq!(SeverityLevel::from_score(8), SeverityLevel::Critical);
        assert_eq!(SeverityLevel::from_score(10), SeverityLevel::Critical);
    }

    #[test]
    fn severity_level_serializes_capitalized() {
        let json = serde_json::to_string(&SeverityLevel::Critical).unwrap();
        assert_eq!(json, "\"Critical\"");
    }

    #[test]
    fn severity_level_parses_loosely() {
        assert_eq!(
            SeverityLevel::from_str_loose(" HIGH "),
            Some(SeverityLevel::High)
        );
        assert_eq!(SeverityLevel::from_str_loose("urgent"), None);
    }

    #[test]
    fn issue_status_round_trips_snake_case() {
        let json = serde_json::to_string(&IssueStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert_eq!(IssueStatus::from_str_loose("in progress"), IssueStatus::InProgress);
        assert_eq!(IssueStatus::from_str_loose("weird"), IssueStatus::Open);
    }

    #[test]
    fn detection_json_shape() {
        let d = Detection {
            label: "pothole".to_string(),
            confidence: 0.82,
            severity: 7,
            bbox: BoundingBox { x1: 10, y1: 20, x2: 110, y2: 220 },
        };
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["label"], "pothole");
        assert_eq!(v["bbox"]["x2"], 110);
    }
}
