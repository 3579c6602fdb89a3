//! Insight generation: a structured bilingual summary for a detected issue.
//!
//! `generate_insights` is total. The model call is a fallible internal
//! step; any failure — network, timeout, non-JSON output — is logged and
//! replaced by the deterministic fallback, and a merely partial JSON
//! object falls back key by key. Callers always receive a complete bundle.

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use gemini_client::GeminiClient;
use nagarnetra_common::{InsightBundle, SeverityLevel};

/// Boundary trait for the text-insight service.
#[async_trait]
pub trait InsightModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl InsightModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(GeminiClient::generate(self, prompt).await?)
    }
}

fn build_prompt(label: &str, severity: u8) -> String {
    format!(
        r#"You are an AI assistant for an Indian civic issue reporting platform.

Issue detected: "{label}"
Severity score (1-10): {severity}

Generate a JSON object with EXACTLY these keys:

description_en:
- Short English description (1-2 lines)
- Simple, citizen-friendly

description_hi:
- Hinglish (Hindi in English letters)
- Simple language

why_it_matters:
- Why this issue matters for safety, health, or daily life
- 1-2 lines

severity_level:
- One of: Low, Medium, High, Critical

RULES:
- Output ONLY valid JSON
- No markdown
- No emojis
- No explanations outside JSON"#
    )
}

/// Deterministic bundle built purely from the label and severity score.
pub fn fallback_bundle(label: &str, severity: u8) -> InsightBundle {
    InsightBundle {
        description_en: format!("{label} detected in the area."),
        description_hi: format!("{label} yahan dekha gaya hai."),
        why_it_matters: "This issue may cause inconvenience or safety risks.".to_string(),
        severity_level: SeverityLevel::from_score(severity),
    }
}

/// Fixed bundle for submissions where nothing was detected.
pub fn no_issue_bundle() -> InsightBundle {
    InsightBundle {
        description_en: "No clear civic issue detected.".to_string(),
        description_hi: "Koi spasht civic issue nahi mila.".to_string(),
        why_it_matters: "Issue unclear.".to_string(),
        severity_level: SeverityLevel::Low,
    }
}

/// Models wrap JSON in code fences despite instructions; tolerate that.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Generate an insight bundle for a detected issue. Never fails.
pub async fn generate_insights(model: &dyn InsightModel, label: &str, severity: u8) -> InsightBundle {
    let prompt = build_prompt(label, severity);

    let text = match model.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!(label, error = %e, "Insight model call failed, using fallback");
            return fallback_bundle(label, severity);
        }
    };

    let parsed: serde_json::Value = match serde_json::from_str(strip_code_fences(&text)) {
        Ok(v) => v,
        Err(e) => {
            warn!(label, error = %e, "Insight model returned non-JSON, using fallback");
            return fallback_bundle(label, severity);
        }
    };

    let defaults = fallback_bundle(label, severity);
    let field = |key: &str, default: &str| {
        parsed
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| default.to_string())
    };

    InsightBundle {
        description_en: field("description_en", &defaults.description_en),
        description_hi: field("description_hi", &defaults.description_hi),
        why_it_matters: field("why_it_matters", &defaults.why_it_matters),
        severity_level: parsed
            .get("severity_level")
            .and_then(|v| v.as_str())
            .and_then(SeverityLevel::from_str_loose)
            .unwrap_or(defaults.severity_level),
    }
}
