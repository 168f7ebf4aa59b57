use crate::utils::error::AppError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GEMINI_API_BASE: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

// The external call is bounded; the upstream API occasionally hangs
const GEMINI_TIMEOUT_SECS: u64 = 60;

const NO_INSIGHT_SENTINEL: &str = "No insight returned.";

const DEFAULT_DETAIL_LEVEL: u8 = 3;

// ---------- Gemini wire format ----------

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiApiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

// ---------- Request DTO ----------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct FollowUpRequest {
    pub insight: Option<String>,
    pub mode: Option<String>,
    pub message: Option<String>,
    pub detail_level: Option<u8>,
}

/// Follow-up conversation modes. Anything unrecognized falls back to Generic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUpMode {
    Diet,
    Exercise,
    Preset,
    Chat,
    Generic,
}

impl FollowUpMode {
    pub fn parse(mode: Option<&str>) -> Self {
        match mode {
            Some("diet") => FollowUpMode::Diet,
            Some("exercise") => FollowUpMode::Exercise,
            Some("preset") => FollowUpMode::Preset,
            Some("chat") => FollowUpMode::Chat,
            _ => FollowUpMode::Generic,
        }
    }
}

// ---------- Prompt construction ----------

fn build_analysis_prompt(raw_text: &str) -> String {
    format!(
        "You are a medical report analysis assistant.\n\
         Analyze the following medical report and reply with exactly six numbered sections:\n\
         1. Key Findings - the values and observations actually present in the report.\n\
         2. Possible Conditions - conditions suggested by the findings, each tagged with a likelihood of high, moderate or low.\n\
         3. Doctor Visit Recommendation - whether a visit is advised and how urgent it is.\n\
         4. Diet Suggestions.\n\
         5. Exercise Suggestions.\n\
         6. Additional Insights.\n\
         Never invent values that are not present in the report.\n\n\
         Medical report:\n{}",
        raw_text
    )
}

fn build_followup_prompt(
    mode: FollowUpMode,
    prior_insight: &str,
    user_message: &str,
    detail_level: u8,
) -> String {
    let detail_level = detail_level.clamp(1, 5);

    match mode {
        FollowUpMode::Diet => format!(
            "Based on the medical analysis below, write a practical diet plan for the patient.\n\
             Detail level: {} of 5 (1 = short overview, 5 = meal-by-meal).\n\
             Only build on what the analysis states; never invent lab values.\n\n\
             Medical analysis:\n{}",
            detail_level, prior_insight
        ),
        FollowUpMode::Exercise => format!(
            "Based on the medical analysis below, write an exercise routine suited to the patient's condition.\n\
             Detail level: {} of 5 (1 = short overview, 5 = day-by-day schedule).\n\
             Only build on what the analysis states; never invent lab values.\n\n\
             Medical analysis:\n{}",
            detail_level, prior_insight
        ),
        FollowUpMode::Preset => format!(
            "Answer the selected question about the medical analysis below.\n\
             Question: {}\n\
             Detail level: {} of 5.\n\
             Only use information present in the analysis.\n\n\
             Medical analysis:\n{}",
            user_message, detail_level, prior_insight
        ),
        FollowUpMode::Chat => format!(
            "The patient has a question about their medical analysis.\n\
             Question: {}\n\
             Detail level: {} of 5.\n\
             Answer in plain language, grounded only in the analysis below.\n\n\
             Medical analysis:\n{}",
            user_message, detail_level, prior_insight
        ),
        FollowUpMode::Generic => format!(
            "Expand on the medical analysis below with any additional guidance that may help the patient.\n\
             Detail level: {} of 5.\n\n\
             Medical analysis:\n{}",
            detail_level, prior_insight
        ),
    }
}

// ---------- Generation ----------

fn gemini_url() -> String {
    std::env::var("GEMINI_API_URL").unwrap_or_else(|_| GEMINI_API_BASE.to_string())
}

// First candidate's first text part, or the sentinel when the response shape
// is not what we expect. The sentinel is the only "fallback content" ever
// produced; real failures surface as GenerationFailed.
fn reply_text(response: GeminiApiResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .map(|p| p.text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_INSIGHT_SENTINEL.to_string())
}

async fn generate(prompt: String) -> Result<String, AppError> {
    let api_key = std::env::var("GEMINI_API_KEY")
        .map_err(|_| AppError::GenerationFailed("GEMINI_API_KEY is not configured".to_string()))?;

    let body = GeminiRequest {
        contents: vec![GeminiContent {
            parts: vec![GeminiPart { text: prompt }],
        }],
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(GEMINI_TIMEOUT_SECS))
        .build()
        .map_err(|e| AppError::GenerationFailed(format!("HTTP client error: {}", e)))?;

    let response = client
        .post(format!("{}?key={}", gemini_url(), api_key))
        .json(&body)
        .send()
        .await
        .map_err(|e| AppError::GenerationFailed(format!("Gemini request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::GenerationFailed(format!(
            "Gemini API error: {}",
            response.status()
        )));
    }

    let api_response: GeminiApiResponse = response
        .json()
        .await
        .map_err(|e| AppError::GenerationFailed(format!("Malformed Gemini response: {}", e)))?;

    Ok(reply_text(api_response))
}

/// Initial analysis of extracted report text.
pub async fn analyze(raw_text: &str) -> Result<String, AppError> {
    generate(build_analysis_prompt(raw_text)).await
}

/// Follow-up reply over a previously generated insight. The prior insight is
/// a hard precondition; nothing is sent upstream without it.
pub async fn follow_up(request: &FollowUpRequest) -> Result<String, AppError> {
    let prior_insight = request
        .insight
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("No insight provided for follow-up".to_string()))?;

    let mode = FollowUpMode::parse(request.mode.as_deref());
    let user_message = request.message.as_deref().unwrap_or("");
    let detail_level = request.detail_level.unwrap_or(DEFAULT_DETAIL_LEVEL);

    let prompt = build_followup_prompt(mode, prior_insight, user_message, detail_level);
    generate(prompt).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!(FollowUpMode::parse(Some("diet")), FollowUpMode::Diet);
        assert_eq!(FollowUpMode::parse(Some("exercise")), FollowUpMode::Exercise);
        assert_eq!(FollowUpMode::parse(Some("preset")), FollowUpMode::Preset);
        assert_eq!(FollowUpMode::parse(Some("chat")), FollowUpMode::Chat);
        assert_eq!(FollowUpMode::parse(Some("anything")), FollowUpMode::Generic);
        assert_eq!(FollowUpMode::parse(None), FollowUpMode::Generic);
    }

    #[test]
    fn test_analysis_prompt_structure() {
        let prompt = build_analysis_prompt("Hemoglobin: 13.5 g/dL");

        assert!(prompt.contains("Hemoglobin: 13.5 g/dL"));
        assert!(prompt.contains("six numbered sections"));
        for section in [
            "Key Findings",
            "Possible Conditions",
            "Doctor Visit Recommendation",
            "Diet Suggestions",
            "Exercise Suggestions",
            "Additional Insights",
        ] {
            assert!(prompt.contains(section), "missing section: {}", section);
        }
        assert!(prompt.contains("Never invent values"));
    }

    #[test]
    fn test_followup_prompt_carries_parameters() {
        let prompt = build_followup_prompt(
            FollowUpMode::Chat,
            "Low hemoglobin detected",
            "Should I take iron supplements?",
            4,
        );
        assert!(prompt.contains("Low hemoglobin detected"));
        assert!(prompt.contains("Should I take iron supplements?"));
        assert!(prompt.contains("4 of 5"));
    }

    #[test]
    fn test_followup_detail_level_clamped() {
        let prompt = build_followup_prompt(FollowUpMode::Diet, "insight", "", 9);
        assert!(prompt.contains("5 of 5"));

        let prompt = build_followup_prompt(FollowUpMode::Exercise, "insight", "", 0);
        assert!(prompt.contains("1 of 5"));
    }

    #[test]
    fn test_unrecognized_mode_uses_generic_template() {
        let prompt = build_followup_prompt(FollowUpMode::Generic, "prior insight text", "", 3);
        assert!(prompt.contains("prior insight text"));
        assert!(prompt.contains("Expand on the medical analysis"));
    }

    #[tokio::test]
    async fn test_followup_without_insight_rejected_before_api_call() {
        let request = FollowUpRequest {
            insight: None,
            mode: Some("diet".to_string()),
            message: None,
            detail_level: None,
        };
        let err = follow_up(&request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let request = FollowUpRequest {
            insight: Some("   ".to_string()),
            mode: None,
            message: None,
            detail_level: None,
        };
        let err = follow_up(&request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_reply_text_extracts_first_candidate() {
        let response: GeminiApiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                { "content": { "parts": [ { "text": "first reply" }, { "text": "second part" } ] } },
                { "content": { "parts": [ { "text": "second candidate" } ] } }
            ]
        }))
        .unwrap();

        assert_eq!(reply_text(response), "first reply");
    }

    #[test]
    fn test_reply_text_sentinel_on_unexpected_shape() {
        let empty: GeminiApiResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(reply_text(empty), NO_INSIGHT_SENTINEL);

        let no_content: GeminiApiResponse =
            serde_json::from_value(serde_json::json!({ "candidates": [ {} ] })).unwrap();
        assert_eq!(reply_text(no_content), NO_INSIGHT_SENTINEL);

        let empty_text: GeminiApiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [ { "content": { "parts": [ { "text": "" } ] } } ]
        }))
        .unwrap();
        assert_eq!(reply_text(empty_text), NO_INSIGHT_SENTINEL);
    }
}
