//! Gemini client for fake-news and clickbait verdicts.
//!
//! Both classifiers share one transport (`generate`) that returns a
//! `ClassifyError` on anything but a usable reply. The public `classify_*`
//! methods never fail: every error is folded into an Error- or Unknown-shaped
//! result so the HTTP layer can always answer with a full body.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::http::{build_client, describe};
use crate::json_extract::parse_json_object;
use crate::models::{
    ClassificationResult, ClickbaitPrediction, ClickbaitResult, FakeNewsPrediction, ModelInfo,
};
use crate::text::truncate_chars;

/// Longest raw model reply echoed back when it holds no parseable JSON.
pub const EXPLANATION_FALLBACK_CHARS: usize = 500;

pub const QUOTA_EXCEEDED: &str = "API quota exceeded, please try again later";
pub const QUOTA_HINT: &str = "Service temporarily unavailable, please wait a few minutes";
const DEFAULT_EXPLANATION: &str = "Unable to analyze";

pub const FAKE_NEWS_PROMPT: &str = r#"You are a professional fake news detection expert. Analyze the following news text and decide whether it is fake news.

News text:
{text}

Return the result as a JSON object with exactly these fields:
1. prediction: either "Fake" or "Not Fake"
2. explanation: a detailed explanation of the judgement, written in the same language as the news text
3. confidence: an integer from 0 to 100
4. key_points: an array of the key points behind the judgement

Return ONLY the JSON object, no other text."#;

pub const CLICKBAIT_PROMPT: &str = r#"You are an expert in identifying clickbait. Analyze the following headline or text and decide whether it is clickbait, i.e. written to attract clicks through sensationalism, exaggeration or withheld information rather than to inform.

Text:
{text}

Return the result as a JSON object with exactly these fields:
1. score: an integer from 0 to 100 where 100 is the most clickbait-like
2. prediction: either "Clickbait" or "Not Clickbait"
3. confidence: an integer from 0 to 100
4. explanation: a short explanation, written in the same language as the text
5. clickbait_elements: an array of the clickbait techniques found (empty if none)

Return ONLY the JSON object, no other text."#;

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("Gemini API key is not configured")]
    NotConfigured,
    #[error("API quota exceeded, please try again later")]
    RateLimited,
    #[error("API call failed: {0}")]
    Status(u16),
    #[error("AI analysis failed: {0}")]
    Request(String),
    #[error("No response from model")]
    EmptyResponse,
    #[error("AI analysis failed: malformed response: {0}")]
    Decode(String),
}

// ── Gemini wire format ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<RemoteModel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteModel {
    name: String,
    display_name: Option<String>,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

// ── Client ───────────────────────────────────────────────────────────────────

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(config.request_timeout)?,
            base_url: config.gemini_base_url.clone(),
            model: config.gemini_model.clone(),
            api_key: config.gemini_api_key.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn classify_fake_news(&self, text: &str) -> ClassificationResult {
        let prompt = FAKE_NEWS_PROMPT.replace("{text}", text);
        debug!(chars = text.chars().count(), "classifying fake news");
        match self.generate(&prompt).await {
            Ok(reply) => parse_classification(&reply),
            Err(ClassifyError::RateLimited) => {
                ClassificationResult::unknown(QUOTA_EXCEEDED, vec![QUOTA_HINT.to_string()])
            }
            Err(e) => ClassificationResult::error(e.to_string()),
        }
    }

    pub async fn classify_clickbait(&self, text: &str) -> ClickbaitResult {
        let prompt = CLICKBAIT_PROMPT.replace("{text}", text);
        debug!(chars = text.chars().count(), "classifying clickbait");
        match self.generate(&prompt).await {
            Ok(reply) => parse_clickbait(&reply),
            Err(ClassifyError::RateLimited) => {
                ClickbaitResult::unknown(QUOTA_EXCEEDED, vec![QUOTA_HINT.to_string()])
            }
            Err(e) => ClickbaitResult::error(e.to_string()),
        }
    }

    /// Models visible to the configured key, for `/diagnose/gemini`.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ClassifyError> {
        let api_key = self.api_key.as_deref().ok_or(ClassifyError::NotConfigured)?;
        let url = format!("{}/v1beta/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("key", api_key), ("pageSize", "1000")])
            .send()
            .await
            .map_err(|e| ClassifyError::Request(describe(&e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "Gemini model listing failed");
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => ClassifyError::RateLimited,
                other => ClassifyError::Status(other.as_u16()),
            });
        }

        let listing: ListModelsResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::Decode(e.to_string()))?;

        Ok(listing
            .models
            .into_iter()
            .map(|m| ModelInfo {
                supports_generate_content: m
                    .supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent"),
                name: m.name,
                display_name: m.display_name,
            })
            .collect())
    }

    /// Sends one prompt and returns the concatenated text of the first candidate.
    async fn generate(&self, prompt: &str) -> Result<String, ClassifyError> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("classification requested but GEMINI_API_KEY is not set");
            return Err(ClassifyError::NotConfigured);
        };

        let url = format!("{}/v1beta/{}:generateContent", self.base_url, self.model);
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        info!(model = %self.model, "calling Gemini");
        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Gemini request failed");
                ClassifyError::Request(describe(&e))
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Gemini quota exceeded");
            return Err(ClassifyError::RateLimited);
        }
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %truncate_chars(&body, 300), "Gemini API error");
            return Err(ClassifyError::Status(status.as_u16()));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::Decode(e.to_string()))?;

        let reply: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if reply.trim().is_empty() {
            return Err(ClassifyError::EmptyResponse);
        }
        Ok(reply)
    }
}

// ── Reply parsing ────────────────────────────────────────────────────────────

pub fn parse_classification(reply: &str) -> ClassificationResult {
    let Some(object) = parse_json_object(reply) else {
        debug!("no JSON object in fake-news reply");
        return ClassificationResult::unknown(
            truncate_chars(reply, EXPLANATION_FALLBACK_CHARS),
            Vec::new(),
        );
    };

    ClassificationResult {
        prediction: object
            .get("prediction")
            .and_then(Value::as_str)
            .map(FakeNewsPrediction::from_label)
            .unwrap_or(FakeNewsPrediction::Unknown),
        confidence: percentage(object.get("confidence")),
        explanation: explanation(object.get("explanation")),
        key_points: string_list(object.get("key_points")),
    }
}

pub fn parse_clickbait(reply: &str) -> ClickbaitResult {
    let Some(object) = parse_json_object(reply) else {
        debug!("no JSON object in clickbait reply");
        return ClickbaitResult::unknown(
            truncate_chars(reply, EXPLANATION_FALLBACK_CHARS),
            Vec::new(),
        );
    };

    ClickbaitResult {
        score: percentage(object.get("score")),
        prediction: object
            .get("prediction")
            .and_then(Value::as_str)
            .map(ClickbaitPrediction::from_label)
            .unwrap_or(ClickbaitPrediction::Unknown),
        confidence: percentage(object.get("confidence")),
        explanation: explanation(object.get("explanation")),
        clickbait_elements: string_list(object.get("clickbait_elements")),
    }
}

/// 0–100 from an integer, float or numeric string; anything else is 0.
fn percentage(value: Option<&Value>) -> u8 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => n.round().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

fn explanation(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Null) | None => DEFAULT_EXPLANATION.to_string(),
        Some(Value::String(_)) => DEFAULT_EXPLANATION.to_string(),
        Some(other) => other.to_string(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}
