use serde::{Deserialize, Serialize};

// ── Inbound requests ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub image: String,
}

// ── Labels ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FakeNewsPrediction {
    Fake,
    #[serde(rename = "Not Fake")]
    NotFake,
    Unknown,
    Error,
}

impl FakeNewsPrediction {
    /// Lenient match of a model-supplied label.
    pub fn from_label(label: &str) -> Self {
        match squash_label(label).as_str() {
            "fake" => Self::Fake,
            "notfake" => Self::NotFake,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickbaitPrediction {
    Clickbait,
    #[serde(rename = "Not Clickbait")]
    NotClickbait,
    Unknown,
    Error,
}

impl ClickbaitPrediction {
    pub fn from_label(label: &str) -> Self {
        match squash_label(label).as_str() {
            "clickbait" => Self::Clickbait,
            "notclickbait" => Self::NotClickbait,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }
}

fn squash_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

// ── Analysis results ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub prediction: FakeNewsPrediction,
    pub confidence: u8,
    pub explanation: String,
    pub key_points: Vec<String>,
}

impl ClassificationResult {
    pub fn error(explanation: impl Into<String>) -> Self {
        Self {
            prediction: FakeNewsPrediction::Error,
            confidence: 0,
            explanation: explanation.into(),
            key_points: Vec::new(),
        }
    }

    pub fn unknown(explanation: impl Into<String>, key_points: Vec<String>) -> Self {
        Self {
            prediction: FakeNewsPrediction::Unknown,
            confidence: 0,
            explanation: explanation.into(),
            key_points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickbaitResult {
    pub score: u8,
    pub prediction: ClickbaitPrediction,
    pub confidence: u8,
    pub explanation: String,
    pub clickbait_elements: Vec<String>,
}

impl ClickbaitResult {
    pub fn error(explanation: impl Into<String>) -> Self {
        Self {
            score: 0,
            prediction: ClickbaitPrediction::Error,
            confidence: 0,
            explanation: explanation.into(),
            clickbait_elements: Vec::new(),
        }
    }

    pub fn unknown(explanation: impl Into<String>, clickbait_elements: Vec<String>) -> Self {
        Self {
            score: 0,
            prediction: ClickbaitPrediction::Unknown,
            confidence: 0,
            explanation: explanation.into(),
            clickbait_elements,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrResult {
    pub success: bool,
    pub text: String,
    pub error: String,
}

impl OcrResult {
    pub fn recognized(text: String) -> Self {
        Self {
            success: true,
            text,
            error: String::new(),
        }
    }

    pub fn no_text(note: impl Into<String>) -> Self {
        Self {
            success: true,
            text: String::new(),
            error: note.into(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            text: String::new(),
            error: error.into(),
        }
    }
}

// ── Outbound responses ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TextDetectionResponse {
    pub input_type: &'static str,
    pub original_text: String,
    pub fake_news: ClassificationResult,
    pub clickbait: ClickbaitResult,
    pub processing_time: f64,
}

#[derive(Debug, Serialize)]
pub struct ImageDetectionResponse {
    pub input_type: &'static str,
    pub fake_news: ClassificationResult,
    pub clickbait: ClickbaitResult,
    pub ocr_text: String,
    pub ocr_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_error: Option<String>,
    pub processing_time: f64,
}

/// 400 body for input that failed validation. Both results are Error-shaped so
/// clients that only read `fake_news`/`clickbait` still see the failure.
#[derive(Debug, Serialize)]
pub struct InvalidInputResponse {
    pub input_type: &'static str,
    pub detail: String,
    pub fake_news: ClassificationResult,
    pub clickbait: ClickbaitResult,
}

#[derive(Debug, Serialize)]
pub struct OcrTestResponse {
    pub success: bool,
    pub text: String,
    pub error: String,
    pub length: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub vision_api: &'static str,
    pub gemini_api: &'static str,
    pub gemini_model: String,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub display_name: Option<String>,
    pub supports_generate_content: bool,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub success: bool,
    pub count: usize,
    pub models: Vec<ModelInfo>,
}
