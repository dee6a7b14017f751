use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::http::{build_client, describe};
use crate::models::OcrResult;

pub const NO_TEXT_DETECTED: &str = "No text detected in image";

// ── Vision wire format ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    requests: [AnnotateImageRequest<'a>; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageRequest<'a> {
    image: ImageContent<'a>,
    features: [Feature; 1],
    image_context: ImageContext<'a>,
}

#[derive(Debug, Serialize)]
struct ImageContent<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext<'a> {
    language_hints: &'a [String],
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    text_annotations: Vec<EntityAnnotation>,
    error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    message: String,
}

// ── Client ───────────────────────────────────────────────────────────────────

pub struct OcrClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    referer: Option<String>,
    language_hints: Vec<String>,
}

impl OcrClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(config.request_timeout)?,
            endpoint: format!("{}/v1/images:annotate", config.vision_base_url),
            api_key: config.vision_api_key.clone(),
            referer: config.vision_referer.clone(),
            language_hints: config.language_hints.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Runs text detection on a base64 image. Every failure is folded into
    /// the returned `OcrResult`.
    pub async fn ocr(&self, image_base64: &str) -> OcrResult {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("OCR requested but GOOGLE_VISION_API_KEY is not set");
            return OcrResult::failed("OCR failed: Google Vision API key is not configured");
        };

        let body = AnnotateRequest {
            requests: [AnnotateImageRequest {
                image: ImageContent {
                    content: image_base64,
                },
                features: [Feature {
                    kind: "TEXT_DETECTION",
                }],
                image_context: ImageContext {
                    language_hints: &self.language_hints,
                },
            }],
        };

        info!(image_len = image_base64.len(), "calling Vision OCR");
        let mut response = match self.send(&body, api_key, self.referer.as_deref()).await {
            Ok(r) => r,
            Err(e) => return OcrResult::failed(format!("OCR request failed: {}", describe(&e))),
        };

        if response.status() == StatusCode::FORBIDDEN && self.referer.is_some() {
            warn!("Vision returned 403 with Referer set, retrying without it");
            response = match self.send(&body, api_key, None).await {
                Ok(r) => r,
                Err(e) => {
                    return OcrResult::failed(format!("OCR request failed: {}", describe(&e)))
                }
            };
        }

        let status = response.status();
        let payload = match response.text().await {
            Ok(p) => p,
            Err(e) => return OcrResult::failed(format!("OCR request failed: {}", describe(&e))),
        };

        if status != StatusCode::OK {
            let message = upstream_error_message(&payload)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            error!(status = status.as_u16(), %message, "Vision API error");
            if message.to_lowercase().contains("referer") {
                return OcrResult::failed(
                    "OCR failed: the Vision API key rejects this Referer; \
                     adjust the key's website restrictions in Google Cloud Console",
                );
            }
            return OcrResult::failed(format!("OCR failed: {message}"));
        }

        parse_annotation(&payload)
    }

    async fn send(
        &self,
        body: &AnnotateRequest<'_>,
        api_key: &str,
        referer: Option<&str>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(body);
        if let Some(referer) = referer {
            request = request.header(reqwest::header::REFERER, referer);
        }
        request.send().await
    }
}

fn parse_annotation(payload: &str) -> OcrResult {
    let parsed: AnnotateResponse = match serde_json::from_str(payload) {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "malformed Vision response");
            return OcrResult::failed(format!("OCR failed: malformed response: {e}"));
        }
    };

    let first = parsed.responses.into_iter().next().unwrap_or_default();
    if let Some(status) = first.error.filter(|s| !s.message.is_empty()) {
        return OcrResult::failed(format!("OCR failed: {}", status.message));
    }

    match first.text_annotations.into_iter().next() {
        Some(annotation) if !annotation.description.trim().is_empty() => {
            info!(chars = annotation.description.chars().count(), "OCR succeeded");
            OcrResult::recognized(annotation.description)
        }
        _ => {
            debug!("Vision returned no text annotations");
            OcrResult::no_text(NO_TEXT_DETECTED)
        }
    }
}

fn upstream_error_message(payload: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(payload)
        .ok()
        .and_then(|e| e.error)
        .map(|s| s.message)
        .filter(|m| !m.is_empty())
}
