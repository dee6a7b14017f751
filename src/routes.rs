use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::classify::GeminiClient;
use crate::config::Config;
use crate::models::{
    ClassificationResult, ClickbaitResult, HealthResponse, ImageDetectionResponse, ImageRequest,
    InvalidInputResponse, ModelsResponse, OcrTestResponse, TextDetectionResponse, TextRequest,
};
use crate::ocr::OcrClient;
use crate::text::{char_len, preview};
use crate::validate::{validate_image, validate_text};

pub const ORIGINAL_TEXT_PREVIEW_CHARS: usize = 200;
pub const OCR_TEXT_PREVIEW_CHARS: usize = 500;
pub const NO_TEXT_EXPLANATION: &str = "No text detected in image, unable to analyze";

const ENDPOINTS: &[&str] = &[
    "GET /health",
    "POST /detect/text",
    "POST /detect/image",
    "POST /ocr/test",
    "GET /diagnose/gemini",
];

// ── Shared state ─────────────────────────────────────────────────────────────

/// Built once from `Config` at startup; read-only afterwards.
pub struct AppState {
    pub ocr: OcrClient,
    pub classifier: GeminiClient,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            ocr: OcrClient::new(config)?,
            classifier: GeminiClient::new(config)?,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

pub type SharedState = Arc<AppState>;

pub fn router(state: SharedState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/detect/text", post(detect_text))
        .route("/detect/image", post(detect_image))
        .route("/ocr/test", post(ocr_test))
        .route("/diagnose/gemini", get(diagnose_gemini))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn root() -> impl IntoResponse {
    Json(json!({
        "service": "news-verdict-api",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ENDPOINTS,
    }))
}

async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        vision_api: configured(state.ocr.is_configured()),
        gemini_api: configured(state.classifier.is_configured()),
        gemini_model: state.classifier.model().to_string(),
        message: "Server is running",
    })
}

async fn detect_text(
    State(state): State<SharedState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejected_body("text", rejection),
    };
    info!(chars = char_len(&req.text), "text detection request");

    let text = match validate_text(&req.text) {
        Ok(text) => text,
        Err(e) => return invalid_input("text", StatusCode::BAD_REQUEST, e.to_string()),
    };

    let fake_news = state.classifier.classify_fake_news(text).await;
    let clickbait = state.classifier.classify_clickbait(text).await;

    let response = TextDetectionResponse {
        input_type: "text",
        original_text: preview(text, ORIGINAL_TEXT_PREVIEW_CHARS),
        fake_news,
        clickbait,
        processing_time: elapsed_secs(started),
    };
    (StatusCode::OK, Json(response)).into_response()
}

async fn detect_image(
    State(state): State<SharedState>,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejected_body("image", rejection),
    };
    info!(image_len = req.image.len(), "image detection request");

    let image = match validate_image(&req.image) {
        Ok(image) => image,
        Err(e) => return invalid_input("image", StatusCode::BAD_REQUEST, e.to_string()),
    };

    let ocr = state.ocr.ocr(&image).await;

    if !ocr.success {
        warn!(error = %ocr.error, "OCR failed, skipping classification");
        let response = ImageDetectionResponse {
            input_type: "image",
            fake_news: ClassificationResult::error(ocr.error.clone()),
            clickbait: ClickbaitResult::error(ocr.error.clone()),
            ocr_text: String::new(),
            ocr_length: 0,
            ocr_error: Some(ocr.error),
            processing_time: elapsed_secs(started),
        };
        return (StatusCode::OK, Json(response)).into_response();
    }

    let text = ocr.text.trim();
    if text.is_empty() {
        info!("no text in image, skipping classification");
        let response = ImageDetectionResponse {
            input_type: "image",
            fake_news: ClassificationResult::unknown(NO_TEXT_EXPLANATION, Vec::new()),
            clickbait: ClickbaitResult::unknown(NO_TEXT_EXPLANATION, Vec::new()),
            ocr_text: String::new(),
            ocr_length: 0,
            ocr_error: Some(ocr.error).filter(|e| !e.is_empty()),
            processing_time: elapsed_secs(started),
        };
        return (StatusCode::OK, Json(response)).into_response();
    }

    let fake_news = state.classifier.classify_fake_news(text).await;
    let clickbait = state.classifier.classify_clickbait(text).await;

    let response = ImageDetectionResponse {
        input_type: "image",
        fake_news,
        clickbait,
        ocr_text: preview(&ocr.text, OCR_TEXT_PREVIEW_CHARS),
        ocr_length: char_len(&ocr.text),
        ocr_error: None,
        processing_time: elapsed_secs(started),
    };
    (StatusCode::OK, Json(response)).into_response()
}

async fn ocr_test(
    State(state): State<SharedState>,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> Response {
    let image = match payload {
        Ok(Json(req)) => {
            validate_image(&req.image).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(rejection) => Err((rejection.status(), rejection.body_text())),
    };
    let image = match image {
        Ok(image) => image,
        Err((status, detail)) => {
            let response = OcrTestResponse {
                success: false,
                text: String::new(),
                error: detail,
                length: 0,
            };
            return (status, Json(response)).into_response();
        }
    };

    let ocr = state.ocr.ocr(&image).await;
    let response = OcrTestResponse {
        success: ocr.success,
        length: char_len(&ocr.text),
        text: ocr.text,
        error: ocr.error,
    };
    (StatusCode::OK, Json(response)).into_response()
}

async fn diagnose_gemini(State(state): State<SharedState>) -> Response {
    match state.classifier.list_models().await {
        Ok(models) => {
            let response = ModelsResponse {
                success: true,
                count: models.len(),
                models,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({"success": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn configured(present: bool) -> &'static str {
    if present {
        "configured"
    } else {
        "missing"
    }
}

fn elapsed_secs(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 100.0).round() / 100.0
}

fn rejected_body(input_type: &'static str, rejection: JsonRejection) -> Response {
    invalid_input(input_type, rejection.status(), rejection.body_text())
}

fn invalid_input(input_type: &'static str, status: StatusCode, detail: String) -> Response {
    warn!(input_type, %detail, "rejected invalid input");
    let response = InvalidInputResponse {
        input_type,
        fake_news: ClassificationResult::error(detail.clone()),
        clickbait: ClickbaitResult::error(detail.clone()),
        detail,
    };
    (status, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;
    use wiremock::matchers::{any, body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ANNOTATE_PATH: &str = "/v1/images:annotate";
    const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";
    const IMAGE: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

    fn app_for(server: &MockServer) -> Router {
        app_with(server, &[])
    }

    fn app_with(server: &MockServer, extra: &[(&str, &str)]) -> Router {
        let uri = server.uri();
        let config = Config::from_lookup(|name| {
            if let Some((_, value)) = extra.iter().find(|(k, _)| *k == name) {
                return Some(value.to_string());
            }
            match name {
                "VISION_BASE_URL" | "GEMINI_BASE_URL" => Some(uri.clone()),
                "GOOGLE_VISION_API_KEY" => Some("vision-key".to_string()),
                "GEMINI_API_KEY" => Some("gemini-key".to_string()),
                _ => None,
            }
        })
        .unwrap();
        router(Arc::new(AppState::new(&config).unwrap()))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn gemini_reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": text}]}}]
        }))
    }

    fn vision_text(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{"textAnnotations": [{"description": text}]}]
        }))
    }

    async fn mount_classifiers(server: &MockServer, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(body_string_contains("fake news detection expert"))
            .respond_with(gemini_reply(
                "```json\n{\"prediction\":\"Fake\",\"confidence\":90,\"explanation\":\"x\",\"key_points\":[\"a\"]}\n```",
            ))
            .expect(expected_calls)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(body_string_contains("identifying clickbait"))
            .respond_with(gemini_reply(
                r#"{"score": 80, "prediction": "Clickbait", "confidence": 75, "explanation": "hype", "clickbait_elements": ["SHOCKING"]}"#,
            ))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    async fn forbid_classifier(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(gemini_reply("{}"))
            .expect(0)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn blank_text_is_400_without_upstream_calls() {
        let server = MockServer::start().await;
        Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;
        let app = app_for(&server);

        let (status, body) = call(&app, Method::POST, "/detect/text", Some(json!({"text": "  \n\t "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["input_type"], "text");
        assert_eq!(body["fake_news"]["prediction"], "Error");
        assert_eq!(body["clickbait"]["prediction"], "Error");
        assert!(body["detail"].as_str().unwrap().len() > 0);
    }

    #[tokio::test]
    async fn non_base64_image_is_400_without_upstream_calls() {
        let server = MockServer::start().await;
        Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;
        let app = app_for(&server);

        let (status, body) = call(&app, Method::POST, "/detect/image", Some(json!({"image": "%%% not base64 %%%"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["input_type"], "image");
        assert_eq!(body["fake_news"]["prediction"], "Error");

        let (status, body) = call(&app, Method::POST, "/ocr/test", Some(json!({"image": "@@@"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn malformed_json_body_gets_json_error() {
        let server = MockServer::start().await;
        let app = app_for(&server);

        let (status, body) = call(&app, Method::POST, "/detect/text", Some(json!({"wrong": 1}))).await;
        assert!(status.is_client_error());
        assert_eq!(body["fake_news"]["prediction"], "Error");
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn text_runs_both_classifiers() {
        let server = MockServer::start().await;
        mount_classifiers(&server, 1).await;
        let app = app_for(&server);

        let (status, body) = call(
            &app,
            Method::POST,
            "/detect/text",
            Some(json!({"text": "  SHOCKING: coffee adds 20 years to your life!  "})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["input_type"], "text");
        assert_eq!(body["original_text"], "SHOCKING: coffee adds 20 years to your life!");
        assert_eq!(
            body["fake_news"],
            json!({"prediction": "Fake", "confidence": 90, "explanation": "x", "key_points": ["a"]})
        );
        assert_eq!(body["clickbait"]["score"], 80);
        assert_eq!(body["clickbait"]["prediction"], "Clickbait");
        assert_eq!(body["clickbait"]["clickbait_elements"], json!(["SHOCKING"]));
        assert!(body["processing_time"].as_f64().unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn rate_limited_classifier_is_still_200() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(429))
            .expect(2)
            .mount(&server)
            .await;
        let app = app_for(&server);

        let (status, body) = call(&app, Method::POST, "/detect/text", Some(json!({"text": "hello"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fake_news"]["prediction"], "Unknown");
        assert_eq!(body["fake_news"]["confidence"], 0);
        assert!(!body["fake_news"]["key_points"].as_array().unwrap().is_empty());
        assert_eq!(body["clickbait"]["prediction"], "Unknown");
    }

    #[tokio::test]
    async fn ocr_failure_short_circuits_with_error_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANNOTATE_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"message": "Bad image data."}
            })))
            .expect(1)
            .mount(&server)
            .await;
        forbid_classifier(&server).await;
        let app = app_for(&server);

        let (status, body) = call(&app, Method::POST, "/detect/image", Some(json!({"image": IMAGE}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fake_news"]["prediction"], "Error");
        assert_eq!(body["clickbait"]["prediction"], "Error");
        assert_eq!(body["fake_news"]["explanation"], "OCR failed: Bad image data.");
        assert_eq!(body["ocr_error"], "OCR failed: Bad image data.");
        assert_eq!(body["ocr_length"], 0);
    }

    #[tokio::test]
    async fn ocr_without_text_short_circuits_with_unknown_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANNOTATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"responses": [{}]})))
            .expect(1)
            .mount(&server)
            .await;
        forbid_classifier(&server).await;
        let app = app_for(&server);

        let (status, body) = call(&app, Method::POST, "/detect/image", Some(json!({"image": IMAGE}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fake_news"]["prediction"], "Unknown");
        assert_eq!(body["fake_news"]["explanation"], NO_TEXT_EXPLANATION);
        assert_eq!(body["clickbait"]["prediction"], "Unknown");
        assert_eq!(body["ocr_text"], "");
        assert_eq!(body["ocr_length"], 0);
    }

    #[tokio::test]
    async fn long_ocr_text_is_previewed_but_counted_in_full() {
        let server = MockServer::start().await;
        let recognized = "假新闻".repeat(400);
        Mock::given(method("POST"))
            .and(path(ANNOTATE_PATH))
            .respond_with(vision_text(&recognized))
            .expect(1)
            .mount(&server)
            .await;
        mount_classifiers(&server, 1).await;
        let app = app_for(&server);

        let data_url = format!("data:image/png;base64,{IMAGE}");
        let (status, body) = call(&app, Method::POST, "/detect/image", Some(json!({"image": data_url}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["input_type"], "image");
        assert_eq!(body["ocr_length"], 1200);
        let echoed = body["ocr_text"].as_str().unwrap();
        assert_eq!(echoed.chars().count(), OCR_TEXT_PREVIEW_CHARS + 3);
        assert!(echoed.ends_with("..."));
        assert_eq!(body["fake_news"]["prediction"], "Fake");
        assert!(body.get("ocr_error").is_none());

        let requests = server.received_requests().await.unwrap();
        let ocr_body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(ocr_body["requests"][0]["image"]["content"], IMAGE);
    }

    #[tokio::test]
    async fn ocr_length_counts_text_as_recognized() {
        let server = MockServer::start().await;
        let recognized = "BREAKING: moon made of cheese\n";
        Mock::given(method("POST"))
            .and(path(ANNOTATE_PATH))
            .respond_with(vision_text(recognized))
            .expect(1)
            .mount(&server)
            .await;
        mount_classifiers(&server, 1).await;
        let app = app_for(&server);

        let (status, body) = call(&app, Method::POST, "/detect/image", Some(json!({"image": IMAGE}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ocr_length"], recognized.chars().count());
        assert_eq!(body["ocr_text"], recognized);

        let requests = server.received_requests().await.unwrap();
        let fake_news_call = String::from_utf8_lossy(&requests[1].body).into_owned();
        assert!(fake_news_call.contains(r"News text:\nBREAKING: moon made of cheese\n\nReturn"));
    }

    #[tokio::test]
    async fn image_above_axum_default_limit_reaches_vision() {
        use base64::{engine::general_purpose::STANDARD, Engine as _};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANNOTATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"responses": [{}]})))
            .expect(1)
            .mount(&server)
            .await;
        forbid_classifier(&server).await;
        let app = app_for(&server);

        let image = STANDARD.encode(vec![0u8; 3 * 1024 * 1024]);
        assert!(image.len() > 2 * 1024 * 1024);
        let (status, body) = call(&app, Method::POST, "/detect/image", Some(json!({"image": image}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fake_news"]["prediction"], "Unknown");

        let requests = server.received_requests().await.unwrap();
        let ocr_body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(ocr_body["requests"][0]["image"]["content"], image);
    }

    #[tokio::test]
    async fn body_over_configured_limit_is_413() {
        let server = MockServer::start().await;
        Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;
        let app = app_with(&server, &[("MAX_BODY_BYTES", "1024")]);

        let image = "A".repeat(4096);
        let (status, body) = call(&app, Method::POST, "/detect/image", Some(json!({"image": image}))).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["input_type"], "image");
        assert_eq!(body["fake_news"]["prediction"], "Error");
    }

    #[tokio::test]
    async fn ocr_test_keeps_rejection_status() {
        let server = MockServer::start().await;
        Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;
        let app = app_for(&server);

        let (status, body) = call(&app, Method::POST, "/ocr/test", Some(json!({"wrong": 1}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert!(!body["error"].as_str().unwrap().is_empty());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/ocr/test")
            .body(Body::from(json!({"image": IMAGE}).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn repeated_requests_share_no_state() {
        let server = MockServer::start().await;
        mount_classifiers(&server, 2).await;
        let app = app_for(&server);

        let request = json!({"text": "The council approved the budget."});
        let (_, first) = call(&app, Method::POST, "/detect/text", Some(request.clone())).await;
        let (_, second) = call(&app, Method::POST, "/detect/text", Some(request)).await;
        assert_eq!(first["fake_news"], second["fake_news"]);
        assert_eq!(first["clickbait"], second["clickbait"]);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[0].body, requests[2].body);
        assert_eq!(requests[1].body, requests[3].body);
    }

    #[tokio::test]
    async fn ocr_test_reports_recognized_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ANNOTATE_PATH))
            .respond_with(vision_text("标题 headline"))
            .mount(&server)
            .await;
        let app = app_for(&server);

        let (status, body) = call(&app, Method::POST, "/ocr/test", Some(json!({"image": IMAGE}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "text": "标题 headline", "error": "", "length": 11}));
    }

    #[tokio::test]
    async fn health_reports_credentials() {
        let server = MockServer::start().await;
        let app = app_for(&server);
        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["vision_api"], "configured");
        assert_eq!(body["gemini_api"], "configured");
        assert_eq!(body["gemini_model"], "models/gemini-2.5-flash");

        let bare = router(Arc::new(
            AppState::new(&Config::from_lookup(|_| None).unwrap()).unwrap(),
        ));
        let (_, body) = call(&bare, Method::GET, "/health", None).await;
        assert_eq!(body["vision_api"], "missing");
        assert_eq!(body["gemini_api"], "missing");
    }

    #[tokio::test]
    async fn root_lists_endpoints() {
        let server = MockServer::start().await;
        let (status, body) = call(&app_for(&server), Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["endpoints"]
            .as_array()
            .unwrap()
            .iter()
            .any(|e| e == "POST /detect/image"));
    }

    #[tokio::test]
    async fn diagnose_lists_models_or_reports_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{"name": "models/gemini-2.5-flash", "supportedGenerationMethods": ["generateContent"]}]
            })))
            .mount(&server)
            .await;
        let (status, body) = call(&app_for(&server), Method::GET, "/diagnose/gemini", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["models"][0]["name"], "models/gemini-2.5-flash");
        assert_eq!(body["models"][0]["supports_generate_content"], true);

        let bare = router(Arc::new(
            AppState::new(&Config::from_lookup(|_| None).unwrap()).unwrap(),
        ));
        let (status, body) = call(&bare, Method::GET, "/diagnose/gemini", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Gemini API key is not configured");
    }
}
