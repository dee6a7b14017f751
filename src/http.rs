use std::time::Duration;

const USER_AGENT: &str = "news-verdict-api/0.1";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Outbound client shared by the OCR and Gemini callers. `timeout` bounds the
/// whole exchange; there are no retries at this layer.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::ClientBuilder::new()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

pub fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("TimeoutError: {e}")
    } else if e.is_connect() {
        format!("ConnectError: {e}")
    } else {
        format!("RequestError: {e}")
    }
}
