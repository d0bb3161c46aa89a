//! Outbound HTTP access to the OData service.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::ToolError;

/// Longest slice of an upstream error body quoted in a failure message.
const MAX_ERROR_BODY: usize = 300;

/// Issues a single GET against a fully built URL and decodes the JSON body.
///
/// Implementations must not retry: every failure goes straight back to the
/// dispatcher.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Value, ToolError>;
}

/// [`Fetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, ToolError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = status.canonical_reason().unwrap_or("request failed");
            warn!("Upstream returned {} for {}", status, url);
            return Err(ToolError::upstream(
                status.as_u16(),
                format!("{reason}{}", summarize_body(&body)),
            ));
        }

        response.json::<Value>().await.map_err(|e| {
            ToolError::upstream(status.as_u16(), format!("response is not valid JSON: {e}"))
        })
    }
}

/// Map a `reqwest` send error onto the tool error taxonomy.
fn classify(error: reqwest::Error) -> ToolError {
    match error.status() {
        Some(status) => ToolError::upstream(status.as_u16(), error.to_string()),
        None => ToolError::transport(error.to_string()),
    }
}

fn summarize_body(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return String::new();
    }
    let mut end = body.len().min(MAX_ERROR_BODY);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    let ellipsis = if end < body.len() { "..." } else { "" };
    format!(" - {}{ellipsis}", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_body_empty() {
        assert_eq!(summarize_body("  \n"), "");
    }

    #[test]
    fn test_summarize_body_truncates_on_char_boundary() {
        let body = "é".repeat(MAX_ERROR_BODY);
        let summary = summarize_body(&body);
        assert!(summary.starts_with(" - é"));
        assert!(summary.ends_with("..."));
        assert!(summary.len() <= MAX_ERROR_BODY + 6);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Port 9 on localhost (discard) is not expected to accept HTTP.
        let fetcher = HttpFetcher::new();
        let err = fetcher.fetch("http://127.0.0.1:9/odata").await.unwrap_err();
        assert!(matches!(err, ToolError::Transport(_)), "got {err:?}");
    }

    /// Serve one canned response on a local port; returns its URL.
    #[cfg(feature = "http")]
    async fn upstream(
        status: axum::http::StatusCode,
        content_type: &'static str,
        body: &'static str,
    ) -> String {
        use axum::{Router, http::header, routing::get};

        let app = Router::new().route(
            "/odata",
            get(move || async move { (status, [(header::CONTENT_TYPE, content_type)], body) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/odata")
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_error_status_is_upstream_error_with_body() {
        let url = upstream(
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "text/plain",
            "down for maintenance",
        )
        .await;

        let err = HttpFetcher::new().fetch(&url).await.unwrap_err();
        assert_eq!(
            err,
            ToolError::Upstream {
                status: 503,
                message: "Service Unavailable - down for maintenance".to_string(),
            }
        );
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_non_json_success_is_upstream_error() {
        let url = upstream(
            axum::http::StatusCode::OK,
            "text/html",
            "<html><body>manutenção</body></html>",
        )
        .await;

        let err = HttpFetcher::new().fetch(&url).await.unwrap_err();
        match err {
            ToolError::Upstream { status, message } => {
                assert_eq!(status, 200);
                assert!(message.starts_with("response is not valid JSON"), "{message}");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_json_success_is_returned_untouched() {
        let url = upstream(
            axum::http::StatusCode::OK,
            "application/json",
            r#"{"value":[{"AnoMes":202312}]}"#,
        )
        .await;

        let data = HttpFetcher::new().fetch(&url).await.unwrap();
        assert_eq!(data, serde_json::json!({ "value": [{ "AnoMes": 202312 }] }));
    }
}
