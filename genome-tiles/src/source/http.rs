//! HTTP client abstraction for testability

use std::time::Duration;

use super::BoxFuture;
use crate::error::FetchError;

/// Default request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Status line and body of an HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// True for statuses in [200, 300).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for asynchronous HTTP GET requests.
///
/// Non-success statuses are returned as responses, not errors; only transport
/// failures are errors. This lets callers decide how to report a status.
pub trait AsyncHttpClient: Send + Sync {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, FetchError>>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT_SECS)
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, FetchError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| FetchError::Network(format!("Request failed: {}", e)))?;

            let status = response.status();
            let status_text = status.canonical_reason().unwrap_or("").to_string();
            let body = response
                .bytes()
                .await
                .map_err(|e| FetchError::Network(format!("Failed to read response: {}", e)))?;

            Ok(HttpResponse {
                status: status.as_u16(),
                status_text,
                body: body.to_vec(),
            })
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Mock HTTP client serving canned responses by URL.
    ///
    /// Unknown URLs answer 404.
    #[derive(Default)]
    pub struct MockHttpClient {
        responses: HashMap<String, HttpResponse>,
        requests: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_json(mut self, url: &str, body: &str) -> Self {
            self.responses.insert(
                url.to_string(),
                HttpResponse {
                    status: 200,
                    status_text: "OK".to_string(),
                    body: body.as_bytes().to_vec(),
                },
            );
            self
        }

        pub fn with_status(mut self, url: &str, status: u16, status_text: &str) -> Self {
            self.responses.insert(
                url.to_string(),
                HttpResponse {
                    status,
                    status_text: status_text.to_string(),
                    body: Vec::new(),
                },
            );
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().clone()
        }
    }

    impl AsyncHttpClient for MockHttpClient {
        fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, FetchError>> {
            self.requests.lock().push(url.to_string());
            let response = self.responses.get(url).cloned().unwrap_or(HttpResponse {
                status: 404,
                status_text: "Not Found".to_string(),
                body: Vec::new(),
            });
            Box::pin(async move { Ok(response) })
        }
    }

    #[test]
    fn test_success_range() {
        let mut response = HttpResponse {
            status: 200,
            status_text: "OK".into(),
            body: vec![],
        };
        assert!(response.is_success());
        response.status = 299;
        assert!(response.is_success());
        response.status = 300;
        assert!(!response.is_success());
        response.status = 199;
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_mock_client_records_requests() {
        let mock = MockHttpClient::new().with_json("http://example.com/a", "[]");

        let ok = mock.get("http://example.com/a").await.unwrap();
        assert_eq!(ok.status, 200);
        assert_eq!(ok.body, b"[]".to_vec());

        let missing = mock.get("http://example.com/b").await.unwrap();
        assert_eq!(missing.status, 404);

        assert_eq!(
            mock.requests(),
            vec!["http://example.com/a", "http://example.com/b"]
        );
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(ReqwestClient::with_timeout(5).is_ok());
    }
}
