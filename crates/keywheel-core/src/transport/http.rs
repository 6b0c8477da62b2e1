//! Reqwest-backed probe transport.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use keywheel_types::TransportError;
use reqwest::Method;
use tracing::debug;

use super::{AuthPlacement, FirstByte, ProbeRequest, ProbeResponse, ProbeTransport};

/// Maximum upstream body length folded into an error message.
const ERROR_BODY_LIMIT: usize = 500;

/// HTTP client settings for probing.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// TCP/TLS connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self { connect_timeout_secs: 10, request_timeout_secs: 30 }
    }
}

/// [`ProbeTransport`] implementation over a shared reqwest client.
pub struct HttpProbeTransport {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl HttpProbeTransport {
    /// Build a transport with its own HTTP client.
    pub fn new(config: &HttpTransportConfig) -> Result<Self, TransportError> {
        let request_timeout = Duration::from_secs(config.request_timeout_secs.max(5));
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs.max(1)))
            .timeout(request_timeout)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| TransportError::Connection {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client, request_timeout })
    }

    fn build_request(
        &self,
        request: &ProbeRequest,
        secret: &str,
    ) -> Result<reqwest::RequestBuilder, TransportError> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|_| {
            TransportError::Connection {
                message: format!("invalid probe method: {}", request.method),
            }
        })?;

        let mut url = request.url.clone();
        if let AuthPlacement::QueryParam(param) = &request.auth {
            url.query_pairs_mut().append_pair(param, secret);
        }

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        builder = match &request.auth {
            AuthPlacement::BearerHeader => builder.bearer_auth(secret),
            AuthPlacement::Header(name) => builder.header(name.as_str(), secret),
            AuthPlacement::QueryParam(_) => builder,
        };

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        Ok(builder)
    }

    fn map_send_error(&self, err: reqwest::Error, started: Instant) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout { elapsed_ms: started.elapsed().as_millis() as u64 }
        } else if err.is_connect() {
            TransportError::Connection { message: err.to_string() }
        } else {
            TransportError::Upstream { message: err.to_string() }
        }
    }

    /// Fold a non-2xx response into an upstream error whose message keeps
    /// the status code and any numeric `Retry-After` header, so the
    /// prober's classifier can recognize rate limiting.
    async fn failure_from_response(response: reqwest::Response) -> TransportError {
        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(ERROR_BODY_LIMIT).collect();

        let mut message = format!("status {status}");
        if let Some(secs) = retry_after {
            message.push_str(&format!("; retry-after: {secs}"));
        }
        if !body.is_empty() {
            message.push_str(&format!("; body: {body}"));
        }

        TransportError::Upstream { message }
    }
}

#[async_trait]
impl ProbeTransport for HttpProbeTransport {
    async fn send(
        &self,
        request: &ProbeRequest,
        secret: &str,
    ) -> Result<ProbeResponse, TransportError> {
        let started = Instant::now();
        let response = self
            .build_request(request, secret)?
            .send()
            .await
            .map_err(|e| self.map_send_error(e, started))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::failure_from_response(response).await);
        }

        // Drain the body so "await full completion" means what it says.
        let _ = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(e, started))?;

        debug!(status = status.as_u16(), "Probe request completed");
        Ok(ProbeResponse { status: status.as_u16() })
    }

    async fn send_first_byte(
        &self,
        request: &ProbeRequest,
        secret: &str,
    ) -> Result<FirstByte, TransportError> {
        let started = Instant::now();
        let response = self
            .build_request(request, secret)?
            .send()
            .await
            .map_err(|e| self.map_send_error(e, started))?;

        if !response.status().is_success() {
            return Err(Self::failure_from_response(response).await);
        }

        let mut stream = response.bytes_stream();
        match tokio::time::timeout(self.request_timeout, stream.next()).await {
            // First chunk arrived; dropping `stream` here cancels the rest
            // of the in-flight response.
            Ok(Some(Ok(_chunk))) => Ok(FirstByte::Received),
            Ok(Some(Err(e))) => Err(self.map_send_error(e, started)),
            Ok(None) => Ok(FirstByte::EmptyStream),
            Err(_) => Err(TransportError::Timeout {
                elapsed_ms: started.elapsed().as_millis() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport() -> HttpProbeTransport {
        HttpProbeTransport::new(&HttpTransportConfig {
            connect_timeout_secs: 2,
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    fn probe_request(server: &MockServer) -> ProbeRequest {
        let url = url::Url::parse(&format!("{}/v1/chat", server.uri())).unwrap();
        ProbeRequest::post_json(url, json!({"model": "probe", "max_tokens": 1}))
    }

    #[tokio::test]
    async fn test_send_substitutes_bearer_credential() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .and(header("authorization", "Bearer sk-under-test"))
            .and(body_partial_json(json!({"model": "probe"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let result = transport().send(&probe_request(&server), "sk-under-test").await;
        assert_eq!(result.unwrap(), ProbeResponse { status: 200 });
    }

    #[tokio::test]
    async fn test_send_supports_query_param_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .and(query_param("key", "sk-under-test"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut request = probe_request(&server);
        request.auth = AuthPlacement::QueryParam("key".to_string());
        let result = transport().send(&request, "sk-under-test").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_non_2xx_becomes_upstream_error_with_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "30")
                    .set_body_string("quota exceeded"),
            )
            .mount(&server)
            .await;

        let err = transport()
            .send(&probe_request(&server), "sk-under-test")
            .await
            .unwrap_err();
        match err {
            TransportError::Upstream { message } => {
                assert!(message.contains("429"));
                assert!(message.contains("retry-after: 30"));
                assert!(message.contains("quota exceeded"));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_first_byte_succeeds_on_streamed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("data: chunk\n\n"))
            .mount(&server)
            .await;

        let result = transport()
            .send_first_byte(&probe_request(&server), "sk-under-test")
            .await;
        assert_eq!(result.unwrap(), FirstByte::Received);
    }

    #[tokio::test]
    async fn test_first_byte_reports_empty_stream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let result = transport()
            .send_first_byte(&probe_request(&server), "sk-under-test")
            .await;
        assert_eq!(result.unwrap(), FirstByte::EmptyStream);
    }
}
