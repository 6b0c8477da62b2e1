//! Probe transport seam
//!
//! The prober issues a minimal synthetic request through an externally
//! supplied transport; it does not know the upstream wire protocol. This
//! module defines that seam plus a reqwest-backed adapter for the common
//! HTTP case.

mod http;

pub use http::{HttpProbeTransport, HttpTransportConfig};

use async_trait::async_trait;
use keywheel_types::TransportError;
use serde_json::Value;
use url::Url;

/// How the credential under test is substituted into the probe request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPlacement {
    /// `Authorization: Bearer <secret>`
    BearerHeader,
    /// `<header-name>: <secret>`
    Header(String),
    /// `?<param-name>=<secret>`
    QueryParam(String),
}

/// Minimal fixed request description; only the credential varies per probe.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    /// Upstream endpoint
    pub url: Url,
    /// HTTP method name (e.g. "POST")
    pub method: String,
    /// Fixed headers sent with every probe
    pub headers: Vec<(String, String)>,
    /// Optional JSON body
    pub body: Option<Value>,
    /// Where the credential goes
    pub auth: AuthPlacement,
}

impl ProbeRequest {
    /// A POST probe with a JSON body and bearer auth, the common shape for
    /// chat-completion style upstreams.
    pub fn post_json(url: Url, body: Value) -> Self {
        Self {
            url,
            method: "POST".to_string(),
            headers: Vec::new(),
            body: Some(body),
            auth: AuthPlacement::BearerHeader,
        }
    }
}

/// How much of the upstream response a probe waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeMode {
    /// Await full completion of the response
    #[default]
    Await,
    /// Treat arrival of the first data unit as success, then cancel
    FirstByte,
}

/// Successful result of an awaited probe request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    /// Upstream status code
    pub status: u16,
}

/// Result of a first-byte probe that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstByte {
    /// At least one data unit arrived; the call was cancelled afterwards
    Received,
    /// The stream completed without yielding any data
    EmptyStream,
}

/// Capability to issue one probe request with a substituted credential.
///
/// Implementations own their timeouts; the prober adds none. Both methods
/// must be cancel-safe: dropping the returned future abandons the probe.
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    /// Issue the request and await full completion.
    async fn send(
        &self,
        request: &ProbeRequest,
        secret: &str,
    ) -> Result<ProbeResponse, TransportError>;

    /// Issue the request as a stream and resolve on the first data unit,
    /// abandoning the rest of the response.
    async fn send_first_byte(
        &self,
        request: &ProbeRequest,
        secret: &str,
    ) -> Result<FirstByte, TransportError>;
}
