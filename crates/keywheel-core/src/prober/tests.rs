use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use keywheel_types::{BalancePolicy, KeyRecord, KeyStatus, ProbeOutcome, TransportError};

use super::{apply_outcome, probe_batch, probe_one};
use crate::transport::{FirstByte, ProbeMode, ProbeRequest, ProbeResponse, ProbeTransport};

/// Transport that replays a scripted result per secret and counts probes.
struct ScriptedTransport {
    script: Mutex<HashMap<String, Result<(), TransportError>>>,
    first_byte: FirstByte,
    probes_issued: AtomicUsize,
}

impl ScriptedTransport {
    fn new() -> Self {
        Self {
            script: Mutex::new(HashMap::new()),
            first_byte: FirstByte::Received,
            probes_issued: AtomicUsize::new(0),
        }
    }

    fn succeed_all() -> Self {
        Self::new()
    }

    fn with_result(self, secret: &str, result: Result<(), TransportError>) -> Self {
        self.script.lock().unwrap().insert(secret.to_string(), result);
        self
    }

    fn with_first_byte(mut self, first_byte: FirstByte) -> Self {
        self.first_byte = first_byte;
        self
    }

    fn probes_issued(&self) -> usize {
        self.probes_issued.load(Ordering::SeqCst)
    }

    fn lookup(&self, secret: &str) -> Result<(), TransportError> {
        self.probes_issued.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .get(secret)
            .cloned()
            .unwrap_or(Ok(()))
    }
}

#[async_trait]
impl ProbeTransport for ScriptedTransport {
    async fn send(
        &self,
        _request: &ProbeRequest,
        secret: &str,
    ) -> Result<ProbeResponse, TransportError> {
        self.lookup(secret).map(|()| ProbeResponse { status: 200 })
    }

    async fn send_first_byte(
        &self,
        _request: &ProbeRequest,
        secret: &str,
    ) -> Result<FirstByte, TransportError> {
        self.lookup(secret).map(|()| self.first_byte)
    }
}

fn key(id: &str) -> KeyRecord {
    KeyRecord::new(id, format!("sk-{id}"))
}

fn request() -> ProbeRequest {
    let url = url::Url::parse("https://upstream.test/v1/chat").unwrap();
    ProbeRequest::post_json(url, serde_json::json!({"max_tokens": 1}))
}

#[tokio::test]
async fn probe_one_reports_success_with_elapsed_time() {
    let transport = ScriptedTransport::succeed_all();
    let outcome = probe_one(&transport, &key("key-a"), &request(), ProbeMode::Await).await;
    assert!(matches!(outcome, ProbeOutcome::Success { .. }));
}

#[tokio::test]
async fn probe_one_classifies_rate_limit_errors() {
    let transport = ScriptedTransport::new().with_result(
        "sk-key-a",
        Err(TransportError::Upstream { message: "status 429; retry-after: 12".into() }),
    );

    let outcome = probe_one(&transport, &key("key-a"), &request(), ProbeMode::Await).await;
    assert_eq!(outcome, ProbeOutcome::RateLimited { retry_after_seconds: Some(12) });
}

#[tokio::test]
async fn probe_one_classifies_other_failures_as_errors() {
    let transport = ScriptedTransport::new().with_result(
        "sk-key-a",
        Err(TransportError::Connection { message: "dns failure".into() }),
    );

    let outcome = probe_one(&transport, &key("key-a"), &request(), ProbeMode::Await).await;
    match outcome {
        ProbeOutcome::Error { message } => assert!(message.contains("dns failure")),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn probe_one_first_byte_success() {
    let transport = ScriptedTransport::succeed_all().with_first_byte(FirstByte::Received);
    let outcome = probe_one(&transport, &key("key-a"), &request(), ProbeMode::FirstByte).await;
    assert!(outcome.is_success());
}

#[tokio::test]
async fn probe_one_first_byte_empty_stream_is_an_error() {
    let transport = ScriptedTransport::succeed_all().with_first_byte(FirstByte::EmptyStream);
    let outcome = probe_one(&transport, &key("key-a"), &request(), ProbeMode::FirstByte).await;
    assert_eq!(outcome, ProbeOutcome::Error { message: "no data received".into() });
}

#[tokio::test]
async fn batch_emits_len_plus_one_snapshots_in_order() {
    let transport = ScriptedTransport::new().with_result(
        "sk-key-b",
        Err(TransportError::Upstream { message: "status 500".into() }),
    );
    let keys = vec![key("key-a"), key("key-b"), key("key-c")];
    let request = request();

    let stream = probe_batch(
        &transport,
        &keys,
        &request,
        ProbeMode::Await,
        Duration::from_millis(0),
    );
    let snapshots: Vec<_> = stream.collect().await;

    assert_eq!(snapshots.len(), 4);
    for (i, snapshot) in snapshots.iter().enumerate().take(3) {
        assert_eq!(snapshot.total, 3);
        assert_eq!(snapshot.completed, i);
        assert_eq!(snapshot.current_key_id.as_deref(), Some(keys[i].id.as_str()));
        assert_eq!(snapshot.results.len(), i);
        assert!(!snapshot.is_final());
    }

    let last = &snapshots[3];
    assert!(last.is_final());
    assert_eq!(last.results.len(), 3);
    assert!(last.results["key-a"].is_success());
    assert!(matches!(last.results["key-b"], ProbeOutcome::Error { .. }));
    assert!(last.results["key-c"].is_success());
}

#[tokio::test(start_paused = true)]
async fn batch_waits_between_probes_but_not_after_the_last() {
    let transport = ScriptedTransport::succeed_all();
    let keys = vec![key("key-a"), key("key-b"), key("key-c")];
    let request = request();
    let delay = Duration::from_secs(1);

    let started = tokio::time::Instant::now();
    let stream = probe_batch(&transport, &keys, &request, ProbeMode::Await, delay);
    let snapshots: Vec<_> = stream.collect().await;
    let elapsed = started.elapsed();

    assert_eq!(snapshots.len(), 4);
    // Two inter-probe delays for three keys; none after the final probe.
    assert!(elapsed >= delay * 2, "elapsed {elapsed:?}");
    assert!(elapsed < delay * 3, "elapsed {elapsed:?}");
}

#[tokio::test]
async fn dropping_the_batch_stream_stops_probing() {
    let transport = ScriptedTransport::succeed_all();
    let keys = vec![key("key-a"), key("key-b"), key("key-c")];
    let request = request();

    {
        let stream = probe_batch(
            &transport,
            &keys,
            &request,
            ProbeMode::Await,
            Duration::from_millis(0),
        );
        futures::pin_mut!(stream);

        // Pull only the first two snapshots: one probe has been issued.
        let first = stream.next().await.unwrap();
        assert_eq!(first.completed, 0);
        let second = stream.next().await.unwrap();
        assert_eq!(second.completed, 1);
    }

    assert_eq!(transport.probes_issued(), 1);
}

#[tokio::test]
async fn apply_outcome_feeds_the_tracker() {
    let policy = BalancePolicy { max_consecutive_failures: 1, ..Default::default() };
    let now = Utc::now();
    let k = key("key-a");

    let failed = apply_outcome(
        &k,
        &ProbeOutcome::Error { message: "probe failed".into() },
        &policy,
        now,
    );
    assert_eq!(failed.status, KeyStatus::Error);
    assert_eq!(failed.usage.failed_requests, 1);

    let healed = apply_outcome(
        &failed,
        &ProbeOutcome::Success { response_time_ms: 9 },
        &policy,
        now,
    );
    assert_eq!(healed.status, KeyStatus::Active);
    assert_eq!(healed.usage.consecutive_failures, 0);
}
