//! Throttled sequential batch probing.

use std::collections::HashMap;
use std::time::Duration;

use futures::Stream;
use keywheel_types::{BatchProgress, KeyRecord, ProbeOutcome};
use tracing::debug;

use crate::transport::{ProbeMode, ProbeRequest, ProbeTransport};

use super::probe_one;

/// Probe a batch of credentials one by one, yielding a progress snapshot
/// before each probe and a final one after the last.
///
/// A batch over `n` keys emits exactly `n + 1` snapshots. Probes run
/// strictly sequentially with `inter_probe_delay` between them (not after
/// the last) so credentials sharing an upstream quota are not hammered in
/// parallel. The stream is lazy: work only happens while the consumer
/// keeps polling, so dropping it cancels the remainder of the batch.
pub fn probe_batch<'a>(
    transport: &'a dyn ProbeTransport,
    keys: &'a [KeyRecord],
    request: &'a ProbeRequest,
    mode: ProbeMode,
    inter_probe_delay: Duration,
) -> impl Stream<Item = BatchProgress> + 'a {
    async_stream::stream! {
        let total = keys.len();
        let mut results: HashMap<String, ProbeOutcome> = HashMap::new();

        for (index, key) in keys.iter().enumerate() {
            yield BatchProgress {
                total,
                completed: index,
                current_key_id: Some(key.id.clone()),
                results: results.clone(),
            };

            let outcome = probe_one(transport, key, request, mode).await;
            results.insert(key.id.clone(), outcome);

            if index + 1 < total {
                tokio::time::sleep(inter_probe_delay).await;
            }
        }

        debug!(total, "Batch probe finished");
        yield BatchProgress {
            total,
            completed: total,
            current_key_id: None,
            results,
        };
    }
}
