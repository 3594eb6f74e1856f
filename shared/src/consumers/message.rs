use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error};

use sensorgate_types::ObjectId;

use crate::cache::{DataCache, SensorLookup};
use crate::consumers::secret;
use crate::consumers::shard::ShardBuffer;
use crate::consumers::MessagePair;
use crate::mqtt::MessagePublisher;
use crate::validator::BULK_SEPARATOR;

/// Per-shard message sink.
///
/// Same drain/sort/authorize walk as the measurement consumer; the outbound
/// batch is the concatenation of the raw authorized payloads, so downstream
/// consumers can split without re-encoding.
pub struct MessageConsumer {
    buffer: ShardBuffer<MessagePair>,
    cache: Arc<DataCache>,
    publisher: Arc<dyn MessagePublisher>,
    topic: String,
    batch_size: usize,
}

impl MessageConsumer {
    pub fn new(
        publisher: Arc<dyn MessagePublisher>,
        cache: Arc<DataCache>,
        topic: String,
        batch_size: usize,
    ) -> Self {
        Self {
            buffer: ShardBuffer::new(),
            cache,
            publisher,
            topic,
            batch_size,
        }
    }

    pub fn push(&self, pair: MessagePair) {
        self.buffer.push(pair);
    }

    pub fn push_bulk(&self, pairs: Vec<MessagePair>) {
        self.buffer.push_bulk(pairs);
    }

    /// Drain and authorize the shard. Returns the number of authorized
    /// messages, or 0 when the publish failed.
    pub async fn process(&self) -> usize {
        let mut data = self.buffer.drain();

        if data.is_empty() {
            return 0;
        }

        data.sort_by(|x, y| x.1.sensor_id.cmp(&y.1.sensor_id));

        let now = Instant::now();
        let mut current: Option<(ObjectId, SensorLookup)> = None;
        let mut authorized = Vec::with_capacity(data.len());

        for (raw, model) in data {
            let stale = match &current {
                Some((id, _)) => *id != model.sensor_id,
                None => true,
            };

            if stale {
                let lookup = self.cache.get_sensor(&model.sensor_id, now);
                current = Some((model.sensor_id, lookup));
            }

            let sensor = match &current {
                Some((_, (true, Some(sensor)))) => sensor,
                _ => continue,
            };

            if !secret::authorize(&raw, &model.secret, &sensor.secret) {
                debug!(sensor_id = %model.sensor_id, "message failed authorization");
                continue;
            }

            authorized.push(raw);
        }

        if authorized.is_empty() {
            return 0;
        }

        let count = authorized.len();

        for chunk in authorized.chunks(self.batch_size) {
            let mut payload = String::with_capacity(
                chunk.iter().map(|raw| raw.len() + 1).sum(),
            );

            for raw in chunk {
                if !payload.is_empty() {
                    payload.push(BULK_SEPARATOR);
                }
                payload.push_str(raw);
            }

            if let Err(err) = self.publisher.publish(&self.topic, payload.into_bytes()).await {
                error!(
                    error = %err,
                    topic = %self.topic,
                    "failed to publish authorized messages"
                );
                return 0;
            }
        }

        count
    }
}
