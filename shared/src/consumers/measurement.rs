use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error};

use sensorgate_types::ObjectId;

use crate::cache::{DataCache, SensorLookup};
use crate::consumers::secret;
use crate::consumers::shard::ShardBuffer;
use crate::consumers::MeasurementPair;
use crate::mqtt::MessagePublisher;
use crate::proto;

/// Per-shard measurement sink.
///
/// `process` swaps the shard buffer out, sorts the batch by sensor id so a
/// cached lookup is reused across adjacent entries, authorizes each payload,
/// and publishes the survivors to the internal bulk-measurement topic as
/// protobuf batches.
pub struct MeasurementConsumer {
    buffer: ShardBuffer<MeasurementPair>,
    cache: Arc<DataCache>,
    publisher: Arc<dyn MessagePublisher>,
    topic: String,
    batch_size: usize,
}

impl MeasurementConsumer {
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

    pub fn push(&self, pair: MeasurementPair) {
        self.buffer.push(pair);
    }

    pub fn push_bulk(&self, pairs: Vec<MeasurementPair>) {
        self.buffer.push_bulk(pairs);
    }

    /// Drain and authorize the shard. Returns the number of authorized
    /// measurements, or 0 when the publish failed.
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
                // Unknown this tick, or known-unauthorized: drop silently.
                _ => continue,
            };

            if !secret::authorize(&raw, &model.secret, &sensor.secret) {
                debug!(sensor_id = %model.sensor_id, "measurement failed authorization");
                continue;
            }

            authorized.push(model);
        }

        if authorized.is_empty() {
            return 0;
        }

        let count = authorized.len();

        for chunk in authorized.chunks(self.batch_size) {
            let payload = proto::to_protobuf(chunk);

            if let Err(err) = self.publisher.publish(&self.topic, payload).await {
                error!(
                    error = %err,
                    topic = %self.topic,
                    "failed to publish authorized measurements"
                );
                return 0;
            }
        }

        count
    }
}
