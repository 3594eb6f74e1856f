// ============================================================================
// Data Cache
// ============================================================================
//
// TTL-indexed mapping of sensors, users, and API keys. The cache is
// eventually consistent with the repositories: lookups distinguish
// "not yet known" from "known to be unauthorized" so that callers can drop
// cold-start traffic without treating it as a rejection.
//
// ============================================================================

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use uuid::Uuid;

use sensorgate_types::{ApiKey, ObjectId, Sensor, User};

/// Outcome of a sensor lookup.
///
/// - `(false, None)`  - unknown or expired; treat the sensor as unknown for
///   this tick.
/// - `(true, None)`   - known to be unauthorized; skip silently.
/// - `(true, Some(_))` - use this sensor to validate.
pub type SensorLookup = (bool, Option<Sensor>);

/// A cached value together with its insertion time and lifetime.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) >= self.ttl
    }
}

/// Sweep position for the budgeted cleanup; cycles over the three maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SweepStage {
    Sensors,
    Users,
    Keys,
}

impl SweepStage {
    fn next(self) -> Self {
        match self {
            SweepStage::Sensors => SweepStage::Users,
            SweepStage::Users => SweepStage::Keys,
            SweepStage::Keys => SweepStage::Sensors,
        }
    }
}

struct Inner {
    sensors: HashMap<ObjectId, CacheEntry<Sensor>>,
    users: HashMap<Uuid, CacheEntry<User>>,
    keys: HashMap<String, CacheEntry<ApiKey>>,
    sweep: SweepStage,
}

/// The shared metadata cache.
///
/// A single reader-writer lock governs the interior: lookups take a read
/// guard, upserts and flushes take a write guard, and the cleanup sweep
/// takes a write guard per increment so it never monopolizes the lock.
pub struct DataCache {
    inner: RwLock<Inner>,
    ttl: Duration,
}

impl DataCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner {
                sensors: HashMap::new(),
                users: HashMap::new(),
                keys: HashMap::new(),
                sweep: SweepStage::Sensors,
            }),
            ttl,
        }
    }

    /// Look up a sensor and verify that its owner and key are live.
    ///
    /// `now` is supplied by the caller so a whole drained batch is judged
    /// against one consistent clock reading.
    pub fn get_sensor(&self, id: &ObjectId, now: Instant) -> SensorLookup {
        let inner = self.inner.read();

        let sensor = match inner.sensors.get(id) {
            Some(entry) if !entry.is_expired(now) => &entry.value,
            _ => return (false, None),
        };

        match inner.users.get(&sensor.owner) {
            Some(entry) if !entry.is_expired(now) => {
                if entry.value.is_disabled() {
                    return (true, None);
                }
            }
            _ => return (false, None),
        }

        match inner.keys.get(&sensor.secret) {
            Some(entry) if !entry.is_expired(now) => {
                if entry.value.revoked {
                    return (true, None);
                }
            }
            _ => return (false, None),
        }

        (true, Some(sensor.clone()))
    }

    /// Bulk upsert of sensors; existing entries are replaced and their age
    /// reset.
    pub fn append_sensors(&self, sensors: Vec<Sensor>) {
        let mut inner = self.inner.write();

        for sensor in sensors {
            inner
                .sensors
                .insert(sensor.id, CacheEntry::new(sensor, self.ttl));
        }
    }

    pub fn append_users(&self, users: Vec<User>) {
        let mut inner = self.inner.write();

        for user in users {
            inner.users.insert(user.id, CacheEntry::new(user, self.ttl));
        }
    }

    pub fn append_keys(&self, keys: Vec<ApiKey>) {
        let mut inner = self.inner.write();

        for key in keys {
            inner
                .keys
                .insert(key.key.clone(), CacheEntry::new(key, self.ttl));
        }
    }

    pub fn flush_sensor(&self, id: &ObjectId) {
        self.inner.write().sensors.remove(id);
    }

    /// Remove a user entry. Sensors owned by the user stay in the map but
    /// fail their next lookup until the user is re-added.
    pub fn flush_user(&self, id: &Uuid) {
        self.inner.write().users.remove(id);
    }

    pub fn flush_key(&self, key: &str) {
        self.inner.write().keys.remove(key);
    }

    /// Time-bounded sweep of expired entries.
    ///
    /// Works through the three maps in a fixed rotation, re-acquiring the
    /// write lock per map and re-checking the deadline between chunks. Work
    /// left over when the budget runs out resumes from the same stage on the
    /// next call.
    pub fn cleanup_for(&self, budget: Duration) {
        let deadline = Instant::now() + budget;

        for _ in 0..3 {
            if Instant::now() >= deadline {
                return;
            }

            let mut inner = self.inner.write();
            let now = Instant::now();
            let stage = inner.sweep;

            let completed = match stage {
                SweepStage::Sensors => {
                    sweep_map(&mut inner.sensors, now, deadline)
                }
                SweepStage::Users => sweep_map(&mut inner.users, now, deadline),
                SweepStage::Keys => sweep_map(&mut inner.keys, now, deadline),
            };

            if !completed {
                return;
            }

            inner.sweep = stage.next();
        }
    }

    /// Number of live sensor entries; used by the reload logging.
    pub fn sensor_count(&self) -> usize {
        self.inner.read().sensors.len()
    }
}

/// Remove expired entries from one map, checking the deadline every chunk.
/// Returns true when the whole map was scanned.
fn sweep_map<K, V>(
    map: &mut HashMap<K, CacheEntry<V>>,
    now: Instant,
    deadline: Instant,
) -> bool
where
    K: std::hash::Hash + Eq + Clone,
{
    const CHUNK: usize = 64;

    let mut expired = Vec::new();
    let mut scanned = 0usize;
    let mut completed = true;

    for (key, entry) in map.iter() {
        if entry.is_expired(now) {
            expired.push(key.clone());
        }

        scanned += 1;

        if scanned % CHUNK == 0 && Instant::now() >= deadline {
            completed = false;
            break;
        }
    }

    for key in expired {
        map.remove(&key);
    }

    completed
}
