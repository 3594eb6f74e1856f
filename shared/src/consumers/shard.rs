use parking_lot::Mutex;

/// One shard's ingress buffer.
///
/// Pushes append under the mutex; `drain` swaps the whole buffer out so the
/// caller can sort and authorize without holding the lock.
pub(crate) struct ShardBuffer<T> {
    inner: Mutex<Vec<T>>,
}

impl<T> ShardBuffer<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn push(&self, item: T) {
        self.inner.lock().push(item);
    }

    pub(crate) fn push_bulk(&self, mut items: Vec<T>) {
        self.inner.lock().append(&mut items);
    }

    pub(crate) fn drain(&self) -> Vec<T> {
        std::mem::take(&mut *self.inner.lock())
    }
}
