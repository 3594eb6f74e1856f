use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::warn;

use sensorgate_types::Command;

/// Queue of pending cache-invalidation commands.
///
/// The control-topic callback pushes parsed commands; the service drains
/// the queue at the end of every tick, after payload processing, so an
/// invalidation racing a bulk reload is re-applied on top of the reload.
pub struct CommandConsumer {
    queue: Mutex<VecDeque<Command>>,
}

impl CommandConsumer {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, command: Command) {
        self.queue.lock().push_back(command);
    }

    /// Parse a control payload and enqueue it; malformed commands are
    /// logged and dropped.
    pub fn push_raw(&self, raw: &str) {
        match Command::parse(raw) {
            Ok(command) => self.push(command),
            Err(err) => warn!(error = %err, "dropping malformed control command"),
        }
    }

    /// Take every pending command, preserving arrival order.
    pub fn drain(&self) -> Vec<Command> {
        self.queue.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl Default for CommandConsumer {
    fn default() -> Self {
        Self::new()
    }
}
