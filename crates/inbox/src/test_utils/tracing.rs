//! A `tracing-subscriber` layer that collects events and their levels.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{layer::Context, Layer};

/// Storage for collected traces.
#[derive(Debug, Default, Clone)]
pub struct TraceStorage(pub Arc<Mutex<Vec<(Level, String)>>>);

impl TraceStorage {
    /// Returns the messages collected at the given level.
    pub fn get_by_level(&self, level: Level) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|(l, message)| (*l == level).then(|| message.clone()))
            .collect()
    }

    /// Locks the storage and returns the collected items.
    pub fn lock(&self) -> MutexGuard<'_, Vec<(Level, String)>> {
        self.0.lock().unwrap()
    }

    /// Whether nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// A subscriber layer that records every event into a [TraceStorage].
#[derive(Debug, Default)]
pub struct CollectingLayer {
    storage: TraceStorage,
}

impl CollectingLayer {
    /// Creates a layer writing into the given storage.
    pub const fn new(storage: TraceStorage) -> Self {
        Self { storage }
    }
}

impl<S: Subscriber> Layer<S> for CollectingLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        self.storage.lock().push((*metadata.level(), format!("{event:?}")));
    }
}
