use log::{debug, error, warn};

use crate::storage::KeyValueStore;

pub const VIEW_COUNT_KEY: &str = "viewCount";
pub const READ_COUNT_KEY: &str = "readCount";

/// A non-negative counter stored as a decimal string under `key`.
#[derive(Debug, Clone, Copy)]
pub struct UsageCounter {
    key: &'static str,
}

impl UsageCounter {
    pub const fn new(key: &'static str) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Stored value; 0 when absent or unreadable.
    pub fn read(&self, store: &dyn KeyValueStore) -> u64 {
        match store.get(self.key) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("Ignoring unreadable {} value {raw:?}", self.key);
                0
            }),
            None => 0,
        }
    }

    /// Read, add one, write back and return the new value. A failed write is
    /// logged and the in-session value is still returned.
    pub fn increment_and_persist(&self, store: &mut dyn KeyValueStore) -> u64 {
        let value = self.read(store).saturating_add(1);
        if let Err(e) = store.set(self.key, &value.to_string()) {
            error!("Failed to persist {}: {e}", self.key);
        }
        debug!("{} -> {value}", self.key);
        value
    }
}

/// View and completed-read counts as shown in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UsageCounts {
    pub views: u64,
    pub reads: u64,
}

pub struct UsageCounters {
    reads: UsageCounter,
    counts: UsageCounts,
}

impl UsageCounters {
    /// Load both counters and record this mount as a view.
    pub fn mount(store: &mut dyn KeyValueStore) -> Self {
        let views = UsageCounter::new(VIEW_COUNT_KEY);
        let reads = UsageCounter::new(READ_COUNT_KEY);
        let counts = UsageCounts {
            views: views.increment_and_persist(store),
            reads: reads.read(store),
        };
        Self { reads, counts }
    }

    pub fn record_completed_read(&mut self, store: &mut dyn KeyValueStore) -> u64 {
        self.counts.reads = self.reads.increment_and_persist(store);
        self.counts.reads
    }

    pub fn counts(&self) -> UsageCounts {
        self.counts
    }
}
