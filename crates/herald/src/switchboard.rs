use crate::payload::Payload;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// A registered listener callback.
pub(crate) type Callback = Arc<dyn Fn(Payload) + Send + Sync>;

/// Governs automatic removal of a listener entry.
#[derive(Clone, Debug)]
pub(crate) enum Disposition {
    /// Fires on every emit until cancelled.
    Persistent,
    /// Removed after its first invocation, regardless of payload.
    Once,
    /// Removed after the first payload equal to the held value; other
    /// payloads pass it by untouched.
    UntilValue(Payload),
}

/// A callback tagged with its disposition. The metadata lives in this
/// record, never on the callback value itself.
struct ListenerEntry {
    seq: u64,
    callback: Callback,
    disposition: Disposition,
}

impl fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("seq", &self.seq)
            .field("disposition", &self.disposition)
            .finish_non_exhaustive()
    }
}

/// The underlying emit-by-key broadcast primitive.
///
/// Keys are plain strings here; the topic-identity rules live a layer up in
/// the bus facade. Emission snapshots the listener set and decides
/// once/until-value disposal synchronously under the table lock, then
/// schedules each delivery as its own task, so listeners attached after an
/// `emit` never observe that payload and one-shot entries cannot fire twice
/// even under back-to-back emits.
#[derive(Default)]
pub(crate) struct Switchboard {
    table: RwLock<FxHashMap<Arc<str>, Vec<ListenerEntry>>>,
    next_seq: AtomicU64,
}

impl fmt::Debug for Switchboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Switchboard").field("keys", &self.table.read().len()).finish()
    }
}

impl Switchboard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` under `key` with the given disposition.
    pub(crate) fn attach(&self, key: Arc<str>, callback: Callback, disposition: Disposition) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        trace!(key = %key, seq, ?disposition, "Attaching listener");
        let mut table = self.table.write();
        table.entry(key).or_default().push(ListenerEntry { seq, callback, disposition });
    }

    /// Delivers `payload` to every listener currently registered under
    /// `key` and returns the number of deliveries scheduled.
    ///
    /// Must be called from within a tokio runtime; each delivery runs as an
    /// independently scheduled task with no ordering guarantee between
    /// listeners.
    pub(crate) fn emit(&self, key: &str, payload: &Payload) -> usize {
        let mut fired: Vec<Callback> = Vec::new();
        {
            let mut table = self.table.write();
            if let Some(entries) = table.get_mut(key) {
                entries.retain(|entry| match &entry.disposition {
                    Disposition::Persistent => {
                        fired.push(entry.callback.clone());
                        true
                    },
                    Disposition::Once => {
                        fired.push(entry.callback.clone());
                        false
                    },
                    Disposition::UntilValue(value) => {
                        if value == payload {
                            fired.push(entry.callback.clone());
                            false
                        } else {
                            true
                        }
                    },
                });
                if entries.is_empty() {
                    table.remove(key);
                }
            }
        }

        if fired.is_empty() {
            trace!(key, "Emit dropped: no listeners");
            return 0;
        }

        let count = fired.len();
        trace!(key, count, "Emit dispatched");
        for callback in fired {
            let payload = payload.clone();
            tokio::spawn(async move { callback(payload) });
        }
        count
    }

    /// Removes every listener registered under `key`.
    pub(crate) fn drop_key(&self, key: &str) -> usize {
        self.table.write().remove(key).map_or(0, |entries| entries.len())
    }

    /// Removes every listener for every key. Returns how many were dropped.
    pub(crate) fn clear(&self) -> usize {
        let mut table = self.table.write();
        let count = table.values().map(Vec::len).sum();
        table.clear();
        count
    }

    /// Number of listeners currently registered under `key`.
    pub(crate) fn listeners(&self, key: &str) -> usize {
        self.table.read().get(key).map_or(0, Vec::len)
    }
}
