use herald::Payload;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Counts how often a listener fired.
#[derive(Clone, Debug, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn callback(&self) -> impl Fn(Payload) + Send + Sync + 'static {
        let hits = self.0.clone();
        move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Records every payload a listener observed.
#[derive(Clone, Debug, Default)]
pub struct Recorder(Arc<Mutex<Vec<Payload>>>);

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<Payload> {
        self.0.lock().unwrap().clone()
    }

    pub fn callback(&self) -> impl Fn(Payload) + Send + Sync + 'static {
        let seen = self.0.clone();
        move |payload| seen.lock().unwrap().push(payload)
    }
}

/// Lets already-scheduled deliveries run before asserting. Tests run with a
/// paused clock, so the sleep auto-advances once the runtime is idle.
pub async fn drain() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
