use crate::error::HeraldError;
use crate::payload::Payload;
use crate::switchboard::{Disposition, Switchboard};
use crate::tracking::TrackingNo;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, trace};

/// Pending-request lifecycle: created, then settled exactly once by either
/// a matching response or timer expiry, whichever wins.
const PENDING: u8 = 0;
const FULFILLED: u8 = 1;
const TIMED_OUT: u8 = 2;

/// Single-winner completion record shared between the reply listener and
/// the watchdog timer. The atomic state guards against double settlement;
/// whichever trigger loses the race becomes a no-op.
struct Completion {
    state: std::sync::atomic::AtomicU8,
    outcome: Mutex<Option<oneshot::Sender<Result<Payload, HeraldError>>>>,
    timer: Mutex<Option<AbortHandle>>,
}

impl Completion {
    fn new(outcome: oneshot::Sender<Result<Payload, HeraldError>>) -> Arc<Self> {
        Arc::new(Self {
            state: std::sync::atomic::AtomicU8::new(PENDING),
            outcome: Mutex::new(Some(outcome)),
            timer: Mutex::new(None),
        })
    }

    fn transition(&self, to: u8) -> bool {
        use std::sync::atomic::Ordering;
        self.state.compare_exchange(PENDING, to, Ordering::AcqRel, Ordering::Acquire).is_ok()
    }

    fn arm_timer(&self, handle: AbortHandle) {
        let mut timer = self.timer.lock();
        if timer.is_none() {
            *timer = Some(handle);
        }
    }

    /// Resolves the caller's future with `answer`, then cancels the timer.
    /// Cleanup happens after resolution; the reply listener itself was
    /// already detached by its once-disposition inside the emitting call.
    fn fulfill(&self, tracking: &TrackingNo, answer: Payload) {
        if !self.transition(FULFILLED) {
            trace!(%tracking, "Late response ignored: request already settled");
            return;
        }
        if let Some(outcome) = self.outcome.lock().take() {
            let _ = outcome.send(Ok(answer));
        }
        if let Some(timer) = self.timer.lock().take() {
            timer.abort();
        }
        debug!(%tracking, "Request fulfilled");
    }

    /// Rejects the caller's future with a timeout. Returns whether this
    /// call won the race (and the reply listener still needs detaching).
    fn time_out(&self, tracking: &TrackingNo, ttl: Duration) -> bool {
        if !self.transition(TIMED_OUT) {
            return false;
        }
        if let Some(outcome) = self.outcome.lock().take() {
            let _ = outcome.send(Err(HeraldError::request_timeout(format!(
                "no response for {tracking} within {}ms",
                ttl.as_millis()
            ))));
        }
        debug!(%tracking, ttl_ms = ttl.as_millis() as u64, "Request timed out");
        true
    }
}

/// The caller-visible future returned by `request`.
///
/// Resolves with the responder's answer, or rejects with
/// [`HeraldError::RequestTimeout`] once the TTL elapses, never both.
/// Topic-validation failures surface here too, keeping the asynchronous
/// contract uniform.
#[derive(Debug)]
pub struct PendingReply {
    rx: oneshot::Receiver<Result<Payload, HeraldError>>,
}

impl PendingReply {
    /// A reply that is already settled, used for validation failures.
    pub(crate) fn rejected(error: HeraldError) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Err(error));
        Self { rx }
    }
}

impl Future for PendingReply {
    type Output = Result<Payload, HeraldError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|settled| match settled {
            Ok(outcome) => outcome,
            // The sender lives inside the completion record until one of
            // the two triggers settles it, so this arm is unreachable in
            // practice; treat a vanished sender as an expired request.
            Err(_) => Err(HeraldError::request_timeout("reply channel closed")),
        })
    }
}

/// Opens a pending request on the switchboard: mints a tracking number,
/// attaches the one-shot reply listener *before* the caller publishes (so a
/// same-tick response cannot be missed), and arms the TTL watchdog.
pub(crate) fn open(board: &Arc<Switchboard>, ttl: Duration) -> (TrackingNo, PendingReply) {
    let tracking = TrackingNo::mint();
    let reply_key: Arc<str> = Arc::from(tracking.reply_key());

    let (tx, rx) = oneshot::channel();
    let completion = Completion::new(tx);

    {
        let completion = completion.clone();
        let tracking = tracking.clone();
        board.attach(
            reply_key.clone(),
            Arc::new(move |answer| completion.fulfill(&tracking, answer)),
            Disposition::Once,
        );
    }

    let timer = {
        let board = board.clone();
        let completion = completion.clone();
        let tracking = tracking.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if completion.time_out(&tracking, ttl) {
                board.drop_key(&reply_key);
            }
        })
    };
    completion.arm_timer(timer.abort_handle());

    debug!(%tracking, ttl_ms = ttl.as_millis() as u64, "Request opened");
    (tracking, PendingReply { rx })
}
