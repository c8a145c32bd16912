use crate::correlate::{self, PendingReply};
use crate::error::{HeraldError, HeraldErrorExt};
use crate::payload::{Envelope, Payload};
use crate::registry::TopicRegistry;
use crate::switchboard::{Disposition, Switchboard};
use crate::topic::{Topic, Topics};
use crate::tracking::TrackingNo;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

/// Default wait window for a request before it is treated as failed.
pub const DEFAULT_REQUEST_TTL: Duration = Duration::from_millis(4200);

#[derive(Debug)]
struct HeraldInner {
    registry: TopicRegistry,
    board: Arc<Switchboard>,
    request_ttl_ms: AtomicU64,
}

/// The topic-locked publish/subscribe bus.
///
/// Topics form a closed, monotonically growing set; every operation takes
/// an opaque [`Topic`] token obtained from [`Herald::topics`] rather than a
/// raw string, so unregistered channels cannot be addressed at all. On top
/// of the one-way broadcast surface sits a correlated request/response
/// layer ([`Herald::request`] / [`Herald::respond`]).
///
/// The handle is cheap to clone; clones share all state. Delivery and
/// timers are scheduled on the ambient tokio runtime.
///
/// # Example
///
/// ```rust
/// use herald::Herald;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), herald::HeraldError> {
/// let bus = Herald::new();
/// let topics = bus.add_topic("ORDERS")?;
/// let orders = topics.get("ORDERS").unwrap();
///
/// bus.listen(&orders, |payload| drop(payload))?;
/// let scheduled = bus.say(&orders, "first")?;
/// assert_eq!(scheduled, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Herald {
    inner: Arc<HeraldInner>,
}

impl Default for Herald {
    fn default() -> Self {
        Self::new()
    }
}

impl Herald {
    /// Creates an empty bus with the default request TTL.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HeraldInner {
                registry: TopicRegistry::new(),
                board: Arc::new(Switchboard::new()),
                request_ttl_ms: AtomicU64::new(DEFAULT_REQUEST_TTL.as_millis() as u64),
            }),
        }
    }

    /// Starts configuring a bus with initial topics and a custom TTL.
    #[must_use]
    pub fn builder() -> HeraldBuilder {
        HeraldBuilder::default()
    }

    /// Read-only snapshot of the registered topics.
    ///
    /// The snapshot is frozen at the moment of the call; topics added later
    /// appear only in snapshots taken after the growth.
    #[must_use]
    pub fn topics(&self) -> Topics {
        self.inner.registry.snapshot()
    }

    /// Registers a single topic name. See [`Herald::add_topics`].
    ///
    /// # Errors
    /// Returns [`HeraldError::InvalidArgument`] if the name is blank.
    pub fn add_topic(&self, name: impl AsRef<str>) -> Result<Topics, HeraldError> {
        self.add_topics([name])
    }

    /// Registers a sequence of topic names, normalising each to upper case.
    ///
    /// Names already present are silently skipped; adding the same name any
    /// number of times yields one registry entry with an unchanged token.
    /// Returns the snapshot in force after the call.
    ///
    /// # Errors
    /// Returns [`HeraldError::InvalidArgument`] if any name is blank.
    pub fn add_topics<I, S>(&self, names: I) -> Result<Topics, HeraldError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.inner.registry.add(names)
    }

    /// Registers a persistent listener on `topic`.
    ///
    /// # Errors
    /// Returns [`HeraldError::InvalidTopic`] if the token does not resolve.
    pub fn listen(
        &self,
        topic: &Topic,
        callback: impl Fn(Payload) + Send + Sync + 'static,
    ) -> Result<(), HeraldError> {
        let name = self.resolved(topic).context("listen")?;
        self.inner.board.attach(name, Arc::new(callback), Disposition::Persistent);
        Ok(())
    }

    /// Registers a listener disposed after its first invocation, regardless
    /// of payload.
    ///
    /// # Errors
    /// Returns [`HeraldError::InvalidTopic`] if the token does not resolve.
    pub fn listen_once(
        &self,
        topic: &Topic,
        callback: impl Fn(Payload) + Send + Sync + 'static,
    ) -> Result<(), HeraldError> {
        let name = self.resolved(topic).context("listen_once")?;
        self.inner.board.attach(name, Arc::new(callback), Disposition::Once);
        Ok(())
    }

    /// Registers a listener invoked only when a published payload equals
    /// `value`, and disposed immediately after that first match.
    ///
    /// # Errors
    /// Returns [`HeraldError::InvalidTopic`] if the token does not resolve,
    /// or [`HeraldError::InvalidArgument`] if `value` is not a primitive
    /// (bool, number, text, or topic token).
    pub fn listen_for(
        &self,
        topic: &Topic,
        value: impl Into<Payload>,
        callback: impl Fn(Payload) + Send + Sync + 'static,
    ) -> Result<(), HeraldError> {
        let name = self.resolved(topic).context("listen_for")?;
        let value = value.into();
        if !value.is_primitive() {
            return Err(HeraldError::invalid_argument(
                "listen_for match value must be a primitive",
            ));
        }
        self.inner.board.attach(name, Arc::new(callback), Disposition::UntilValue(value));
        Ok(())
    }

    /// Delivers `payload` to every listener currently registered on
    /// `topic`, returning the number of deliveries scheduled.
    ///
    /// Non-blocking: deliveries run as independently scheduled tasks after
    /// this call returns, in no particular order. Listeners registered
    /// after the call never observe this payload.
    ///
    /// # Errors
    /// Returns [`HeraldError::InvalidTopic`] if the token does not resolve.
    pub fn say(&self, topic: &Topic, payload: impl Into<Payload>) -> Result<usize, HeraldError> {
        let name = self.resolved(topic).context("say")?;
        Ok(self.inner.board.emit(&name, &payload.into()))
    }

    /// Removes every listener registered on `topic`, returning how many
    /// were dropped. Deliveries already scheduled still run.
    ///
    /// # Errors
    /// Returns [`HeraldError::InvalidTopic`] if the token does not resolve.
    pub fn cancel(&self, topic: &Topic) -> Result<usize, HeraldError> {
        let name = self.resolved(topic).context("cancel")?;
        let dropped = self.inner.board.drop_key(&name);
        debug!(topic = %name, dropped, "Topic listeners cancelled");
        Ok(dropped)
    }

    /// Removes every listener for every topic, including internal reply
    /// listeners; requests still pending then settle through their timers.
    pub fn cancel_all(&self) -> usize {
        let dropped = self.inner.board.clear();
        debug!(dropped, "All listeners cancelled");
        dropped
    }

    /// Issues a correlated request on `topic` and returns the future reply.
    ///
    /// The returned [`PendingReply`] resolves with whatever answer a
    /// matching [`Herald::respond`] supplies, or rejects with
    /// [`HeraldError::RequestTimeout`] once the current TTL elapses,
    /// and exactly one of the two. A topic-validation failure also surfaces
    /// through the future, keeping the asynchronous contract uniform.
    ///
    /// # Example
    ///
    /// ```rust
    /// use herald::Herald;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), herald::HeraldError> {
    /// let bus = Herald::new();
    /// let greeter = bus.add_topic("GREETER")?.get("GREETER").unwrap();
    ///
    /// let responder = bus.clone();
    /// bus.listen_once(&greeter, move |payload| {
    ///     if let Some(request) = payload.as_request() {
    ///         responder.respond(&request.tracking, "world");
    ///     }
    /// })?;
    ///
    /// let answer = bus.request(&greeter, "hello").await?;
    /// assert_eq!(answer.as_text(), Some("world"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn request(&self, topic: &Topic, query: impl Into<Payload>) -> PendingReply {
        let name = match self.resolved(topic).context("request") {
            Ok(name) => name,
            Err(error) => return PendingReply::rejected(error),
        };
        let (tracking, reply) = correlate::open(&self.inner.board, self.request_ttl());
        let envelope =
            Payload::Request(Arc::new(Envelope { tracking: tracking.clone(), query: query.into() }));
        let scheduled = self.inner.board.emit(&name, &envelope);
        trace!(topic = %name, %tracking, scheduled, "Request published");
        reply
    }

    /// Delivers `answer` to the request identified by `tracking`.
    ///
    /// A response for an unknown or already-settled tracking number is a
    /// safe no-op; the responder never needs to know whether a timeout
    /// already occurred.
    pub fn respond(&self, tracking: &TrackingNo, answer: impl Into<Payload>) {
        let delivered = self.inner.board.emit(&tracking.reply_key(), &answer.into());
        trace!(%tracking, delivered, "Response emitted");
    }

    /// The wait window applied to subsequently issued requests.
    #[must_use]
    pub fn request_ttl(&self) -> Duration {
        Duration::from_millis(self.inner.request_ttl_ms.load(Ordering::Relaxed))
    }

    /// Changes the wait window for subsequently issued requests only;
    /// already-armed timers keep the TTL they were created with.
    ///
    /// # Errors
    /// Returns [`HeraldError::InvalidArgument`] for a zero duration.
    pub fn set_request_ttl(&self, ttl: Duration) -> Result<(), HeraldError> {
        if ttl.is_zero() {
            return Err(HeraldError::invalid_argument("request TTL must be non-zero"));
        }
        self.inner.request_ttl_ms.store(ttl.as_millis() as u64, Ordering::Relaxed);
        Ok(())
    }

    /// Number of listeners currently registered on `topic`.
    ///
    /// # Errors
    /// Returns [`HeraldError::InvalidTopic`] if the token does not resolve.
    pub fn listeners(&self, topic: &Topic) -> Result<usize, HeraldError> {
        let name = self.resolved(topic).context("listeners")?;
        Ok(self.inner.board.listeners(&name))
    }

    fn resolved(&self, topic: &Topic) -> Result<Arc<str>, HeraldError> {
        self.inner.registry.resolve(topic).ok_or_else(|| {
            HeraldError::invalid_topic(format!("token for {} is not registered here", topic.name()))
        })
    }
}

/// Builder for a pre-seeded [`Herald`].
///
/// ```rust
/// use herald::Herald;
/// use std::time::Duration;
///
/// # fn main() -> Result<(), herald::HeraldError> {
/// let bus = Herald::builder()
///     .topics(["ORDERS", "SHIPMENTS"])
///     .request_ttl(Duration::from_millis(250))
///     .build()?;
/// assert_eq!(bus.topics().len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct HeraldBuilder {
    topics: Vec<String>,
    request_ttl: Option<Duration>,
}

impl HeraldBuilder {
    /// Adds a topic name to register at build time.
    #[must_use]
    pub fn topic(mut self, name: impl Into<String>) -> Self {
        self.topics.push(name.into());
        self
    }

    /// Adds several topic names to register at build time.
    #[must_use]
    pub fn topics<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics.extend(names.into_iter().map(Into::into));
        self
    }

    /// Overrides the default request TTL.
    #[must_use]
    pub const fn request_ttl(mut self, ttl: Duration) -> Self {
        self.request_ttl = Some(ttl);
        self
    }

    /// Builds the bus, registering the configured topics.
    ///
    /// # Errors
    /// Returns [`HeraldError::InvalidArgument`] for a blank topic name or a
    /// zero TTL.
    pub fn build(self) -> Result<Herald, HeraldError> {
        let bus = Herald::new();
        if let Some(ttl) = self.request_ttl {
            bus.set_request_ttl(ttl)?;
        }
        if !self.topics.is_empty() {
            bus.add_topics(&self.topics)?;
        }
        Ok(bus)
    }
}
