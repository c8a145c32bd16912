//! # Herald
//!
//! An in-process publish/subscribe bus restricted to a closed, extensible
//! set of named topics, with a correlated request/response layer on top.
//!
//! ## Overview
//!
//! Topics are addressed through opaque [`Topic`] tokens handed out by the
//! bus itself, never through raw strings, so a channel that was not
//! registered cannot be spoken to or listened on. The broadcast surface
//! (`listen`, `listen_once`, `listen_for`, `say`, `cancel`) is one-way;
//! [`Herald::request`] and [`Herald::respond`] turn it into a correlated,
//! timeout-bounded two-way exchange.
//!
//! ## Features
//!
//! * **Unforgeable topics**: tokens compare by identity, not by name.
//! * **Stable snapshots**: [`Topics`] is copy-on-write; registry growth
//!   never invalidates tokens or snapshots already handed out.
//! * **One-shot semantics decided synchronously**: `listen_once` and
//!   `listen_for` entries cannot fire twice, even under back-to-back
//!   publishes.
//! * **Single-winner requests**: each request settles exactly once, by
//!   response or by TTL watchdog.
//! * **Async ready**: built on `tokio`; `say` and `request` schedule work
//!   and return immediately.
//!
//! # Example
//!
//! ```rust
//! use herald::Herald;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), herald::HeraldError> {
//!     let bus = Herald::new();
//!     let test = bus.add_topic("TEST")?.get("TEST").unwrap();
//!
//!     let responder = bus.clone();
//!     bus.listen_once(&test, move |payload| {
//!         if let Some(request) = payload.as_request() {
//!             responder.respond(&request.tracking, "world");
//!         }
//!     })?;
//!
//!     let answer = bus.request(&test, "hello").await?;
//!     assert_eq!(answer.as_text(), Some("world"));
//!     Ok(())
//! }
//! ```

mod bus;
mod correlate;
mod error;
mod payload;
mod registry;
mod switchboard;
mod topic;
mod tracking;

pub use bus::{DEFAULT_REQUEST_TTL, Herald, HeraldBuilder};
pub use correlate::PendingReply;
pub use error::{HeraldError, HeraldErrorExt};
pub use payload::{Envelope, Payload};
pub use topic::{Topic, Topics};
pub use tracking::TrackingNo;
