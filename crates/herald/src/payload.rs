use crate::topic::Topic;
use crate::tracking::TrackingNo;
use std::fmt;
use std::sync::Arc;

/// A value carried across the bus.
///
/// The primitive variants (`Bool`, `Int`, `Float`, `Text`, `Token`) are the
/// only legal match values for `listen_for`; `Json` is the escape hatch for
/// arbitrary structured data, and `Request` is the envelope the correlator
/// publishes on behalf of `request`.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(Arc<str>),
    Token(Topic),
    Json(Arc<serde_json::Value>),
    Request(Arc<Envelope>),
}

impl Payload {
    /// Convenience constructor for text payloads.
    #[must_use]
    pub fn text(value: impl AsRef<str>) -> Self {
        Self::Text(Arc::from(value.as_ref()))
    }

    /// Whether this payload is a primitive value in the `listen_for` sense.
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Text(_) | Self::Token(_)
        )
    }

    /// The request envelope, if this payload carries one.
    #[must_use]
    pub fn as_request(&self) -> Option<&Envelope> {
        match self {
            Self::Request(envelope) => Some(envelope),
            _ => None,
        }
    }

    /// The text content, if this payload is `Text`.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Token(v) => write!(f, "{v}"),
            Self::Json(v) => write!(f, "{v}"),
            Self::Request(v) => write!(f, "request {}", v.tracking),
        }
    }
}

impl From<bool> for Payload {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Payload {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Payload {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Payload {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Self::Text(Arc::from(value))
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Self::Text(Arc::from(value))
    }
}

impl From<Topic> for Payload {
    fn from(value: Topic) -> Self {
        Self::Token(value)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(Arc::new(value))
    }
}

/// The payload a `request` publishes on its topic: the correlation id plus
/// the caller's query. Responders answer with
/// `respond(&envelope.tracking, answer)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub tracking: TrackingNo,
    pub query: Payload,
}
