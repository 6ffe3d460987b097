//! # Events delivered through the bus to the active UI.
//!
//! An [`Event`] is a typed notification: an [`EventType`] discriminator, an optional
//! [`Value`] payload, an optional source label and an optional carried error.
//!
//! ## Identity
//! Two events are equal when their `kind` and `value` are equal. Sequence numbers,
//! timestamps, sources and carried errors do not take part in comparison, so a
//! sentinel can be recognized no matter who published it.
//!
//! ## Exit sentinel
//! [`Event::exit`] builds the documented shutdown request. The event loop forwards it
//! to the active UI and then unsubscribes from the bus; an *interrupt* exit
//! additionally forces an unclean UI teardown.
//!
//! ## Example
//! ```rust
//! use appvisor::{Event, EventType, Value};
//!
//! const PROGRESS: EventType = EventType::from_static("download-progress");
//!
//! let ev = Event::new(PROGRESS)
//!     .with_source("downloader")
//!     .with_value(Value::Number(42));
//!
//! assert_eq!(ev.kind, PROGRESS);
//! assert_eq!(ev.value, Some(Value::Number(42)));
//! assert!(ev.exit_request().is_none());
//!
//! let exit = Event::exit(true);
//! assert_eq!(exit.exit_request().map(|r| r.interrupt), Some(true));
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Event discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventType(Cow<'static, str>);

impl EventType {
    /// The exit sentinel type.
    pub const EXIT: EventType = EventType::from_static("appvisor-exit");

    /// Creates an event type from a static string (usable in `const`).
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Creates an event type from any string.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// The type name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for EventType {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

/// Event payload.
///
/// Scalar variants compare by value. [`Value::Any`] carries an arbitrary shared
/// object and compares by identity (same allocation).
#[derive(Clone)]
pub enum Value {
    /// Boolean payload (e.g. the exit interrupt flag).
    Flag(bool),
    /// Integer payload.
    Number(i64),
    /// Text payload.
    Text(Arc<str>),
    /// Shared opaque payload; see [`Value::downcast_ref`].
    Any(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Wraps an arbitrary object.
    pub fn any<T: Any + Send + Sync>(value: T) -> Self {
        Value::Any(Arc::new(value))
    }

    /// Downcasts an [`Value::Any`] payload.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Any(v) => v.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// The boolean of a [`Value::Flag`].
    #[inline]
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Value::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// The text of a [`Value::Text`].
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(&**s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Flag(a), Value::Flag(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Any(a), Value::Any(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Flag(b) => f.debug_tuple("Flag").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Value::Any(_) => f.write_str("Any(..)"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Flag(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(Arc::from(v))
    }
}

/// Error carried by an event (shared, so events stay cheap to clone).
pub type EventError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Decoded exit sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitRequest {
    /// Skip graceful draining and force an unclean teardown.
    pub interrupt: bool,
}

/// Bus event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - `kind` + `value`: identity (see module docs)
#[derive(Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventType,
    /// Publisher label, if any.
    pub source: Option<Arc<str>>,
    /// Payload, if any.
    pub value: Option<Value>,
    /// Error carried by the event, if any.
    pub error: Option<EventError>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: impl Into<EventType>) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind: kind.into(),
            source: None,
            value: None,
            error: None,
        }
    }

    /// Builds the exit sentinel.
    ///
    /// A graceful exit carries no value; an interrupt carries `Value::Flag(true)`.
    pub fn exit(interrupt: bool) -> Self {
        let ev = Event::new(EventType::EXIT);
        if interrupt {
            ev.with_value(Value::Flag(true))
        } else {
            ev
        }
    }

    /// Attaches a publisher label.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a payload.
    #[inline]
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Attaches an error.
    #[inline]
    pub fn with_error<E>(mut self, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(error));
        self
    }

    /// Returns the exit request if this is the exit sentinel.
    pub fn exit_request(&self) -> Option<ExitRequest> {
        if self.kind != EventType::EXIT {
            return None;
        }
        let interrupt = self
            .value
            .as_ref()
            .and_then(Value::as_flag)
            .unwrap_or(false);
        Some(ExitRequest { interrupt })
    }

    /// True for the exit sentinel, interrupt or not.
    #[inline]
    pub fn is_exit(&self) -> bool {
        self.kind == EventType::EXIT
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.value == other.value
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("seq", &self.seq)
            .field("kind", &self.kind)
            .field("source", &self.source)
            .field("value", &self.value)
            .field("error", &self.error.as_ref().map(|e| e.to_string()))
            .finish()
    }
}
