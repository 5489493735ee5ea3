//! Lifecycle tracing for iterators and capsules.
//!
//! Provides a trait-based tracing system with zero-cost abstraction. When using
//! [`NoopTracer`], every hook compiles away through monomorphization, the same way
//! [`NoLimitTracker`](crate::NoLimitTracker) removes allocation accounting.
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Zero-cost no-op (default) |
//! | [`StderrTracer`] | Human-readable lifecycle log to stderr |
//! | [`RecordingTracer`] | Full event recording for tests or post-mortem |
//!
//! A [`Session`](crate::Session) carries its tracer as a type parameter:
//!
//! ```
//! use capsa::{NoLimitTracker, Object, RecordingTracer, Session};
//!
//! let mut session = Session::new(NoLimitTracker, RecordingTracer::new());
//! let it = session.range_iterator(0, 2, None).unwrap();
//! assert_eq!(session.iterate(&it).unwrap(), vec![Object::Int(0), Object::Int(1)]);
//! assert!(!session.tracer().events().is_empty());
//! ```

use crate::exception::ErrorKind;

/// Trace event captured by [`RecordingTracer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// An iterator was constructed.
    IterCreate { start: i64, stop: i64, step: i64 },
    /// An iterator observed its bound and became exhausted.
    IterExhausted {
        /// Number of values yielded before exhaustion.
        yielded: u64,
    },
    /// A capsule was created with the given tag.
    CapsuleCreate { tag: &'static str },
    /// A capsule read was attempted.
    CapsuleRead { tag: &'static str, ok: bool },
    /// A capsule payload was released and its callback run.
    CapsuleRelease { tag: &'static str },
    /// The host boundary stored an error in its indicator.
    ErrorSet { kind: ErrorKind },
}

/// Trait for lifecycle tracing.
///
/// All methods have default no-op implementations, so implementations only
/// override the hooks they care about.
pub trait LifecycleTracer: std::fmt::Debug {
    #[inline(always)]
    fn on_iter_create(&mut self, _start: i64, _stop: i64, _step: i64) {}

    #[inline(always)]
    fn on_iter_exhausted(&mut self, _yielded: u64) {}

    #[inline(always)]
    fn on_capsule_create(&mut self, _tag: &'static str) {}

    #[inline(always)]
    fn on_capsule_read(&mut self, _tag: &'static str, _ok: bool) {}

    #[inline(always)]
    fn on_capsule_release(&mut self, _tag: &'static str) {}

    #[inline(always)]
    fn on_error_set(&mut self, _kind: ErrorKind, _message: &str) {}
}

// ============================================================================
// NoopTracer
// ============================================================================

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl LifecycleTracer for NoopTracer {}

// ============================================================================
// StderrTracer
// ============================================================================

/// Tracer that prints a human-readable lifecycle log to stderr.
///
/// Output format:
/// ```text
/// [iter]    create start=0 stop=10 step=2
/// [iter]    exhausted after 5 values
/// [capsule] create tag=Point
/// [error]   TypeMismatch: expected a capsule
/// ```
#[derive(Debug, Default)]
pub struct StderrTracer {
    /// Maximum number of lines to print (`None` = unlimited).
    limit: Option<usize>,
    count: usize,
    stopped: bool,
}

impl StderrTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracer that stops printing after `limit` lines.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    fn emit(&mut self, line: std::fmt::Arguments<'_>) {
        if self.stopped {
            return;
        }
        eprintln!("{line}");
        self.count += 1;
        if let Some(limit) = self.limit
            && self.count >= limit
        {
            eprintln!("--- trace limit reached ({limit} lines) ---");
            self.stopped = true;
        }
    }
}

impl LifecycleTracer for StderrTracer {
    fn on_iter_create(&mut self, start: i64, stop: i64, step: i64) {
        self.emit(format_args!("[iter]    create start={start} stop={stop} step={step}"));
    }

    fn on_iter_exhausted(&mut self, yielded: u64) {
        self.emit(format_args!("[iter]    exhausted after {yielded} values"));
    }

    fn on_capsule_create(&mut self, tag: &'static str) {
        self.emit(format_args!("[capsule] create tag={tag}"));
    }

    fn on_capsule_read(&mut self, tag: &'static str, ok: bool) {
        if !ok {
            self.emit(format_args!("[capsule] rejected read tag={tag}"));
        }
    }

    fn on_capsule_release(&mut self, tag: &'static str) {
        self.emit(format_args!("[capsule] release tag={tag}"));
    }

    fn on_error_set(&mut self, kind: ErrorKind, message: &str) {
        self.emit(format_args!("[error]   {kind}: {message}"));
    }
}

// ============================================================================
// RecordingTracer
// ============================================================================

/// Tracer that records every event in order.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<TraceEvent>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Takes the recorded events, leaving the tracer empty.
    pub fn take_events(&mut self) -> Vec<TraceEvent> {
        std::mem::take(&mut self.events)
    }

    /// Counts release events for `tag`.
    #[must_use]
    pub fn release_count(&self, tag: &str) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, TraceEvent::CapsuleRelease { tag: t } if *t == tag))
            .count()
    }
}

impl LifecycleTracer for RecordingTracer {
    fn on_iter_create(&mut self, start: i64, stop: i64, step: i64) {
        self.events.push(TraceEvent::IterCreate { start, stop, step });
    }

    fn on_iter_exhausted(&mut self, yielded: u64) {
        self.events.push(TraceEvent::IterExhausted { yielded });
    }

    fn on_capsule_create(&mut self, tag: &'static str) {
        self.events.push(TraceEvent::CapsuleCreate { tag });
    }

    fn on_capsule_read(&mut self, tag: &'static str, ok: bool) {
        self.events.push(TraceEvent::CapsuleRead { tag, ok });
    }

    fn on_capsule_release(&mut self, tag: &'static str) {
        self.events.push(TraceEvent::CapsuleRelease { tag });
    }

    fn on_error_set(&mut self, kind: ErrorKind, _message: &str) {
        self.events.push(TraceEvent::ErrorSet { kind });
    }
}
