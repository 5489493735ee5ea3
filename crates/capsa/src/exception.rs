use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Result type alias for operations that can fail with an [`Exception`].
pub type RunResult<T> = Result<T, Exception>;

/// Kinds of failure reported by iterators, capsules and the host boundary.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and `Into<&'static str>` implementations.
/// The string representation matches the variant name exactly (e.g., `TypeMismatch` -> "TypeMismatch").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Bad constructor parameters, e.g. a zero iterator step.
    InvalidArgument,
    /// Arguments did not match the declared call shape.
    ArgumentError,
    /// The resource tracker refused a payload allocation.
    OutOfMemory,
    /// Capsule tag (or payload type) did not match what the caller expected.
    TypeMismatch,
    /// The capsule was read or operated on after its payload was released.
    UseAfterRelease,
    /// `try_release` was called on a capsule that is already released.
    AlreadyReleased,
}

impl ErrorKind {
    /// Builds an exception of this kind with the given message.
    #[must_use]
    pub fn with_msg(self, msg: impl fmt::Display) -> Exception {
        Exception::new(self, msg.to_string())
    }

    pub(crate) fn step_zero() -> Exception {
        Self::InvalidArgument.with_msg("iterator step must not be zero")
    }

    pub(crate) fn tag_mismatch(expected: &str, actual: &str) -> Exception {
        Self::TypeMismatch.with_msg(format_args!(
            "capsule tag mismatch: expected '{expected}', found '{actual}'"
        ))
    }

    pub(crate) fn payload_mismatch(tag: &str) -> Exception {
        Self::TypeMismatch.with_msg(format_args!("capsule '{tag}' holds a payload of a different type"))
    }

    pub(crate) fn expected_capsule() -> Exception {
        Self::TypeMismatch.with_msg("expected a capsule")
    }

    pub(crate) fn expected_iterator() -> Exception {
        Self::TypeMismatch.with_msg("expected an iterator")
    }

    pub(crate) fn not_iterable(type_name: &str) -> Exception {
        Self::TypeMismatch.with_msg(format_args!("'{type_name}' object is not iterable"))
    }

    pub(crate) fn use_after_release(tag: &str) -> Exception {
        Self::UseAfterRelease.with_msg(format_args!("capsule '{tag}' has already been released"))
    }

    pub(crate) fn already_released(tag: &str) -> Exception {
        Self::AlreadyReleased.with_msg(format_args!("capsule '{tag}' was released twice"))
    }

    pub(crate) fn dangling_ref() -> Exception {
        Self::UseAfterRelease.with_msg("object has already been released")
    }

    pub(crate) fn arg_count(name: &str, expected: usize, actual: usize) -> Exception {
        if expected == 1 {
            Self::ArgumentError.with_msg(format_args!("{name}() takes exactly one argument ({actual} given)"))
        } else {
            Self::ArgumentError.with_msg(format_args!(
                "{name}() takes exactly {expected} arguments ({actual} given)"
            ))
        }
    }

    pub(crate) fn arg_count_range(name: &str, min: usize, max: usize, actual: usize) -> Exception {
        Self::ArgumentError.with_msg(format_args!(
            "{name}() takes from {min} to {max} arguments ({actual} given)"
        ))
    }

    pub(crate) fn arg_type(name: &str, position: usize, expected: &str, actual: &str) -> Exception {
        Self::ArgumentError.with_msg(format_args!(
            "{name}() argument {position} must be {expected}, not {actual}"
        ))
    }

    pub(crate) fn arg_overflow(name: &str, position: usize) -> Exception {
        Self::ArgumentError.with_msg(format_args!(
            "{name}() argument {position} does not fit in a 32-bit integer"
        ))
    }

    pub(crate) fn unknown_function(name: &str) -> Exception {
        Self::ArgumentError.with_msg(format_args!("unknown function '{name}'"))
    }
}

/// A failure value: the kind plus a human-readable message.
///
/// Exceptions are plain values returned by the operation that detected the
/// failure. Only the host boundary moves them into an
/// [`ErrorIndicator`](crate::ErrorIndicator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exception {
    kind: ErrorKind,
    message: String,
}

impl Exception {
    #[must_use]
    pub fn new(kind: ErrorKind, message: String) -> Self {
        Self { kind, message }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if this exception is of the given kind.
    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Exception {}
