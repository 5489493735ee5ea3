use crate::exception::{ErrorKind, Exception};

/// The host's "current error" slot.
///
/// Owned by a [`Session`](crate::Session) rather than being process-wide. A
/// failing boundary call stores its exception here and returns no value;
/// callers inspect, match, fetch or clear it. Setting a new error replaces the
/// previous one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ErrorIndicator {
    current: Option<Exception>,
}

impl ErrorIndicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, exc: Exception) {
        self.current = Some(exc);
    }

    /// Kind of the pending error, if any.
    #[must_use]
    pub fn occurred(&self) -> Option<ErrorKind> {
        self.current.as_ref().map(Exception::kind)
    }

    /// Returns `true` if an error of `kind` is pending.
    #[must_use]
    pub fn matches(&self, kind: ErrorKind) -> bool {
        self.occurred() == Some(kind)
    }

    #[must_use]
    pub fn peek(&self) -> Option<&Exception> {
        self.current.as_ref()
    }

    /// Takes the pending error, leaving the indicator clear.
    pub fn fetch(&mut self) -> Option<Exception> {
        self.current.take()
    }

    /// Puts back an error previously taken with [`Self::fetch`].
    pub fn restore(&mut self, exc: Option<Exception>) {
        self.current = exc;
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
