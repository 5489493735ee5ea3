//! Tag-guarded opaque handles.
//!
//! A [`Capsule`] owns a payload of any `'static` type together with a release
//! callback and a static tag. Reads must present the matching tag and the
//! matching payload type; anything else is a `TypeMismatch`, so payload bytes
//! can never be misinterpreted.
//!
//! Release is single-shot. [`Capsule::release`] runs the callback the first
//! time and is a no-op afterwards; dropping an unreleased capsule releases it.
//! The callback is not required to be `Send`, so a capsule stays on the
//! thread that created it.

use std::{any::Any, fmt, mem};

use crate::{
    exception::{ErrorKind, RunResult},
    resource::ResourceTracker,
};

type ReleaseFn = Box<dyn FnOnce(Box<dyn Any>)>;

struct Payload {
    data: Box<dyn Any>,
    release: ReleaseFn,
}

/// Owning opaque handle: tag + payload + release callback.
pub struct Capsule {
    tag: &'static str,
    /// `None` once released.
    payload: Option<Payload>,
    /// Size reported to the resource tracker at allocation time.
    size: usize,
}

impl Capsule {
    /// Wraps `payload` without consulting a resource tracker.
    ///
    /// `release` receives the payload by value exactly once, either from
    /// [`Self::release`] or when the capsule is dropped.
    pub fn new<T: 'static>(payload: T, tag: &'static str, release: impl FnOnce(T) + 'static) -> Self {
        let release: ReleaseFn = Box::new(move |data: Box<dyn Any>| {
            if let Ok(payload) = data.downcast::<T>() {
                release(*payload);
            }
        });
        Self {
            tag,
            payload: Some(Payload {
                data: Box::new(payload),
                release,
            }),
            size: mem::size_of::<T>(),
        }
    }

    /// Like [`Self::new`], but asks `tracker` for the payload's storage first.
    ///
    /// A refused allocation is reported as `OutOfMemory` and `release` is never called.
    /// Release through [`Self::release_tracked`] with the same tracker to give
    /// the bytes back; a plain [`Self::release`] or drop leaves them charged.
    pub fn allocate<T: 'static>(
        payload: T,
        tag: &'static str,
        release: impl FnOnce(T) + 'static,
        tracker: &mut impl ResourceTracker,
    ) -> RunResult<Self> {
        tracker.on_allocate(mem::size_of::<T>)?;
        Ok(Self::new(payload, tag, release))
    }

    #[must_use]
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.payload.is_none()
    }

    /// Approximate payload size in bytes, as accounted at allocation.
    #[must_use]
    pub fn payload_size(&self) -> usize {
        self.size
    }

    /// Borrows the payload.
    ///
    /// Fails with `UseAfterRelease` once released, and with `TypeMismatch`
    /// when `expected_tag` differs from the capsule's tag or the payload is
    /// not a `T`. A failed read leaves the capsule untouched.
    pub fn get<T: 'static>(&self, expected_tag: &str) -> RunResult<&T> {
        let Some(payload) = &self.payload else {
            return Err(ErrorKind::use_after_release(self.tag));
        };
        if expected_tag != self.tag {
            return Err(ErrorKind::tag_mismatch(expected_tag, self.tag));
        }
        payload
            .data
            .downcast_ref::<T>()
            .ok_or_else(|| ErrorKind::payload_mismatch(self.tag))
    }

    /// Runs the release callback if it has not run yet.
    ///
    /// Returns `true` if this call released the payload, `false` if it was
    /// already released.
    pub fn release(&mut self) -> bool {
        match self.payload.take() {
            Some(Payload { data, release }) => {
                release(data);
                true
            }
            None => false,
        }
    }

    /// Releases a capsule created by [`Self::allocate`], returning its bytes to `tracker`.
    ///
    /// Only the call that runs the callback reports `on_free`.
    pub fn release_tracked(&mut self, tracker: &mut impl ResourceTracker) -> bool {
        let released = self.release();
        if released {
            tracker.on_free(|| self.size);
        }
        released
    }

    /// Strict form of [`Self::release`]: a second release is `AlreadyReleased`.
    pub fn try_release(&mut self) -> RunResult<()> {
        if self.release() {
            Ok(())
        } else {
            Err(ErrorKind::already_released(self.tag))
        }
    }
}

impl Drop for Capsule {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Capsule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capsule")
            .field("tag", &self.tag)
            .field("released", &self.is_released())
            .field("size", &self.size)
            .finish()
    }
}
