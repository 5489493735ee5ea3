//! The `Point` record carried by `"Point"` capsules.
//!
//! The name lives in a fixed 50-byte buffer inside the record, so a point is a
//! plain `Copy` value with no heap allocation of its own.

use std::{fmt, str};

use crate::{
    capsule::Capsule,
    exception::RunResult,
    resource::ResourceTracker,
};

/// Size of the fixed name buffer in a [`Point`], terminator included.
pub const NAME_CAPACITY: usize = 50;

/// Fixed-size, NUL-terminated name buffer.
///
/// At most `N - 1` bytes are kept and the buffer is always terminated. Longer
/// names are truncated silently; the cut never splits a UTF-8 character, and
/// copying stops at an embedded NUL the way a C string copy would.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NameBuf<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> NameBuf<N> {
    #[must_use]
    pub fn new(name: &str) -> Self {
        const { assert!(N > 0, "name buffer needs room for the terminator") };
        let src = name.split('\0').next().unwrap_or_default();
        let mut end = src.len().min(N - 1);
        while !src.is_char_boundary(end) {
            end -= 1;
        }
        let mut bytes = [0; N];
        bytes[..end].copy_from_slice(&src.as_bytes()[..end]);
        Self { bytes }
    }

    /// Length in bytes, excluding the terminator.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.iter().position(|&b| b == 0).unwrap_or(N - 1)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes[0] == 0
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        str::from_utf8(&self.bytes[..self.len()]).unwrap_or_default()
    }
}

impl<const N: usize> fmt::Debug for NameBuf<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

/// Fixed-layout record stored in a `"Point"` capsule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    x: i32,
    y: i32,
    name: NameBuf<NAME_CAPACITY>,
}

impl Point {
    pub const TAG: &'static str = "Point";

    #[must_use]
    pub fn new(x: i32, y: i32, name: &str) -> Self {
        Self {
            x,
            y,
            name: NameBuf::new(name),
        }
    }

    /// Allocates a point through `tracker` and wraps it in a capsule tagged [`Self::TAG`].
    ///
    /// Release it with [`Capsule::release_tracked`] on the same tracker.
    pub fn capsule(x: i32, y: i32, name: &str, tracker: &mut impl ResourceTracker) -> RunResult<Capsule> {
        Capsule::allocate(Self::new(x, y, name), Self::TAG, drop, tracker)
    }

    /// Reads the point out of `capsule`, presenting `expected_tag`.
    pub fn read<'c>(capsule: &'c Capsule, expected_tag: &str) -> RunResult<&'c Self> {
        capsule.get::<Self>(expected_tag)
    }

    #[must_use]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> i32 {
        self.y
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{exception::ErrorKind, resource::NoLimitTracker};

    #[test]
    fn name_truncates_to_capacity_minus_one() {
        let long = "x".repeat(80);
        let buf = NameBuf::<NAME_CAPACITY>::new(&long);
        assert_eq!(buf.len(), NAME_CAPACITY - 1);
        assert_eq!(buf.as_str(), &long[..NAME_CAPACITY - 1]);
    }

    #[test]
    fn name_exactly_at_limit_is_kept() {
        let name = "y".repeat(NAME_CAPACITY - 1);
        assert_eq!(NameBuf::<NAME_CAPACITY>::new(&name).as_str(), name);
    }

    #[test]
    fn truncation_keeps_whole_characters() {
        // four bytes of room, 'é' would straddle the cut
        let buf = NameBuf::<5>::new("abcé");
        assert_eq!(buf.as_str(), "abc");
    }

    #[test]
    fn copy_stops_at_nul() {
        let buf = NameBuf::<8>::new("ab\0cd");
        assert_eq!(buf.as_str(), "ab");
        assert!(NameBuf::<8>::new("").is_empty());
    }

    #[test]
    fn point_capsule_round_trip() {
        let capsule = Point::capsule(3, 4, "origin", &mut NoLimitTracker).unwrap();
        let point = Point::read(&capsule, Point::TAG).unwrap();
        assert_eq!((point.x(), point.y(), point.name()), (3, 4, "origin"));
        let err = Point::read(&capsule, "NotPoint").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }
}
