//! Pull-based iteration: the bounded stepped iterator and the drain helper.
//!
//! [`StepIter`] is a pure value type holding `current`, `stop` and `step`. Each
//! call to [`StepIter::advance`] returns the value before advancing, or
//! [`Pull::End`] once the bound has been crossed in the direction of `step`.
//! The two lifecycle states are explicit in [`IterState`]; once `Exhausted`,
//! an iterator never becomes `Active` again.
//!
//! Anything implementing [`PullIter`] can be collected with [`drain`], which is
//! fail-fast: an error mid-iteration discards the values collected so far.
//!
//! ## Snapshots
//!
//! Iterator state is plain data, so [`StepIter::dump`] and [`StepIter::load`]
//! round-trip it through postcard and the loaded iterator continues from the
//! exact position where it was dumped.

use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};

use crate::exception::{ErrorKind, RunResult};

/// Result of a single pull: a value, or the end-of-sequence signal.
///
/// `End` is a normal terminal value, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull<T> {
    Value(T),
    End,
}

impl<T> Pull<T> {
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::End => None,
        }
    }
}

impl<T> From<Option<T>> for Pull<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::End, Self::Value)
    }
}

/// The pull protocol: produce the next item, the end signal, or an error.
pub trait PullIter {
    type Item;

    fn pull(&mut self) -> RunResult<Pull<Self::Item>>;
}

impl<I: PullIter + ?Sized> PullIter for &mut I {
    type Item = I::Item;

    fn pull(&mut self) -> RunResult<Pull<Self::Item>> {
        (**self).pull()
    }
}

/// Lifecycle state of a [`StepIter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IterState {
    Active,
    Exhausted,
}

/// Finite integer sequence `start, start + step, …` bounded by an exclusive `stop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepIter {
    /// Next value to emit.
    current: i64,
    /// Exclusive bound: upper when `step > 0`, lower when `step < 0`.
    stop: i64,
    /// Non-zero increment.
    step: i64,
    state: IterState,
    /// Number of values emitted so far.
    yielded: u64,
}

impl StepIter {
    pub const DEFAULT_STEP: i64 = 1;

    /// Creates an iterator positioned at `start`.
    ///
    /// `step` defaults to [`Self::DEFAULT_STEP`]; a zero step is rejected with
    /// `InvalidArgument` since it would never reach `stop`.
    pub fn new(start: i64, stop: i64, step: Option<i64>) -> RunResult<Self> {
        let step = step.unwrap_or(Self::DEFAULT_STEP);
        if step == 0 {
            return Err(ErrorKind::step_zero());
        }
        Ok(Self {
            current: start,
            stop,
            step,
            state: IterState::Active,
            yielded: 0,
        })
    }

    #[must_use]
    pub fn state(&self) -> IterState {
        self.state
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.state == IterState::Exhausted
    }

    #[must_use]
    pub fn step(&self) -> i64 {
        self.step
    }

    #[must_use]
    pub fn stop(&self) -> i64 {
        self.stop
    }

    #[must_use]
    pub fn yielded(&self) -> u64 {
        self.yielded
    }

    fn in_bounds(&self) -> bool {
        if self.step > 0 {
            self.current < self.stop
        } else {
            self.current > self.stop
        }
    }

    /// Pulls the next value.
    ///
    /// The first pull that observes the bound crossed moves the iterator to
    /// `Exhausted`; every pull after that returns `End` as well.
    pub fn advance(&mut self) -> Pull<i64> {
        if self.state == IterState::Exhausted {
            return Pull::End;
        }
        if !self.in_bounds() {
            self.state = IterState::Exhausted;
            return Pull::End;
        }
        let value = self.current;
        // an overflowing advance lands on `stop`, which is out of bounds either way
        self.current = value.checked_add(self.step).unwrap_or(self.stop);
        self.yielded += 1;
        Pull::Value(value)
    }

    /// Number of values still to be emitted.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        if self.state == IterState::Exhausted || !self.in_bounds() {
            return 0;
        }
        let span = (i128::from(self.stop) - i128::from(self.current)).unsigned_abs();
        let step = i128::from(self.step).unsigned_abs();
        u64::try_from(span.div_ceil(step)).unwrap_or(u64::MAX)
    }

    /// Serializes the iterator's full state with postcard.
    pub fn dump(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Restores an iterator from [`Self::dump`] output.
    pub fn load(bytes: &[u8]) -> RunResult<Self> {
        let iter: Self = postcard::from_bytes(bytes)
            .map_err(|err| ErrorKind::InvalidArgument.with_msg(format_args!("invalid iterator snapshot: {err}")))?;
        if iter.step == 0 {
            return Err(ErrorKind::step_zero());
        }
        Ok(iter)
    }
}

impl PullIter for StepIter {
    type Item = i64;

    fn pull(&mut self) -> RunResult<Pull<i64>> {
        Ok(self.advance())
    }
}

impl Iterator for StepIter {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        self.advance().into_option()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining()) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl FusedIterator for StepIter {}

/// Adapts an infallible Rust iterator to the pull protocol.
#[derive(Debug, Clone)]
pub struct SeqIter<I>(I);

impl<I: Iterator> PullIter for SeqIter<I> {
    type Item = I::Item;

    fn pull(&mut self) -> RunResult<Pull<I::Item>> {
        Ok(self.0.next().into())
    }
}

/// Adapts a Rust iterator of results; the first `Err` is surfaced by [`PullIter::pull`].
#[derive(Debug, Clone)]
pub struct TryIter<I>(I);

impl<T, I: Iterator<Item = RunResult<T>>> PullIter for TryIter<I> {
    type Item = T;

    fn pull(&mut self) -> RunResult<Pull<T>> {
        self.0.next().transpose().map(Pull::from)
    }
}

pub fn from_iter<I: IntoIterator>(iter: I) -> SeqIter<I::IntoIter> {
    SeqIter(iter.into_iter())
}

pub fn from_results<T, I: IntoIterator<Item = RunResult<T>>>(iter: I) -> TryIter<I::IntoIter> {
    TryIter(iter.into_iter())
}

/// Pulls from `seq` until `End`, collecting every value in order.
///
/// Fail-fast: if any pull errors, the values collected so far are dropped and
/// the error is returned.
pub fn drain<I: PullIter>(mut seq: I) -> RunResult<Vec<I::Item>> {
    let mut out = Vec::new();
    loop {
        match seq.pull()? {
            Pull::Value(value) => out.push(value),
            Pull::End => return Ok(out),
        }
    }
}
