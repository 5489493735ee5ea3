//! Behaviour of `StepIter` and `drain` through the public API.

use capsa::{ErrorKind, IterState, Pull, PullIter, RunResult, StepIter, drain};
use pretty_assertions::assert_eq;

// =============================================================================
// 1. Unit step
// =============================================================================

/// `drain(start..stop)` yields every integer in the half-open range.
#[test]
fn unit_step_yields_half_open_range() {
    for (start, stop) in [(0, 5), (-3, 2), (7, 8), (100, 103)] {
        let expected: Vec<i64> = (start..stop).collect();
        assert_eq!(drain(StepIter::new(start, stop, None).unwrap()).unwrap(), expected);
    }
}

/// `start >= stop` with a positive step is empty from the first pull.
#[test]
fn empty_when_start_not_below_stop() {
    assert_eq!(drain(StepIter::new(0, 0, None).unwrap()).unwrap(), Vec::<i64>::new());
    assert_eq!(drain(StepIter::new(5, 1, Some(1)).unwrap()).unwrap(), Vec::<i64>::new());
}

#[test]
fn large_range_has_expected_ends() {
    let values = drain(StepIter::new(0, 10_000, Some(1)).unwrap()).unwrap();
    assert_eq!(values.len(), 10_000);
    assert_eq!(values.first(), Some(&0));
    assert_eq!(values.last(), Some(&9_999));
}

// =============================================================================
// 2. Other steps
// =============================================================================

#[test]
fn positive_step_skips() {
    assert_eq!(drain(StepIter::new(0, 10, Some(2)).unwrap()).unwrap(), vec![0, 2, 4, 6, 8]);
    assert_eq!(drain(StepIter::new(0, 10, Some(3)).unwrap()).unwrap(), vec![0, 3, 6, 9]);
}

/// Negative steps count down and exclude values at or below `stop`.
#[test]
fn negative_step_counts_down() {
    assert_eq!(drain(StepIter::new(10, 0, Some(-2)).unwrap()).unwrap(), vec![10, 8, 6, 4, 2]);
    assert_eq!(drain(StepIter::new(3, -1, Some(-1)).unwrap()).unwrap(), vec![3, 2, 1, 0]);
    assert_eq!(drain(StepIter::new(0, 5, Some(-1)).unwrap()).unwrap(), Vec::<i64>::new());
}

#[test]
fn zero_step_is_rejected() {
    let err = StepIter::new(0, 5, Some(0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

// =============================================================================
// 3. Terminal state
// =============================================================================

/// Once `End` is returned, it keeps being returned.
#[test]
fn end_is_idempotent() {
    let mut iter = StepIter::new(0, 3, None).unwrap();
    assert_eq!(iter.stop(), 3);
    assert_eq!(iter.advance(), Pull::Value(0));
    assert_eq!(iter.advance(), Pull::Value(1));
    assert!(!iter.advance().is_end());
    for _ in 0..4 {
        assert!(iter.advance().is_end());
        assert_eq!(iter.state(), IterState::Exhausted);
    }
}

/// A drained iterator is not rewound by draining again.
#[test]
fn exhausted_iterator_drains_empty() {
    let mut iter = StepIter::new(0, 3, None).unwrap();
    assert_eq!(drain(&mut iter).unwrap(), vec![0, 1, 2]);
    assert_eq!(drain(&mut iter).unwrap(), Vec::<i64>::new());
    assert_eq!(iter.yielded(), 3);
}

// =============================================================================
// 4. Custom pull sources
// =============================================================================

/// A source that fails after a fixed number of values.
struct FailsAfter {
    remaining: u32,
}

impl PullIter for FailsAfter {
    type Item = u32;

    fn pull(&mut self) -> RunResult<Pull<u32>> {
        if self.remaining == 0 {
            return Err(ErrorKind::InvalidArgument.with_msg("source broke"));
        }
        self.remaining -= 1;
        Ok(Pull::Value(self.remaining))
    }
}

/// Drain surfaces the error rather than the values collected before it.
#[test]
fn drain_is_fail_fast() {
    let err = drain(FailsAfter { remaining: 3 }).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.message(), "source broke");
}

#[test]
fn snapshot_continues_where_dumped() {
    let mut iter = StepIter::new(20, 0, Some(-5)).unwrap();
    iter.advance();
    iter.advance();
    let restored = StepIter::load(&iter.dump().unwrap()).unwrap();
    assert_eq!(drain(restored).unwrap(), vec![10, 5]);
}
