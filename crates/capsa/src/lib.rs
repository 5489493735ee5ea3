#![doc = include_str!("../../../README.md")]

mod args;
mod capsule;
mod error_indicator;
mod exception;
mod heap;
pub mod iter;
mod object;
mod point;
mod resource;
mod session;
pub mod tracer;

pub use crate::{
    args::ArgValues,
    capsule::Capsule,
    error_indicator::ErrorIndicator,
    exception::{ErrorKind, Exception, RunResult},
    heap::{HeapId, HeapStats},
    iter::{IterState, Pull, PullIter, StepIter, drain},
    object::{DictPairs, Object},
    point::{NAME_CAPACITY, NameBuf, Point},
    resource::{LimitedTracker, NoLimitTracker, ResourceError, ResourceLimits, ResourceTracker},
    session::{FUNCTIONS, Session},
    tracer::{LifecycleTracer, NoopTracer, RecordingTracer, StderrTracer, TraceEvent},
};
