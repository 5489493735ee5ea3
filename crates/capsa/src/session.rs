//! Host boundary: the module function table over a heap of iterators and capsules.
//!
//! A [`Session`] plays the part of the host runtime. It owns the heap that
//! iterators and capsules live in, the [`ErrorIndicator`], the resource
//! tracker and the lifecycle tracer.
//!
//! There are two ways in:
//!
//! - Typed methods ([`Session::range_iterator`], [`Session::get_point`], ...)
//!   return [`RunResult`] and never touch the indicator.
//! - [`Session::call`] dispatches by function name over positional
//!   [`Object`] arguments. On failure it stores the exception in the indicator
//!   and returns `None`, the "null plus current error" convention of the host.
//!
//! Sessions are single-threaded; every call runs to completion.

use crate::{
    args::ArgValues,
    capsule::Capsule,
    error_indicator::ErrorIndicator,
    exception::{ErrorKind, RunResult},
    heap::{Heap, HeapData, HeapId, HeapStats},
    iter::{Pull, StepIter, drain, from_iter},
    object::{DictPairs, Object},
    point::Point,
    resource::{NoLimitTracker, ResourceTracker},
    tracer::{LifecycleTracer, NoopTracer},
};

/// Names accepted by [`Session::call`].
pub const FUNCTIONS: &[&str] = &[
    "range_iterator",
    "next",
    "iterate",
    "create_point",
    "get_point",
    "release_point",
];

#[derive(Debug)]
pub struct Session<T: ResourceTracker = NoLimitTracker, Tr: LifecycleTracer = NoopTracer> {
    heap: Heap,
    errors: ErrorIndicator,
    tracker: T,
    tracer: Tr,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(NoLimitTracker, NoopTracer)
    }
}

impl<T: ResourceTracker, Tr: LifecycleTracer> Session<T, Tr> {
    pub fn new(tracker: T, tracer: Tr) -> Self {
        Self {
            heap: Heap::default(),
            errors: ErrorIndicator::new(),
            tracker,
            tracer,
        }
    }

    pub fn tracer(&self) -> &Tr {
        &self.tracer
    }

    pub fn tracer_mut(&mut self) -> &mut Tr {
        &mut self.tracer
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn errors(&self) -> &ErrorIndicator {
        &self.errors
    }

    pub fn errors_mut(&mut self) -> &mut ErrorIndicator {
        &mut self.errors
    }

    pub fn heap_stats(&self) -> HeapStats {
        HeapStats {
            tracker_allocations: self.tracker.allocation_count(),
            tracker_memory_bytes: self.tracker.current_memory_bytes(),
            ..self.heap.stats()
        }
    }

    /// Calls a table function by name.
    ///
    /// Returns `None` either on failure, with the error stored in
    /// [`Self::errors`], or when `next` reached the end of its iterator, with
    /// the indicator left untouched.
    pub fn call(&mut self, name: &str, args: Vec<Object>) -> Option<Object> {
        match self.dispatch(name, ArgValues::from(args)) {
            Ok(result) => result,
            Err(exc) => {
                self.tracer.on_error_set(exc.kind(), exc.message());
                self.errors.set(exc);
                None
            }
        }
    }

    fn dispatch(&mut self, name: &str, args: ArgValues) -> RunResult<Option<Object>> {
        match name {
            "range_iterator" => {
                let (start, stop, step) = args.get_two_three_args(name)?;
                let start = start.expect_int(name, 1)?;
                let stop = stop.expect_int(name, 2)?;
                let step = step.map(|s| s.expect_int(name, 3)).transpose()?;
                self.range_iterator(start, stop, step).map(Some)
            }
            "next" => {
                let it = args.get_one_arg(name)?;
                Ok(self.iter_next(&it)?.into_option().map(Object::Int))
            }
            "iterate" => {
                let iterable = args.get_one_arg(name)?;
                self.iterate(&iterable).map(|items| Some(Object::List(items)))
            }
            "create_point" => {
                let (x, y, point_name) = args.get_three_args(name)?;
                let x = x.expect_i32(name, 1)?;
                let y = y.expect_i32(name, 2)?;
                let point_name = point_name.expect_str(name, 3)?;
                self.create_point(x, y, point_name).map(Some)
            }
            "get_point" => {
                let capsule = args.get_one_arg(name)?;
                self.get_point(&capsule).map(Some)
            }
            "release_point" => {
                let capsule = args.get_one_arg(name)?;
                self.release_point(&capsule).map(|()| Some(Object::None))
            }
            _ => Err(ErrorKind::unknown_function(name)),
        }
    }

    /// Creates a bounded stepped iterator on the heap.
    pub fn range_iterator(&mut self, start: i64, stop: i64, step: Option<i64>) -> RunResult<Object> {
        let iter = StepIter::new(start, stop, step)?;
        self.tracer.on_iter_create(start, stop, iter.step());
        Ok(Object::Ref(self.heap.allocate(HeapData::Iter(iter))))
    }

    /// Pulls one value from a heap iterator.
    pub fn iter_next(&mut self, it: &Object) -> RunResult<Pull<i64>> {
        let iter = self.iter_mut(it)?;
        let was_active = !iter.is_exhausted();
        let pulled = iter.advance();
        if was_active && iter.is_exhausted() {
            let yielded = iter.yielded();
            self.tracer.on_iter_exhausted(yielded);
        }
        Ok(pulled)
    }

    /// Collects every item of `iterable` into a list.
    ///
    /// Lists and tuples yield their items, strings their characters, dicts
    /// their keys. A heap iterator is drained in place and is exhausted
    /// afterwards.
    pub fn iterate(&mut self, iterable: &Object) -> RunResult<Vec<Object>> {
        match iterable {
            Object::List(items) | Object::Tuple(items) => drain(from_iter(items.iter().cloned())),
            Object::String(s) => drain(from_iter(s.chars().map(|c| Object::String(c.to_string())))),
            Object::Dict(pairs) => drain(from_iter(pairs.keys().map(|k| Object::String(k.clone())))),
            Object::Ref(_) => {
                let iter = self.iter_mut(iterable)?;
                let was_active = !iter.is_exhausted();
                let values = drain(&mut *iter)?;
                if was_active {
                    let yielded = iter.yielded();
                    self.tracer.on_iter_exhausted(yielded);
                }
                Ok(values.into_iter().map(Object::Int).collect())
            }
            other => Err(ErrorKind::not_iterable(other.type_name())),
        }
    }

    /// Allocates a `Point` capsule on the heap.
    pub fn create_point(&mut self, x: i32, y: i32, name: &str) -> RunResult<Object> {
        let capsule = Point::capsule(x, y, name, &mut self.tracker)?;
        self.tracer.on_capsule_create(capsule.tag());
        Ok(Object::Ref(self.heap.allocate(HeapData::Capsule(capsule))))
    }

    /// Reads a `Point` capsule into `{"x": int, "y": int, "name": str}`.
    pub fn get_point(&mut self, capsule: &Object) -> RunResult<Object> {
        let capsule = self.capsule(capsule)?;
        let tag = capsule.tag();
        let read = Point::read(capsule, Point::TAG).map(|point| {
            let mut pairs = DictPairs::new();
            pairs.insert("x".to_owned(), Object::Int(point.x().into()));
            pairs.insert("y".to_owned(), Object::Int(point.y().into()));
            pairs.insert("name".to_owned(), Object::from(point.name()));
            Object::Dict(pairs)
        });
        self.tracer.on_capsule_read(tag, read.is_ok());
        read
    }

    /// Releases a capsule and frees its heap slot.
    ///
    /// The reference dangles afterwards, so releasing it again fails with
    /// `AlreadyReleased` and runs nothing.
    pub fn release_point(&mut self, capsule: &Object) -> RunResult<()> {
        if let Object::Ref(id) = capsule
            && self.heap.get(*id).is_err()
        {
            return Err(ErrorKind::already_released(Point::TAG));
        }
        let id = self.capsule_id(capsule)?;
        if let HeapData::Capsule(mut capsule) = self.heap.free(id)?
            && capsule.release_tracked(&mut self.tracker)
        {
            self.tracer.on_capsule_release(capsule.tag());
        }
        Ok(())
    }

    /// Frees any heap object; capsules are released first.
    pub fn free(&mut self, object: &Object) -> RunResult<()> {
        let Object::Ref(id) = object else {
            return Ok(());
        };
        if matches!(self.heap.get(*id)?, HeapData::Capsule(_)) {
            self.release_point(object)
        } else {
            self.heap.free(*id).map(drop)
        }
    }

    /// Host type name of `object`, resolving heap references.
    pub fn type_name(&self, object: &Object) -> &'static str {
        match object {
            Object::Ref(id) => self.heap.get(*id).map_or("object", HeapData::type_name),
            other => other.type_name(),
        }
    }

    fn iter_mut(&mut self, it: &Object) -> RunResult<&mut StepIter> {
        let Object::Ref(id) = it else {
            return Err(ErrorKind::expected_iterator());
        };
        match self.heap.get_mut(*id)? {
            HeapData::Iter(iter) => Ok(iter),
            HeapData::Capsule(_) => Err(ErrorKind::expected_iterator()),
        }
    }

    fn capsule_id(&self, capsule: &Object) -> RunResult<HeapId> {
        let Object::Ref(id) = capsule else {
            return Err(ErrorKind::expected_capsule());
        };
        match self.heap.get(*id)? {
            HeapData::Capsule(_) => Ok(*id),
            HeapData::Iter(_) => Err(ErrorKind::expected_capsule()),
        }
    }

    fn capsule(&self, capsule: &Object) -> RunResult<&Capsule> {
        let id = self.capsule_id(capsule)?;
        match self.heap.get(id)? {
            HeapData::Capsule(capsule) => Ok(capsule),
            HeapData::Iter(_) => Err(ErrorKind::expected_capsule()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::tracer::{RecordingTracer, TraceEvent};

    #[test]
    fn next_at_end_leaves_indicator_clear() {
        let mut session = Session::default();
        let it = session.call("range_iterator", vec![Object::Int(0), Object::Int(1)]).unwrap();
        assert_eq!(session.call("next", vec![it.clone()]), Some(Object::Int(0)));
        assert_eq!(session.call("next", vec![it]), None);
        assert_eq!(session.errors().occurred(), None);
    }

    #[test]
    fn exhaustion_is_traced_once() {
        let mut session = Session::new(NoLimitTracker, RecordingTracer::new());
        let it = session.range_iterator(0, 1, None).unwrap();
        for _ in 0..4 {
            session.iter_next(&it).unwrap();
        }
        let exhausted = session
            .tracer()
            .events()
            .iter()
            .filter(|event| matches!(event, TraceEvent::IterExhausted { .. }))
            .count();
        assert_eq!(exhausted, 1);
    }

    #[test]
    fn type_names_resolve_heap_refs() {
        let mut session = Session::default();
        let it = session.range_iterator(0, 1, None).unwrap();
        let point = session.create_point(0, 0, "p").unwrap();
        assert_eq!(session.type_name(&it), "RangeIterator");
        assert_eq!(session.type_name(&point), "PyCapsule");
        assert_eq!(session.type_name(&Object::Int(1)), "int");
        session.free(&it).unwrap();
        assert_eq!(session.type_name(&it), "object");
    }

    #[test]
    fn unknown_function_sets_argument_error() {
        let mut session = Session::default();
        assert_eq!(session.call("import_and_call", vec![]), None);
        assert!(session.errors().matches(ErrorKind::ArgumentError));
    }
}
