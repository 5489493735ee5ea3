// Use codspeed-criterion-compat when running on CodSpeed (CI), real criterion otherwise
#[cfg(codspeed)]
use codspeed_criterion_compat::{Bencher, Criterion, black_box, criterion_group, criterion_main};
use capsa::{NoLimitTracker, Object, Point, Session, StepIter, drain};
#[cfg(not(codspeed))]
use criterion::{Bencher, Criterion, black_box, criterion_group, criterion_main};

/// Drains a fresh `StepIter` directly, without the host boundary.
fn run_drain(bench: &mut Bencher, stop: i64, step: i64, expected_len: usize) {
    let values = drain(StepIter::new(0, stop, Some(step)).unwrap()).unwrap();
    assert_eq!(values.len(), expected_len);

    bench.iter(|| {
        let values = drain(StepIter::new(0, black_box(stop), Some(step)).unwrap()).unwrap();
        black_box(values);
    });
}

/// Creates an iterator and drains it through `Session::call`.
fn run_session_iterate(bench: &mut Bencher, stop: i64, expected_len: usize) {
    let mut session = Session::default();
    let run = |session: &mut Session| {
        let it = session
            .call("range_iterator", vec![Object::Int(0), Object::Int(stop)])
            .unwrap();
        let list = session.call("iterate", vec![it.clone()]).unwrap();
        session.free(&it).unwrap();
        list
    };
    let Object::List(items) = run(&mut session) else {
        panic!("iterate should return a list");
    };
    assert_eq!(items.len(), expected_len);

    bench.iter(|| black_box(run(&mut session)));
}

/// Full capsule lifecycle: allocate, read with the right tag, release.
fn run_capsule_cycle(bench: &mut Bencher) {
    bench.iter(|| {
        let mut capsule = Point::capsule(3, 4, black_box("origin"), &mut NoLimitTracker).unwrap();
        black_box(Point::read(&capsule, Point::TAG).unwrap().x());
        black_box(capsule.release());
    });
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("drain_1000__step_1", |b| run_drain(b, 1000, 1, 1000));
    c.bench_function("drain_1000__step_7", |b| run_drain(b, 1000, 7, 143));
    c.bench_function("session_iterate_1000", |b| run_session_iterate(b, 1000, 1000));
    c.bench_function("capsule_cycle", run_capsule_cycle);
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
