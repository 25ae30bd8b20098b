//! End-to-end tests of the result algebra.
//!
//! These tests drive the public API the way calling code does: values and
//! sequences come in, outcomes are composed, and terminal consumption
//! retires them.

use aletheia_core::cache::Many;
use aletheia_core::fixtures::{expensive_after, CountingSource, TrackedHandle};
use aletheia_core::{
    AggregateError, CachedAnswer, ClosableOk, ErrorContract, Operation, Outcome, ResourceMonitor,
    SingleError, StreamOptions,
};
use parking_lot::Mutex;
use std::sync::Arc;

#[test]
fn test_has_any_non_null_stops_before_expensive_element() {
    let source = CountingSource::new(vec![None, None, Some(5)]);
    let pulls = source.counter();
    let mut many = Many::from_nullable(source.chain(expensive_after(Vec::new())));

    assert!(many.has_any_non_null());
    assert_eq!(pulls.get(), 3);
    assert_eq!(many.first(), Some(&5));
}

#[test]
fn test_is_completely_empty_is_idempotent() {
    let mut empty: Many<u8> = Many::new(std::iter::empty());
    assert!(empty.is_completely_empty());
    assert!(empty.is_completely_empty());

    let mut one = Many::new(std::iter::once(1));
    assert!(!one.is_completely_empty());
    assert!(!one.is_completely_empty());
}

#[test]
fn test_partition_order_does_not_matter() {
    for errs_first in [false, true] {
        let mut outcome: Outcome<i32, SingleError> = Outcome::from_results(vec![
            Ok(1),
            Err(SingleError::from_message("X")),
            Ok(2),
        ]);
        let Outcome::Stream(stream) = &mut outcome else {
            panic!("expected a stream");
        };
        if errs_first {
            assert_eq!(stream.err_values().len(), 1);
        }
        assert_eq!(stream.ok_values(), vec![&1, &2]);
        let errs: Vec<_> = stream.err_values().into_iter().map(SingleError::text).collect();
        assert_eq!(errs, vec!["X"]);
    }
}

#[test]
fn test_cast_rules() {
    let err: Outcome<i32, &str> = Outcome::err("E");
    assert_eq!(err.cast::<String>().into_err(), Some("E"));

    let mut narrowed = Outcome::<i32, &str>::ok(5).cast::<String>();
    assert!(narrowed.is_empty());
    assert!(!narrowed.is_err());
}

#[test]
fn test_aggregate_from_repeated_messages() {
    let aggregate = AggregateError::of(["a", "a", "b"]);
    assert_eq!(aggregate.len(), 2);
    let message = aggregate.message();
    assert_eq!(message.matches('a').count(), 1);
    assert_eq!(message.matches('b').count(), 1);
}

#[test]
fn test_closable_dropped_unread_leaves_nothing_open() {
    let monitor = Arc::new(ResourceMonitor::new());
    {
        let _unread = ClosableOk::with_monitor(TrackedHandle::new(), Arc::clone(&monitor));
        assert!(monitor.has_open_resources());
    }
    assert!(!monitor.has_open_resources());
}

#[test]
fn test_closable_inside_outcome_pipeline() {
    let monitor = Arc::new(ResourceMonitor::new());
    let opened = ClosableOk::try_open_with(Arc::clone(&monitor), || {
        Ok::<_, std::io::Error>(TrackedHandle::new())
    });
    let label = opened.and_then(|resource| resource.map(|handle| handle.label().to_string()));
    assert_eq!(label.into_ok().as_deref(), Some("tracked"));
    assert!(!monitor.has_open_resources());
}

#[test]
fn test_lazy_pipeline_pulls_on_demand() {
    let source = CountingSource::new((1..=10).map(Some).collect());
    let pulls = source.counter();
    let outcome: Outcome<i32, String> = Outcome::Ok(Many::from_nullable(source).into())
        .map(|v| v * 2)
        .filter(|v| v % 3 == 0);
    assert_eq!(pulls.get(), 0);

    assert_eq!(outcome.or_else(0), 6);
    assert_eq!(pulls.get(), 3);
}

#[test]
fn test_on_close_summary_after_full_partition() {
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let many = Many::new(vec![Ok::<i32, &str>(1), Err("e")].into_iter().map(Outcome::from))
        .on_close(move |summary| *sink.lock() = Some(summary.clone()));
    let parts = aletheia_core::ResultStream::from_many(many).into_partitioned();
    assert_eq!(parts.oks, vec![1]);

    let summary = seen.lock().take().unwrap();
    assert_eq!(summary.observed, 2);
    assert!(summary.exhausted);
}

#[test]
fn test_infinite_stream_with_bound() {
    let mut naturals = Many::new(0_u32..).with_options(StreamOptions::infinite(50));
    assert!(!naturals.is_completely_empty());
    assert_eq!(naturals.values().count(), 50);
    assert_eq!(
        naturals.cached(Operation::IsCompletelyEmpty),
        Some(&CachedAnswer::Flag(false))
    );
}

#[test]
fn test_all_collects_aggregate() {
    let outcomes = vec![
        Outcome::<u8, SingleError>::ok(1),
        Outcome::err(SingleError::from_message("disk full")),
        Outcome::err(SingleError::from_message("disk full")),
    ];
    let collected = Outcome::all(outcomes);
    let aggregate = collected.into_err().unwrap();
    assert_eq!(aggregate.len(), 1);
    assert!(aggregate.is_error());
    assert_eq!(
        aggregate.pretty_print(),
        "Aggregate Error:\ndisk full".to_string()
    );
}

#[test]
fn test_nested_outcomes_answer_first_value() {
    let build = || {
        Outcome::<i32, String>::from_outcomes(vec![
            Outcome::ok_many(vec![1, 2]),
            Outcome::ok(3),
            Outcome::err_many(vec!["late".to_string()]),
        ])
    };

    assert_eq!(build().or_else(0), 1);
    assert_eq!(build().into_err(), Some("late".to_string()));

    let mut outcome = build();
    assert_eq!(outcome.ok_ref(), Some(&1));
    assert!(!outcome.is_ok());

    let Outcome::Stream(mut stream) = build() else {
        panic!("expected a stream");
    };
    assert_eq!(stream.first_ok(), Some(&1));
    assert_eq!(stream.ok_values(), vec![&1, &2, &3]);
}

#[test]
fn test_outcomes_cross_thread_boundaries() {
    let shared = Arc::new(Mutex::new(Outcome::<i32, String>::from_results(vec![
        Err("boom".to_string()),
        Ok(4),
    ])));

    let workers: Vec<_> = (0..2)
        .map(|_| {
            let worker = Arc::clone(&shared);
            std::thread::spawn(move || worker.lock().is_ok())
        })
        .collect();
    for worker in workers {
        assert!(worker.join().unwrap());
    }

    let outcome = Arc::try_unwrap(shared).unwrap().into_inner();
    let mapped = std::thread::spawn(move || outcome.map(|v| v * 10).into_partitioned())
        .join()
        .unwrap();
    assert_eq!(mapped.oks, vec![40]);
    assert_eq!(mapped.errs, vec!["boom".to_string()]);
}
