//! Deferral, re-iteration, and error propagation across composed pipelines.

use std::cell::Cell;

use lazyq_core::prelude::*;
use lazyq_operators::QueryExt;

#[test]
fn composing_reads_nothing() {
    let opened = Cell::new(0);
    let source = generate(|| {
        opened.set(opened.get() + 1);
        vec![5, 3, 5, 1]
    });
    let query = (&source)
        .distinct()
        .order_by(|x| *x)
        .then_by_descending(|x| *x);
    let grouped = (&source).group_by(|x| x % 2);
    assert_eq!(opened.get(), 0);

    let _cursor = query.open();
    let _groups = grouped.open();
    assert_eq!(opened.get(), 0, "opening a session must not pull");

    assert_eq!(query.to_vec().unwrap(), vec![1, 3, 5]);
    assert_eq!(opened.get(), 1);
}

#[test]
fn sessions_are_independent_and_identical() {
    let xs = vec![4, 1, 4, 2, 9, 2];
    let query = (&xs)
        .union(vec![7, 1])
        .except(vec![9])
        .order_by_descending(|x| *x);

    let first = query.to_vec().unwrap();
    let second = query.to_vec().unwrap();
    assert_eq!(first, vec![7, 4, 2, 1]);
    assert_eq!(first, second);

    let mut a = query.open();
    let mut b = query.open();
    assert_eq!(a.next(), Some(Ok(7)));
    assert_eq!(a.next(), Some(Ok(4)));
    assert_eq!(b.next(), Some(Ok(7)));
}

#[test]
fn exhausted_cursors_stay_exhausted() {
    let xs = vec![1, 1, 2];
    let query = (&xs).distinct();
    let mut cursor = query.open();
    assert_eq!(cursor.by_ref().count(), 2);
    assert!(cursor.next().is_none());
    assert!(cursor.next().is_none());
}

#[test]
fn source_errors_reach_the_consumer_unchanged() {
    let boom = Error::Source("disk on fire".into());
    let source = Fallible::new(vec![Ok(3), Ok(1), Err(boom.clone()), Ok(2)]);

    assert_eq!((&source).order_by(|x| *x).to_vec(), Err(boom.clone()));
    assert_eq!((&source).group_by(|x| *x).count(), Err(boom.clone()));
    assert_eq!(
        vec![1, 2, 3].except(&source).to_vec(),
        Err(boom.clone()),
        "seeding errors surface on first advance"
    );

    // Streaming operators hand out what precedes the failure.
    let distinct = (&source).distinct();
    let mut cursor = distinct.open();
    assert_eq!(cursor.next(), Some(Ok(3)));
    assert_eq!(cursor.next(), Some(Ok(1)));
    assert_eq!(cursor.next(), Some(Err(boom)));
}

#[test]
fn empty_intermediates_are_not_errors() {
    let none: Vec<i32> = Vec::new();
    assert_eq!((&none).order_by(|x| *x).to_vec().unwrap(), Vec::<i32>::new());
    assert_eq!((&none).group_by(|x| *x).count().unwrap(), 0);
    assert_eq!(
        (&none)
            .join(vec![1], |x| *x, |y| *y, |x, y| x + y)
            .count()
            .unwrap(),
        0
    );
    assert_eq!(
        (&none).order_by(|x| *x).first(),
        Err(Error::NoElements),
        "only terminal consumers report emptiness"
    );
}

#[test]
fn infinite_sources_compose_with_take() {
    let naturals = generate(|| 0i64..);
    let firsts = (&naturals).distinct_by(|x| x % 3).take(3);
    assert_eq!(firsts.to_vec().unwrap(), vec![0, 1, 2]);
    let odd = (&naturals).filter(|x| x % 2 == 1).take(2);
    assert_eq!(odd.to_vec().unwrap(), vec![1, 3]);
}
