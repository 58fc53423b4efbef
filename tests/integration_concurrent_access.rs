use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use wirebox::{BeanContainer, BeanDefinition, BeanScope};

struct ConnectionPool {
    id: u32,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn counting_container(constructions: Arc<AtomicU32>) -> BeanContainer {
    let mut builder = BeanContainer::builder();
    builder.register(
        "pool",
        BeanDefinition::builder()
            .constructor(move |_| {
                let id = constructions.fetch_add(1, Ordering::SeqCst);
                // Widen the race window so losing threads really do block
                // on the creation lock instead of winning the fast path.
                thread::sleep(Duration::from_millis(20));
                Ok(Arc::new(ConnectionPool { id }))
            })
            .build(),
    );
    builder.build()
}

#[test]
fn concurrent_requests_create_exactly_one_singleton() {
    init_tracing();
    const THREADS: usize = 8;

    let constructions = Arc::new(AtomicU32::new(0));
    let container = counting_container(constructions.clone());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let container = container.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                container.get_bean::<ConnectionPool>("pool").unwrap()
            })
        })
        .collect();

    let beans: Vec<Arc<ConnectionPool>> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    for bean in &beans[1..] {
        assert!(Arc::ptr_eq(&beans[0], bean));
        assert_eq!(bean.id, beans[0].id);
    }
    assert_eq!(container.singleton_count(), 1);
}

#[test]
fn concurrent_requests_for_distinct_beans_all_succeed() {
    let mut builder = BeanContainer::builder();
    for i in 0..16u32 {
        builder.register(
            format!("pool-{i}"),
            BeanDefinition::builder()
                .constructor(move |_| Ok(Arc::new(ConnectionPool { id: i })))
                .build(),
        );
    }
    let container = builder.build();

    crossbeam_utils::thread::scope(|scope| {
        for i in 0..16u32 {
            let container = &container;
            scope.spawn(move |_| {
                let bean = container
                    .get_bean::<ConnectionPool>(&format!("pool-{i}"))
                    .unwrap();
                assert_eq!(bean.id, i);
            });
        }
    })
    .unwrap();

    assert_eq!(container.singleton_count(), 16);
}

#[test]
fn prototypes_are_independent_across_threads() {
    let constructions = Arc::new(AtomicU32::new(0));
    let per_thread = constructions.clone();

    let mut builder = BeanContainer::builder();
    builder.register(
        "scratch",
        BeanDefinition::builder()
            .scope(BeanScope::Prototype)
            .constructor(move |_| {
                Ok(Arc::new(ConnectionPool {
                    id: per_thread.fetch_add(1, Ordering::SeqCst),
                }))
            })
            .build(),
    );
    let container = builder.build();

    crossbeam_utils::thread::scope(|scope| {
        for _ in 0..4 {
            let container = &container;
            scope.spawn(move |_| {
                let a = container.get_bean::<ConnectionPool>("scratch").unwrap();
                let b = container.get_bean::<ConnectionPool>("scratch").unwrap();
                assert!(!Arc::ptr_eq(&a, &b));
            });
        }
    })
    .unwrap();

    assert_eq!(constructions.load(Ordering::SeqCst), 8);
    assert_eq!(container.singleton_count(), 0);
}

#[test]
fn failed_creation_is_retryable_from_another_thread() {
    init_tracing();
    let attempts = Arc::new(AtomicU32::new(0));
    let attempts_in_ctor = attempts.clone();

    let mut builder = BeanContainer::builder();
    builder.register(
        "flaky",
        BeanDefinition::builder()
            .constructor(move |_| {
                if attempts_in_ctor.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(wirebox::BeansError::UnsatisfiedDependency {
                        bean: "flaky".into(),
                        detail: "transient backend outage".into(),
                    })
                } else {
                    Ok(Arc::new(ConnectionPool { id: 7 }))
                }
            })
            .build(),
    );
    let container = builder.build();

    assert!(container.get_bean::<ConnectionPool>("flaky").is_err());
    assert!(!container.contains_singleton("flaky"));

    let retry = {
        let container = container.clone();
        thread::spawn(move || container.get_bean::<ConnectionPool>("flaky"))
    };
    let bean = retry.join().unwrap().unwrap();
    assert_eq!(bean.id, 7);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}
