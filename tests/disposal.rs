use std::sync::Arc;

use parking_lot::Mutex;
use wirebox::{BeanContainer, BeanDefinition, BeansError};

#[derive(Debug)]
struct Service {
    name: &'static str,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn recording_container(events: Arc<Mutex<Vec<String>>>) -> BeanContainer {
    let mut builder = BeanContainer::builder();
    for name in ["repository", "service", "endpoint"] {
        let events = events.clone();
        builder.register(
            name,
            BeanDefinition::builder()
                .constructor(move |_| Ok(Arc::new(Service { name })))
                .destroy(move |_| events.lock().push(name.to_string()))
                .build(),
        );
    }
    builder.build()
}

#[test]
fn destruction_runs_in_reverse_creation_order() {
    init_tracing();
    let events = Arc::new(Mutex::new(Vec::new()));
    let container = recording_container(events.clone());

    container.preinstantiate_singletons().unwrap();
    container.destroy_singletons();

    assert_eq!(*events.lock(), vec!["endpoint", "service", "repository"]);
    assert_eq!(container.singleton_count(), 0);
}

#[test]
fn destruction_order_follows_actual_creation_order() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let container = recording_container(events.clone());

    // Created on demand in a different order than registration.
    container.get_bean::<Service>("endpoint").unwrap();
    container.get_bean::<Service>("repository").unwrap();
    container.get_bean::<Service>("service").unwrap();
    container.destroy_singletons();

    assert_eq!(*events.lock(), vec!["service", "repository", "endpoint"]);
}

#[test]
fn beans_without_destroy_callbacks_are_simply_dropped() {
    let mut builder = BeanContainer::builder();
    builder.register("plain", BeanDefinition::from_instance(42i64));
    let container = builder.build();

    container.get_bean::<i64>("plain").unwrap();
    assert_eq!(container.singleton_count(), 1);
    container.destroy_singletons();
    assert_eq!(container.singleton_count(), 0);

    // Definitions survive teardown; the singleton is rebuilt on demand.
    assert_eq!(*container.get_bean::<i64>("plain").unwrap(), 42);
}

#[test]
fn resolution_during_own_destruction_is_rejected() {
    let observed = Arc::new(Mutex::new(None));

    let mut builder = BeanContainer::builder();
    builder.register(
        "self-aware",
        BeanDefinition::builder()
            .constructor(|_| Ok(Arc::new(Service { name: "self-aware" })))
            .build(),
    );
    let container = builder.build();

    let observed_in_destroy = observed.clone();
    let container_in_destroy = container.clone();
    container.register(
        "self-aware",
        BeanDefinition::builder()
            .constructor(|_| Ok(Arc::new(Service { name: "self-aware" })))
            .destroy(move |_| {
                let err = container_in_destroy
                    .get_bean::<Service>("self-aware")
                    .unwrap_err();
                *observed_in_destroy.lock() = Some(err);
            })
            .build(),
    );

    container.get_bean::<Service>("self-aware").unwrap();
    container.destroy_singletons();

    assert!(matches!(
        observed.lock().take(),
        Some(BeansError::CurrentlyInDestruction(name)) if name == "self-aware"
    ));
}

#[test]
fn panicking_destroy_callback_does_not_abort_teardown() {
    init_tracing();
    let events = Arc::new(Mutex::new(Vec::new()));

    let mut builder = BeanContainer::builder();
    for (name, panics) in [("calm", false), ("explosive", true)] {
        let events = events.clone();
        builder.register(
            name,
            BeanDefinition::builder()
                .constructor(move |_| Ok(Arc::new(Service { name })))
                .destroy(move |_| {
                    events.lock().push(name.to_string());
                    if panics {
                        panic!("teardown failure in {name}");
                    }
                })
                .build(),
        );
    }
    let container = builder.build();

    container.preinstantiate_singletons().unwrap();
    container.destroy_singletons();

    // Reverse order: the panicking bean goes first, the calm one still runs.
    assert_eq!(*events.lock(), vec!["explosive", "calm"]);
    assert_eq!(container.singleton_count(), 0);
}

#[test]
fn removing_a_definition_destroys_its_singleton() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let container = recording_container(events.clone());

    container.get_bean::<Service>("service").unwrap();
    assert!(container.remove_definition("service"));

    assert_eq!(*events.lock(), vec!["service"]);
    assert!(!container.contains_bean("service"));
    assert!(!container.contains_singleton("service"));
    assert!(matches!(
        container.get_bean_handle("service"),
        Err(BeansError::NoSuchDefinition(_))
    ));
    assert!(!container.remove_definition("service"));
}

#[test]
fn replacing_a_definition_discards_the_stale_singleton() {
    let mut builder = BeanContainer::builder();
    builder.register("value", BeanDefinition::from_instance(1i64));
    let container = builder.build();

    assert_eq!(*container.get_bean::<i64>("value").unwrap(), 1);

    container.register("value", BeanDefinition::from_instance(2i64));
    assert_eq!(*container.get_bean::<i64>("value").unwrap(), 2);
}

#[test]
fn close_tears_down_everything() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let container = recording_container(events.clone());

    container.preinstantiate_singletons().unwrap();
    container.close();

    assert_eq!(events.lock().len(), 3);
    assert_eq!(container.singleton_count(), 0);
}
