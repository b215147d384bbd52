use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

use tracing_test::traced_test;

use super::experimental::ExperimentalNotice;

#[test]
#[traced_test]
fn test_warns_only_on_first_call() {
    let notice = ExperimentalNotice::new();
    assert!(!notice.is_emitted());

    assert!(notice.warn_once("sled"));
    assert!(notice.is_emitted());
    assert!(!notice.warn_once("sled"));
    assert!(!notice.warn_once("sled"));

    assert!(logs_contain("sled support is experimental"));
}

#[test]
fn test_concurrent_opens_emit_exactly_once() {
    let notice = Arc::new(ExperimentalNotice::new());
    let emitted = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let notice = notice.clone();
            let emitted = emitted.clone();
            thread::spawn(move || {
                if notice.warn_once("sled") {
                    emitted.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(emitted.load(Ordering::SeqCst), 1);
}
