//! One router shared across threads.

use std::sync::Arc;
use std::thread;

use q::Router;
use serde_json::{json, Value};

const THREADS: usize = 8;

#[test]
fn test_concurrent_enqueue_and_next() {
    let router = Arc::new(Router::default());

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let router = Arc::clone(&router);
            thread::spawn(move || {
                router.enqueue(r#"{"_special":"whois"}"#).unwrap();
                router.enqueue(r#"{"hash":"hashvalue"}"#).unwrap();
                router
                    .enqueue(r#"{"company":"Qadium, Inc.","agent":"007"}"#)
                    .unwrap();
                router.enqueue(r#"{"company":23}"#).unwrap();
                for queue in 0..4 {
                    router.next(queue).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(router.total_pending(), 0);
}

#[test]
fn test_concurrent_sequence_parts_stay_ordered() {
    const PARTS: u64 = 200;
    let router = Arc::new(Router::default());

    // each thread owns a residue class of part numbers, sent in descending order
    let handles: Vec<_> = (0..THREADS as u64)
        .map(|t| {
            let router = Arc::clone(&router);
            thread::spawn(move || {
                let mut parts: Vec<u64> = (0..PARTS).filter(|p| p % THREADS as u64 == t).collect();
                parts.reverse();
                for part in parts {
                    let raw = json!({"_sequence": "shared", "_part": part, "p": part.to_string()});
                    router.enqueue(&raw.to_string()).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(router.pending(4).unwrap(), PARTS as usize);
    for expected in 0..PARTS {
        let message: Value = serde_json::from_str(&router.next(4).unwrap()).unwrap();
        assert_eq!(message["p"], json!(expected.to_string()));
    }
    assert_eq!(router.buffered_parts("shared"), 0);
}
