use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use weave_core::{AdviceHandle, Interceptable, Proceed, Target};
use weave_test_utils::{recorded_greet, Recorder};

const WORKERS: usize = 4;
const PER_WORKER: usize = 12;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_public_types_are_send_sync() {
    assert_send_sync::<Interceptable<String, String>>();
    assert_send_sync::<Proceed<String, String>>();
    assert_send_sync::<AdviceHandle>();
    assert_send_sync::<Target>();
}

/// Labels of one worker's registrations, in its own registration order
struct WorkerLog {
    before: Vec<String>,
    after: Vec<String>,
}

/// Register from one thread; every third registration is removed again
fn register(greet: &Interceptable<String, String>, recorder: &Recorder, worker: usize) -> WorkerLog {
    let mut log = WorkerLog {
        before: Vec::new(),
        after: Vec::new(),
    };
    for i in 0..PER_WORKER {
        let label = format!("w{worker}-{i}");
        let r = recorder.clone();
        let tag = label.clone();
        let handle = if i % 2 == 0 {
            greet.before(move |_: &String| {
                r.record(tag.clone());
                None
            })
        } else {
            greet.after(move |result: String, _: &String| {
                r.record(tag.clone());
                result
            })
        };
        if i % 3 == 0 {
            handle.remove();
        } else if i % 2 == 0 {
            log.before.push(label);
        } else {
            log.after.push(label);
        }
    }
    log
}

/// Keep only the entries of `labels`, preserving their order in `entries`
fn restricted(entries: &[String], labels: &[String]) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| labels.contains(entry))
        .cloned()
        .collect()
}

#[test]
fn test_concurrent_registration_keeps_chain_order() {
    let recorder = Recorder::new();
    let greet = recorded_greet(&recorder);
    let done = AtomicBool::new(false);

    let logs: Vec<WorkerLog> = thread::scope(|scope| {
        let dispatching = scope.spawn(|| {
            let mut calls = 0usize;
            while !done.load(Ordering::Acquire) {
                assert_eq!(greet.invoke(&"x".to_string()), "Hi x");
                calls += 1;
            }
            calls
        });

        let workers: Vec<_> = (0..WORKERS)
            .map(|worker| {
                let (greet, recorder) = (greet.clone(), recorder.clone());
                scope.spawn(move || register(&greet, &recorder, worker))
            })
            .collect();
        let logs = workers
            .into_iter()
            .map(|worker| worker.join().expect("worker panicked"))
            .collect();

        done.store(true, Ordering::Release);
        dispatching.join().expect("dispatcher panicked");
        logs
    });

    recorder.take();
    assert_eq!(greet.invoke(&"x".to_string()), "Hi x");
    let entries = recorder.entries();

    let greet_at = entries
        .iter()
        .position(|entry| entry == "greet:x")
        .expect("original ran");
    let (before, after) = (&entries[..greet_at], &entries[greet_at + 1..]);

    let live: usize = logs.iter().map(|log| log.before.len() + log.after.len()).sum();
    assert_eq!(before.len() + after.len(), live);
    assert_eq!(greet.advice_count(), live);

    for log in &logs {
        let mut newest_first = log.before.clone();
        newest_first.reverse();
        assert_eq!(restricted(before, &log.before), newest_first);
        assert_eq!(restricted(after, &log.after), log.after);
    }
}

#[test]
fn test_concurrent_removal_empties_chains() {
    let recorder = Recorder::new();
    let greet = recorded_greet(&recorder);

    let handles: Vec<AdviceHandle> = (0..WORKERS * PER_WORKER)
        .map(|i| {
            let r = recorder.clone();
            if i % 2 == 0 {
                greet.before(move |_: &String| {
                    r.record("before");
                    None
                })
            } else {
                greet.after(move |result: String, _: &String| {
                    r.record("after");
                    result
                })
            }
        })
        .collect();

    thread::scope(|scope| {
        for chunk in handles.chunks(PER_WORKER) {
            scope.spawn(move || {
                for handle in chunk {
                    handle.remove();
                }
            });
        }
        scope.spawn(|| {
            for _ in 0..PER_WORKER {
                assert_eq!(greet.invoke(&"x".to_string()), "Hi x");
            }
        });
    });

    assert!(handles.iter().all(AdviceHandle::is_removed));
    assert!(!greet.has_advice());
    recorder.take();
    greet.invoke(&"x".to_string());
    assert_eq!(recorder.entries(), vec!["greet:x"]);
}
