//! Integration tests exercising a full actor + client round trip (spec.md
//! §8 "Testable properties" and its three named seed scenarios).
//!
//! These run as plain OS-thread tests (no `#[tokio::test]`) on purpose:
//! [`RawClientStub::call_blocking`] is exactly the API spec.md §4.3/§5
//! describes for "a caller that is a bare OS thread with no ambient
//! Scheduler", and driving concurrency here with real `std::thread`s
//! mirrors spec.md §5's two-layer model (preemptive across actors,
//! cooperative within one).

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use stagehand::{Actor, CallError, ClientConfig, RawClientStub, Request, Scheduler, Server, ServerEndpoint, ServerLoop};

/// Drives [`Actor::shutdown`] to completion from a plain test thread with no
/// ambient tokio runtime of its own.
fn shutdown_blocking(actor: &mut Actor) {
    Scheduler::new().start(async {
        actor.shutdown().await.expect("actor thread should not have panicked");
    });
}

fn echo_actor() -> Actor {
    Actor::spawn(|| {
        let mut server = Server::new();
        server.register("ping", |_args| async move { Ok(Vec::new()) });
        server
    })
}

// Seed scenario: `{ u64 get_value(); }`; impl returns 42; spawn; assert
// `get_value() == 42`; `shutdown()`; subsequent `get_value()` fails.
#[test]
fn seed_scenario_get_value_returns_42_then_fails_after_shutdown() {
    let mut actor = Actor::spawn(|| {
        let mut server = Server::new();
        server.register("get_value", |_args| async move { Ok(42u64.to_le_bytes().to_vec()) });
        server
    });

    let client = RawClientStub::new(actor.endpoint(), ClientConfig::default());
    let res = client.call_blocking("get_value", vec![]).unwrap();
    let value = u64::from_le_bytes(res.data.try_into().unwrap());
    assert_eq!(value, 42);

    shutdown_blocking(&mut actor);

    let err = client.call_blocking("get_value", vec![]).unwrap_err();
    assert!(matches!(err, CallError::Timeout | CallError::Failed(_)));
}

// Seed scenario: `{ void ping(); }`; impl increments a counter; spawn;
// issue 100 calls from one client; shutdown; counter equals 100 and all 100
// calls returned Success.
#[test]
fn seed_scenario_one_hundred_pings_increment_a_shared_counter() {
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_for_actor = Arc::clone(&counter);
    let mut actor = Actor::spawn(move || {
        let counter = counter_for_actor;
        let mut server = Server::new();
        server.register("ping", move |_args| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            }
        });
        server
    });

    let client = RawClientStub::new(actor.endpoint(), ClientConfig::default());
    for _ in 0..100 {
        client.call_blocking("ping", vec![]).unwrap();
    }

    shutdown_blocking(&mut actor);
    assert_eq!(counter.load(Ordering::SeqCst), 100);
}

// Seed scenario: `sleep(200ms, drop=false)`; one call with 50ms timeout
// expects Timeout... no, wait: drop=false *defers*, it never drops, so a
// short-timeout call against a drop=false sleep can still time out simply
// because the deferred dispatch hasn't resolved by the deadline. The second
// call, with a 500ms timeout, succeeds only after the sleep window ends.
#[test]
fn seed_scenario_sleep_drop_false_defers_short_timeout_fails_long_timeout_succeeds() {
    let mut actor = echo_actor();
    actor.sleep(Duration::from_millis(200), false).unwrap();

    let impatient = RawClientStub::new(
        actor.endpoint(),
        ClientConfig {
            default_timeout: Duration::from_millis(50),
        },
    );
    let err = impatient.call_blocking("ping", vec![]).unwrap_err();
    assert!(matches!(err, CallError::Timeout));

    let patient = RawClientStub::new(
        actor.endpoint(),
        ClientConfig {
            default_timeout: Duration::from_millis(500),
        },
    );
    let start = Instant::now();
    patient.call_blocking("ping", vec![]).unwrap();
    assert!(start.elapsed() >= Duration::from_millis(180));

    shutdown_blocking(&mut actor);
}

// Testable property 4: sleep with drop=true drops requests received during
// the window; after the window ends, subsequent calls succeed again.
#[test]
fn sleep_with_drop_true_drops_during_the_window_then_recovers() {
    let mut actor = echo_actor();
    actor.sleep(Duration::from_millis(250), true).unwrap();

    let impatient = RawClientStub::new(
        actor.endpoint(),
        ClientConfig {
            default_timeout: Duration::from_millis(50),
        },
    );
    let err = impatient.call_blocking("ping", vec![]).unwrap_err();
    assert!(matches!(err, CallError::Timeout));

    thread::sleep(Duration::from_millis(300));

    let recovered = RawClientStub::new(actor.endpoint(), ClientConfig::default());
    recovered.call_blocking("ping", vec![]).unwrap();

    shutdown_blocking(&mut actor);
}

// Testable property 5: filter rejects only the matched method; clearing it
// restores normal service.
#[test]
fn filter_rejects_only_the_matched_method() {
    let mut actor = Actor::spawn(|| {
        let mut server = Server::new();
        server.register("ping", |_args| async move { Ok(Vec::new()) });
        server.register("pong", |_args| async move { Ok(Vec::new()) });
        server
    });

    actor.filter("ping", "ping").unwrap();

    let client = RawClientStub::new(actor.endpoint(), ClientConfig::default());
    let err = client.call_blocking("ping", vec![]).unwrap_err();
    assert_eq!(err, CallError::failed("Filtered method 'ping'"));

    client.call_blocking("pong", vec![]).unwrap();

    actor.clear_filter().unwrap();
    client.call_blocking("ping", vec![]).unwrap();

    shutdown_blocking(&mut actor);
}

// spec.md §4.4 step 3 / §7: a handler that panics is answered with
// `Failed` carrying the panic message, promptly — not left to time out as
// if the handler had simply never replied.
#[test]
fn handler_panic_is_reported_as_failed_promptly_not_timeout() {
    let mut actor = Actor::spawn(|| {
        let mut server = Server::new();
        server.register("boom", |_args| async move {
            panic!("handler deliberately panicked");
        });
        server
    });

    let client = RawClientStub::new(
        actor.endpoint(),
        ClientConfig {
            default_timeout: Duration::from_secs(5),
        },
    );

    let start = Instant::now();
    let err = client.call_blocking("boom", vec![]).unwrap_err();
    assert!(start.elapsed() < Duration::from_secs(1));
    match err {
        CallError::Failed(description) => assert!(description.contains("handler deliberately panicked")),
        CallError::Timeout => panic!("a panicking handler must not surface as a timeout"),
    }

    // The actor's own OS thread is unaffected: a panic inside one dispatch
    // task does not abort the server loop, only the one in-flight request.
    client.call_blocking("boom", vec![]).unwrap_err();
    assert!(!actor.is_finished());

    shutdown_blocking(&mut actor);
}

// Testable property 7: a call with timeout > 0 never waits past
// `timeout + ε`, even against a handler that never replies.
#[test]
fn timeout_completes_within_configured_bound_plus_slack() {
    let mut actor = Actor::spawn(|| {
        let mut server = Server::new();
        server.register("never_replies", |_args| async move {
            std::future::pending::<()>().await;
            unreachable!("handler deliberately never completes")
        });
        server
    });

    let client = RawClientStub::new(
        actor.endpoint(),
        ClientConfig {
            default_timeout: Duration::from_millis(100),
        },
    );
    let start = Instant::now();
    let err = client.call_blocking("never_replies", vec![]).unwrap_err();
    assert!(matches!(err, CallError::Timeout));
    assert!(start.elapsed() < Duration::from_millis(150));

    shutdown_blocking(&mut actor);
}

// Testable property 8: shutdown joins the actor's OS thread within a
// bounded time, and subsequent calls fail fast rather than hanging.
#[test]
fn shutdown_terminates_promptly_and_subsequent_calls_fail_fast() {
    let mut actor = echo_actor();
    let client = RawClientStub::new(
        actor.endpoint(),
        ClientConfig {
            default_timeout: Duration::from_millis(200),
        },
    );
    client.call_blocking("ping", vec![]).unwrap();

    let start = Instant::now();
    shutdown_blocking(&mut actor);
    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(actor.is_finished());

    let err = client.call_blocking("ping", vec![]).unwrap_err();
    assert!(matches!(err, CallError::Timeout | CallError::Failed(_)));
}

// Testable property 2: with N outstanding calls on one actor, each handler
// parked on a shared release flag, all N tasks exist simultaneously and
// releasing the flag lets every one of them complete. Proves intake does
// not serialize handler dispatch onto a single cooperative task.
#[test]
fn handler_concurrency_all_n_tasks_exist_simultaneously() {
    const N: usize = 8;

    let entered = Arc::new(AtomicUsize::new(0));
    let released = Arc::new(AtomicBool::new(false));

    let entered_for_actor = Arc::clone(&entered);
    let released_for_actor = Arc::clone(&released);
    let mut actor = Actor::spawn(move || {
        let mut server = Server::new();
        server.register("wait_then_ack", move |_args| {
            let entered = Arc::clone(&entered_for_actor);
            let released = Arc::clone(&released_for_actor);
            async move {
                entered.fetch_add(1, Ordering::SeqCst);
                while !released.load(Ordering::SeqCst) {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                Ok(Vec::new())
            }
        });
        server
    });

    let endpoint = actor.endpoint();
    let callers: Vec<_> = (0..N)
        .map(|_| {
            let endpoint = endpoint.clone();
            thread::spawn(move || {
                let client = RawClientStub::new(
                    endpoint,
                    ClientConfig {
                        default_timeout: Duration::from_secs(5),
                    },
                );
                client.call_blocking("wait_then_ack", vec![])
            })
        })
        .collect();

    let deadline = Instant::now() + Duration::from_secs(2);
    while entered.load(Ordering::SeqCst) < N {
        assert!(Instant::now() < deadline, "not all {N} handlers entered concurrently in time");
        thread::sleep(Duration::from_millis(5));
    }

    released.store(true, Ordering::SeqCst);

    for caller in callers {
        caller.join().unwrap().unwrap();
    }

    shutdown_blocking(&mut actor);
}

/// Spawns a `ServerLoop` on a fresh OS thread against a pre-built
/// [`ServerEndpoint`] — used below so two actors can each hold the other's
/// endpoint at construction time, which `Actor::spawn`'s single-endpoint
/// API doesn't support.
fn spawn_raw_actor(
    endpoint: ServerEndpoint,
    build: impl FnOnce() -> Server + Send + 'static,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let server = Rc::new(build());
        let scheduler = Scheduler::new();
        scheduler.start(ServerLoop::run(endpoint, server));
    })
}

// Testable property 9: a handler on actor A that calls actor B, which calls
// back into A via a different method, completes without deadlock and both
// responses reach their correct waiters.
#[test]
fn reentrant_calls_across_two_actors_do_not_deadlock() {
    let endpoint_a = ServerEndpoint::new();
    let endpoint_b = ServerEndpoint::new();

    let a_for_b = endpoint_a.clone();
    let join_b = spawn_raw_actor(endpoint_b.clone(), move || {
        let mut server = Server::new();
        server.register("b_calls_back_into_a", move |_args| {
            let endpoint_a = a_for_b.clone();
            async move {
                let client = RawClientStub::new(endpoint_a, ClientConfig::default());
                client
                    .call_with_timeout("a_pong", Vec::new(), Duration::from_secs(5))
                    .await
                    .map(|res| res.data)
                    .map_err(|e| e.to_string())
            }
        });
        server
    });

    let b_for_a = endpoint_b.clone();
    let join_a = spawn_raw_actor(endpoint_a.clone(), move || {
        let mut server = Server::new();
        server.register("a_pong", |_args| async move { Ok(b"pong".to_vec()) });
        server.register("a_ping", move |_args| {
            let endpoint_b = b_for_a.clone();
            async move {
                let client = RawClientStub::new(endpoint_b, ClientConfig::default());
                client
                    .call_with_timeout("b_calls_back_into_a", Vec::new(), Duration::from_secs(5))
                    .await
                    .map(|res| res.data)
                    .map_err(|e| e.to_string())
            }
        });
        server
    });

    let client = RawClientStub::new(endpoint_a.clone(), ClientConfig::default());
    let res = client.call_blocking("a_ping", vec![]).unwrap();
    assert_eq!(res.data, b"pong");

    let _ = endpoint_a.put_request(Request::shutdown());
    endpoint_a.close();
    let _ = endpoint_b.put_request(Request::shutdown());
    endpoint_b.close();
    join_a.join().unwrap();
    join_b.join().unwrap();
}
