//! End-to-end behavior of the client with in-process transports.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use service_client::{
    transport_fn, CallError, CallOptions, CircuitBreakerConfig, CircuitState, ClientOptions,
    Endpoint, EndpointRegistry, LoadBalancer, RetryPolicy, ServiceClient, TransportError,
};

fn quick_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        jitter_enabled: false,
        ..RetryPolicy::default()
    }
}

fn breaker_options(threshold: u32, recovery_ms: u64, half_open_max_calls: u32) -> ClientOptions {
    ClientOptions {
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold: threshold,
            recovery_timeout: Duration::from_millis(recovery_ms),
            half_open_max_calls,
        },
        retry: RetryPolicy::none(),
        attempt_timeout: None,
        ..ClientOptions::default()
    }
}

fn registry(service: &str, count: u16) -> Arc<EndpointRegistry> {
    let registry = Arc::new(EndpointRegistry::new());
    for i in 0..count {
        registry.register(Endpoint::new(service, "127.0.0.1", 9000 + i));
    }
    registry
}

#[tokio::test]
async fn test_circuit_opens_then_admits_after_recovery() {
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let options = ClientOptions {
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold: 2,
            recovery_timeout: Duration::from_millis(200),
            half_open_max_calls: 1,
        },
        retry: quick_retry(0),
        ..ClientOptions::default()
    };

    let client = ServiceClient::with_options(
        registry("api", 3),
        transport_fn(move |_ep: Endpoint, _req: ()| {
            c.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(TransportError::Network("connection refused".into())) }
        }),
        options,
    );

    for _ in 0..2 {
        let err = client.call("api", &(), &CallOptions::new()).await.unwrap_err();
        assert!(matches!(err, CallError::Transport { .. }));
    }
    assert_eq!(client.breaker_state("api"), CircuitState::Open);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let err = client.call("api", &(), &CallOptions::new()).await.unwrap_err();
    assert!(matches!(err, CallError::CircuitOpen { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 2, "transport must not be invoked while open");

    tokio::time::sleep(Duration::from_millis(250)).await;

    let err = client.call("api", &(), &CallOptions::new()).await.unwrap_err();
    assert!(matches!(err, CallError::Transport { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 3, "half-open call reaches the transport");
    assert_eq!(client.breaker_state("api"), CircuitState::Open);
}

#[tokio::test]
async fn test_retries_are_not_counted_as_failed_calls() {
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let options = ClientOptions {
        retry: quick_retry(3),
        ..ClientOptions::default()
    };

    let client = ServiceClient::with_options(
        registry("api", 1),
        transport_fn(move |_ep: Endpoint, _req: ()| {
            let n = c.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(TransportError::Network("reset by peer".into()))
                } else {
                    Ok("pong")
                }
            }
        }),
        options,
    );

    let res = client.call("api", &(), &CallOptions::new()).await.unwrap();
    assert_eq!(res, "pong");
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let stats = client.stats("api");
    assert_eq!(stats.total, 1);
    assert_eq!(stats.successful, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.success_rate, 1.0);
    assert_eq!(client.breaker("api").snapshot().consecutive_failures, 0);
}

#[tokio::test]
async fn test_concurrent_calls_rotate_over_every_endpoint() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let options = ClientOptions {
        retry: quick_retry(0),
        ..ClientOptions::default()
    };

    let client = Arc::new(ServiceClient::with_options(
        registry("api", 6),
        transport_fn(move |ep: Endpoint, _req: ()| {
            s.lock().unwrap().push(ep.port);
            async { Ok::<_, TransportError>(()) }
        }),
        options,
    ));

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..6 {
        let client = client.clone();
        tasks.spawn(async move { client.call("api", &(), &CallOptions::new()).await });
    }
    while let Some(res) = tasks.join_next().await {
        res.unwrap().unwrap();
    }

    let ports: HashSet<u16> = seen.lock().unwrap().iter().copied().collect();
    assert_eq!(ports, (9000..9006).collect::<HashSet<u16>>());
}

#[tokio::test]
async fn test_services_have_independent_breakers() {
    let options = ClientOptions {
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold: 1,
            ..CircuitBreakerConfig::default()
        },
        retry: quick_retry(0),
        ..ClientOptions::default()
    };

    let reg = registry("bad", 1);
    reg.register(Endpoint::new("good", "127.0.0.1", 7000));

    let client = ServiceClient::with_options(
        reg,
        transport_fn(|ep: Endpoint, _req: ()| async move {
            if ep.service == "bad" {
                Err(TransportError::Network("down".into()))
            } else {
                Ok(())
            }
        }),
        options,
    );

    assert!(client.call("bad", &(), &CallOptions::new()).await.is_err());
    assert_eq!(client.breaker_state("bad"), CircuitState::Open);

    client.call("good", &(), &CallOptions::new()).await.unwrap();
    assert_eq!(client.breaker_state("good"), CircuitState::Closed);
}

#[tokio::test]
async fn test_register_and_deregister_through_client() {
    let client = ServiceClient::new(
        Arc::new(EndpointRegistry::new()),
        transport_fn(|ep: Endpoint, _req: ()| async move { Ok::<_, TransportError>(ep.port) }),
    );

    let err = client.call("api", &(), &CallOptions::new()).await.unwrap_err();
    assert!(matches!(err, CallError::NoEndpoints { .. }));

    client.register_endpoint("api", "127.0.0.1", 9100, 100);
    assert_eq!(client.call("api", &(), &CallOptions::new()).await.unwrap(), 9100);

    client.deregister_endpoint("api", "127.0.0.1", 9100);
    assert!(client.registry().endpoints("api").is_empty());
}

#[tokio::test]
async fn test_half_open_successes_close_the_circuit() {
    let healthy = Arc::new(AtomicBool::new(false));
    let h = healthy.clone();

    let client = ServiceClient::with_options(
        registry("api", 2),
        transport_fn(move |ep: Endpoint, _req: ()| {
            let up = h.load(Ordering::SeqCst);
            async move {
                if up {
                    Ok(ep.port)
                } else {
                    Err(TransportError::Network("connection refused".into()))
                }
            }
        }),
        breaker_options(2, 50, 2),
    );

    for _ in 0..2 {
        assert!(client.call("api", &(), &CallOptions::new()).await.is_err());
    }
    assert_eq!(client.breaker_state("api"), CircuitState::Open);

    tokio::time::sleep(Duration::from_millis(80)).await;
    healthy.store(true, Ordering::SeqCst);

    client.call("api", &(), &CallOptions::new()).await.unwrap();
    assert_eq!(client.breaker_state("api"), CircuitState::HalfOpen);
    client.call("api", &(), &CallOptions::new()).await.unwrap();
    assert_eq!(client.breaker_state("api"), CircuitState::Closed);

    let snapshot = client.breaker("api").snapshot();
    assert_eq!(snapshot.consecutive_failures, 0);
    assert_eq!(snapshot.half_open_in_flight, 0);

    let stats = client.stats("api");
    assert_eq!(stats.total, 4);
    assert_eq!(stats.successful, 2);
}

#[tokio::test]
async fn test_cancelled_half_open_call_frees_its_slot() {
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();

    let client = ServiceClient::with_options(
        registry("api", 1),
        transport_fn(move |_ep: Endpoint, _req: ()| {
            let n = c.fetch_add(1, Ordering::SeqCst);
            async move {
                match n {
                    0 => Err(TransportError::Network("connection refused".into())),
                    1 => {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        Ok(n)
                    }
                    _ => Ok(n),
                }
            }
        }),
        breaker_options(1, 50, 1),
    );

    assert!(client.call("api", &(), &CallOptions::new()).await.is_err());
    assert_eq!(client.breaker_state("api"), CircuitState::Open);
    tokio::time::sleep(Duration::from_millis(80)).await;

    let abandoned =
        tokio::time::timeout(Duration::from_millis(20), client.call("api", &(), &CallOptions::new())).await;
    assert!(abandoned.is_err(), "hanging call should be cut off by the caller");
    assert_eq!(client.breaker("api").snapshot().half_open_in_flight, 0);

    assert_eq!(client.call("api", &(), &CallOptions::new()).await.unwrap(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(client.breaker_state("api"), CircuitState::Closed);
}

#[tokio::test]
async fn test_half_open_attempt_timeout_reopens_circuit() {
    let fail_fast = Arc::new(AtomicBool::new(true));
    let f = fail_fast.clone();

    let client = ServiceClient::with_options(
        registry("api", 1),
        transport_fn(move |_ep: Endpoint, _req: ()| {
            let fast = f.load(Ordering::SeqCst);
            async move {
                if fast {
                    return Err(TransportError::Network("connection refused".into()));
                }
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
        }),
        breaker_options(1, 50, 1),
    );

    assert!(client.call("api", &(), &CallOptions::new()).await.is_err());
    tokio::time::sleep(Duration::from_millis(80)).await;
    fail_fast.store(false, Ordering::SeqCst);

    let opts = CallOptions::new().attempt_timeout(Duration::from_millis(20));
    let err = client.call("api", &(), &opts).await.unwrap_err();
    assert!(matches!(err, CallError::Timeout { .. }));
    assert_eq!(client.breaker_state("api"), CircuitState::Open);

    let err = client.call("api", &(), &opts).await.unwrap_err();
    assert!(matches!(err, CallError::CircuitOpen { .. }));
}

/// Always picks the last candidate.
#[derive(Debug)]
struct LastEndpoint;

impl LoadBalancer for LastEndpoint {
    fn select(&self, endpoints: &[Endpoint]) -> Option<Endpoint> {
        endpoints.last().cloned()
    }
}

#[tokio::test]
async fn test_custom_load_balancer() {
    let client = ServiceClient::with_options(
        registry("api", 3),
        transport_fn(|ep: Endpoint, _req: ()| async move { Ok::<_, TransportError>(ep.port) }),
        ClientOptions {
            retry: quick_retry(0),
            ..ClientOptions::default()
        },
    )
    .with_load_balancer(Box::new(LastEndpoint));

    for _ in 0..3 {
        assert_eq!(client.call("api", &(), &CallOptions::new()).await.unwrap(), 9002);
    }
}
