//! Timing scenarios, run on tokio's paused clock so elapsed times are exact.

mod common;

use agent_pool::{PoolClient, PoolConfig, PoolError};
use common::{MockFactory, init_tracing, request};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

const PAUSE: Duration = Duration::from_millis(100);

#[tokio::test(start_paused = true)]
async fn test_two_agents_run_six_requests_in_three_waves() {
    init_tracing();
    let factory = MockFactory::new();
    let client = PoolClient::new(factory.clone(), PoolConfig::new().with_capacity(2)).unwrap();

    let start = Instant::now();
    let mut handles = Vec::new();
    for _ in 0..6 {
        let agent = client.next_agent().await.unwrap();
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client.perform(agent, request("resolve", 100)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let elapsed = start.elapsed();
    assert!(elapsed >= PAUSE * 3, "finished too early: {elapsed:?}");
    assert!(elapsed < PAUSE * 4, "finished too late: {elapsed:?}");
    assert_eq!(factory.created(), 2);
    assert_eq!(client.pool().total_count(), 2);
    assert_eq!(client.pool().idle_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_single_agent_serializes_and_replaces_after_failure() {
    init_tracing();
    let factory = MockFactory::new();
    let client = PoolClient::new(factory.clone(), PoolConfig::new().with_capacity(1)).unwrap();
    let finished = Arc::new(Mutex::new(Vec::new()));

    let start = Instant::now();
    let mut handles = Vec::new();
    for (index, path) in ["resolve", "reject", "resolve"].into_iter().enumerate() {
        let agent = client.next_agent().await.unwrap();
        let client = client.clone();
        let finished = finished.clone();
        handles.push(tokio::spawn(async move {
            let result = client.perform(agent, request(path, 100)).await;
            finished.lock().unwrap().push(index);
            result
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    assert!(start.elapsed() >= PAUSE * 3);
    assert_eq!(*finished.lock().unwrap(), vec![0, 1, 2]);

    assert_eq!(results[0].as_ref().unwrap().body, b"agent-0");
    assert_eq!(results[1].as_ref().unwrap_err().agent, 0);
    // The rejected agent was evicted, so the third request ran on a new one.
    assert_eq!(results[2].as_ref().unwrap().body, b"agent-1");
    assert_eq!(factory.created(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_acquire_below_capacity_never_waits() {
    let factory = MockFactory::new().with_delay(Duration::from_millis(10));
    let client = PoolClient::new(factory, PoolConfig::new().with_capacity(3)).unwrap();

    let mut held = Vec::new();
    for _ in 0..3 {
        let start = Instant::now();
        held.push(client.next_agent().await.unwrap());
        assert_eq!(start.elapsed(), Duration::from_millis(10));
        assert_eq!(client.pool().waiter_count(), 0);
    }

    // Returning one agent lets the pool reuse it without constructing.
    client.release(held.pop().unwrap());
    let start = Instant::now();
    held.push(client.next_agent().await.unwrap());
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_second_acquire_waits_for_perform() {
    let factory = MockFactory::new();
    let client = PoolClient::new(factory.clone(), PoolConfig::new().with_capacity(1)).unwrap();

    let agent = client.next_agent().await.unwrap();
    let first_id = agent.id();
    let start = Instant::now();
    let in_flight = tokio::spawn({
        let client = client.clone();
        async move { client.perform(agent, request("resolve", 100)).await }
    });

    let second = client.next_agent().await.unwrap();
    assert_eq!(start.elapsed(), PAUSE);
    assert_eq!(second.id(), first_id);
    assert_eq!(factory.created(), 1);
    in_flight.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_wait_frees_the_slot() {
    let config = PoolConfig::new().with_capacity(1).with_max_waiters(1);
    let client = PoolClient::new(MockFactory::new(), config).unwrap();
    let held = client.next_agent().await.unwrap();

    let abandoned = tokio::time::timeout(Duration::from_millis(10), client.next_agent()).await;
    assert!(abandoned.is_err());
    assert_eq!(client.pool().waiter_count(), 0);

    // The single waiter slot is free again.
    let waiting = tokio::spawn({
        let client = client.clone();
        async move { client.next_agent().await }
    });
    while client.pool().waiter_count() == 0 {
        tokio::task::yield_now().await;
    }
    client.release(held);
    assert!(waiting.await.unwrap().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_construction_frees_capacity() {
    let factory = MockFactory::new().with_delay(PAUSE);
    let client = PoolClient::new(factory.clone(), PoolConfig::new().with_capacity(1)).unwrap();

    let abandoned = tokio::time::timeout(Duration::from_millis(10), client.next_agent()).await;
    assert!(abandoned.is_err());
    assert_eq!(client.pool().total_count(), 0);

    let start = Instant::now();
    let agent = client.next_agent().await.unwrap();
    assert_eq!(start.elapsed(), PAUSE);
    assert_eq!(agent.number, 0);
}

#[tokio::test(start_paused = true)]
async fn test_configured_acquire_timeout() {
    let config = PoolConfig::new()
        .with_capacity(1)
        .with_acquire_timeout(Duration::from_millis(30));
    let client = PoolClient::new(MockFactory::new(), config).unwrap();
    let _held = client.next_agent().await.unwrap();

    let start = Instant::now();
    let err = client.next_agent().await.unwrap_err();
    assert!(matches!(err, PoolError::Timeout(_)));
    assert_eq!(start.elapsed(), Duration::from_millis(30));
    assert_eq!(client.pool().waiter_count(), 0);
}
