//! Many simultaneous clients against one server.

mod common;

use std::time::{Duration, Instant};

use common::{query, start_server, start_server_with};
use tokio::task::JoinSet;

fn numbered_lines(count: usize) -> String {
    (0..count).map(|i| format!("line{i}\n")).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fifty_concurrent_clients() {
    let server = start_server(&numbered_lines(25)).await;
    let addr = server.addr;

    let start = Instant::now();
    let mut clients = JoinSet::new();
    for i in 0..50 {
        clients.spawn(async move { (i, query(addr, format!("line{i}").as_bytes()).await) });
    }

    let mut exists = 0;
    while let Some(joined) = clients.join_next().await {
        let (i, response) = joined.unwrap();
        if i < 25 {
            assert_eq!(response, format!("Query 'line{i}' EXISTS\n"));
            exists += 1;
        } else {
            assert_eq!(response, format!("Query 'line{i}' NOT FOUND\n"));
        }
    }
    assert_eq!(exists, 25);
    println!("50 clients served in {:?}", start.elapsed());

    let metrics = server.stop().await;
    assert_eq!(metrics.total_requests, 50);
    assert_eq!(metrics.successful_requests, 50);
    assert_eq!(metrics.failed_requests, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_connection_limit_applies_backpressure() {
    let server = start_server_with(&numbered_lines(10), |c| {
        c.listener.max_connections = 4;
        c.executor.workers = 2;
    })
    .await;
    let addr = server.addr;

    let mut clients = JoinSet::new();
    for i in 0..50 {
        clients.spawn(async move { query(addr, format!("line{}", i % 10).as_bytes()).await });
    }

    let all_done = tokio::time::timeout(Duration::from_secs(30), async {
        while let Some(joined) = clients.join_next().await {
            assert!(joined.unwrap().ends_with("EXISTS\n"));
        }
    })
    .await;
    assert!(all_done.is_ok(), "clients were not all served");

    let metrics = server.stop().await;
    assert_eq!(metrics.successful_requests, 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_rereads_stay_consistent() {
    let server = start_server_with(&numbered_lines(100), |c| {
        c.dataset.reread_on_query = true;
    })
    .await;
    let addr = server.addr;

    let mut clients = JoinSet::new();
    for i in 0..50 {
        clients.spawn(async move { query(addr, format!("line{}", i * 2).as_bytes()).await });
    }
    while let Some(joined) = clients.join_next().await {
        assert!(joined.unwrap().ends_with("EXISTS\n"));
    }

    let metrics = server.stop().await;
    assert_eq!(metrics.failed_requests, 0);
}
