use std::sync::Arc;
use std::time::Duration;

use temps_kv_connections::{
    ConnectionParameters, ConnectionRegistry, KvError, LifecycleState, MemoryConnector,
};

fn memory_registry() -> (MemoryConnector, Arc<ConnectionRegistry>) {
    let connector = MemoryConnector::new();
    let registry = Arc::new(ConnectionRegistry::new(Arc::new(connector.clone())));
    (connector, registry)
}

#[tokio::test]
async fn test_concurrent_get_connection_creates_one_handle() {
    let (connector, registry) = memory_registry();
    // Widen the race window: each connect suspends before completing
    connector.connect_delay(Duration::from_millis(20));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            registry
                .get_connection("c", Some(ConnectionParameters::new()))
                .await
        }));
    }

    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await.unwrap().unwrap());
    }

    assert_eq!(connector.transports_created(), 1);
    assert_eq!(registry.list_names().await, vec!["c"]);
    for handle in &handles[1..] {
        assert!(Arc::ptr_eq(&handles[0], handle));
    }
}

#[tokio::test]
async fn test_concurrent_distinct_names() {
    let (connector, registry) = memory_registry();

    let mut tasks = Vec::new();
    for i in 0..10 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            registry
                .create_connection(&format!("conn-{}", i), ConnectionParameters::new())
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(registry.len().await, 10);
    assert_eq!(connector.transports_created(), 10);

    registry.close_all().await;
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_close_racing_queries_never_panics() {
    let (_connector, registry) = memory_registry();
    let handle = registry
        .create_connection("shared", ConnectionParameters::new())
        .await
        .unwrap();
    handle.set("k", "v", None).await.unwrap();

    let mut queries = Vec::new();
    for _ in 0..20 {
        let handle = handle.clone();
        queries.push(tokio::spawn(async move { handle.get("k").await }));
    }
    let closer = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.close_connection("shared").await })
    };

    for query in queries {
        match query.await.unwrap() {
            Ok(value) => assert_eq!(value.as_deref(), Some(&b"v"[..])),
            Err(KvError::NotConnected) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    closer.await.unwrap();

    assert!(registry.is_empty().await);
    assert_eq!(handle.state().await, LifecycleState::Closed);
    assert!(matches!(handle.get("k").await, Err(KvError::NotConnected)));
}

#[tokio::test]
async fn test_close_all_while_creating() {
    let (connector, registry) = memory_registry();
    connector.connect_delay(Duration::from_millis(5));

    for name in ["a", "b", "c"] {
        registry
            .create_connection(name, ConnectionParameters::new())
            .await
            .unwrap();
    }

    let creator = {
        let registry = registry.clone();
        tokio::spawn(async move {
            registry
                .create_connection("late", ConnectionParameters::new())
                .await
        })
    };
    registry.close_all().await;
    creator.await.unwrap().unwrap();

    // "late" is either closed by close_all or registered after it
    let names = registry.list_names().await;
    assert!(names.is_empty() || names == vec!["late"]);

    registry.close_all().await;
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_cancelled_create_leaves_no_entry() {
    let (connector, registry) = memory_registry();
    connector.connect_delay(Duration::from_secs(60));

    let result = tokio::time::timeout(
        Duration::from_millis(50),
        registry.create_connection("slow", ConnectionParameters::new()),
    )
    .await;

    assert!(result.is_err());
    assert!(!registry.contains("slow").await);
}
