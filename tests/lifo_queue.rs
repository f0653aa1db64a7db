mod common;

use std::sync::Arc;
use std::time::Duration;

use slotq::store::{KvStore, MemoryStore};
use slotq::{LifoQueue, Queue, QueueConfig};

use common::{drain_all, SwitchableStore};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn test_lifo_scenario() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());

    let empty: LifoQueue<String> = LifoQueue::new(store.clone(), "q2");
    assert_eq!(empty.count().await?, 0);
    assert_eq!(empty.iter().await?.count(), 0);
    assert_eq!(empty.dequeue().await?, None);

    let queue = LifoQueue::builder(store)
        .name("q2")
        .elements(strings(&["foo", "bar"]))
        .build()
        .await?;

    assert_eq!(queue.iter().await?.collect::<Vec<_>>(), strings(&["foo", "bar"]));
    assert_eq!(queue.count().await?, 2);
    assert_eq!(queue.dequeue().await?.as_deref(), Some("bar"));

    assert_eq!(queue.iter().await?.collect::<Vec<_>>(), strings(&["foo"]));
    assert_eq!(queue.count().await?, 1);
    assert_eq!(queue.dequeue().await?.as_deref(), Some("foo"));

    assert_eq!(queue.iter().await?.count(), 0);
    assert_eq!(queue.count().await?, 0);
    assert_eq!(queue.dequeue().await?, None);
    Ok(())
}

#[tokio::test]
async fn test_refill_after_drain() -> anyhow::Result<()> {
    let queue: LifoQueue<u32> = LifoQueue::new(Arc::new(MemoryStore::new()), "stack");

    queue.enqueue(&1).await?;
    queue.dequeue().await?;
    assert_eq!(queue.dequeue().await?, None);

    queue.enqueue(&123).await?;
    assert_eq!(queue.iter().await?.collect::<Vec<_>>(), vec![123]);
    assert_eq!(queue.count().await?, 1);

    queue.enqueue(&456).await?;
    assert_eq!(queue.iter().await?.collect::<Vec<_>>(), vec![123, 456]);
    assert_eq!(queue.count().await?, 2);

    assert_eq!(queue.dequeue().await?, Some(456));
    assert_eq!(queue.dequeue().await?, Some(123));
    assert_eq!(queue.count().await?, 0);
    assert_eq!(queue.dequeue().await?, None);

    queue.enqueue(&123).await?;
    queue.clear().await?;
    assert_eq!(queue.count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_dequeue_order_is_reverse_of_enqueue_order() -> anyhow::Result<()> {
    let queue: LifoQueue<u32> = LifoQueue::new(Arc::new(MemoryStore::new()), "numbers");

    for i in 0..50 {
        queue.enqueue(&i).await?;
    }

    assert_eq!(drain_all(&queue).await?, (0..50).rev().collect::<Vec<_>>());
    Ok(())
}

#[tokio::test]
async fn test_empty_dequeue_is_idempotent() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let queue: LifoQueue<u32> = LifoQueue::new(store.clone(), "s");

    for _ in 0..5 {
        assert_eq!(queue.dequeue().await?, None);
    }
    assert!(store.is_empty());

    queue.enqueue(&1).await?;
    queue.dequeue().await?;
    for _ in 0..5 {
        assert_eq!(queue.dequeue().await?, None);
    }
    assert_eq!(store.get("s--max-enqueued").await?.as_deref(), Some("1"));
    Ok(())
}

#[tokio::test]
async fn test_interleaved_push_pop() -> anyhow::Result<()> {
    let queue: LifoQueue<char> = LifoQueue::new(Arc::new(MemoryStore::new()), "s");

    queue.enqueue(&'a').await?.enqueue(&'b').await?;
    assert_eq!(queue.dequeue().await?, Some('b'));
    queue.enqueue(&'c').await?;
    assert_eq!(queue.count().await?, 2);
    assert_eq!(queue.dequeue().await?, Some('c'));
    assert_eq!(queue.dequeue().await?, Some('a'));
    Ok(())
}

#[tokio::test]
async fn test_clear_removes_everything() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let queue: LifoQueue<u32> = LifoQueue::new(store.clone(), "s");
    for i in 0..5 {
        queue.enqueue(&i).await?;
    }

    queue.clear().await?.enqueue(&9).await?;

    assert_eq!(queue.count().await?, 1);
    assert_eq!(drain_all(&queue).await?, vec![9]);
    queue.clear().await?;
    assert!(store.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_allocated_id_without_value() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let queue: LifoQueue<String> = LifoQueue::new(store.clone(), "s");

    queue.enqueue(&"a".to_string()).await?;
    // A producer that died after taking id 3 but before writing it.
    store.increment("s--max-enqueued").await?;
    queue.enqueue(&"c".to_string()).await?;

    assert_eq!(queue.count().await?, 3);
    assert_eq!(queue.iter().await?.collect::<Vec<_>>(), strings(&["a", "c"]));

    assert_eq!(queue.dequeue().await?.as_deref(), Some("c"));
    assert_eq!(queue.dequeue().await?, None);
    assert_eq!(queue.dequeue().await?.as_deref(), Some("a"));
    assert_eq!(queue.dequeue().await?, None);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_zero_ttl_never_expires() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let config = QueueConfig::default().with_ttl(Duration::ZERO);
    let queue: LifoQueue<u32> = LifoQueue::with_config(store, "forever", config);
    queue.enqueue(&1).await?;

    tokio::time::advance(Duration::from_secs(365 * 86_400)).await;

    assert_eq!(queue.dequeue().await?, Some(1));
    Ok(())
}

#[tokio::test]
async fn test_store_failure_propagates() -> anyhow::Result<()> {
    let store = SwitchableStore::new();
    let queue: LifoQueue<u32> = LifoQueue::new(store.clone(), "s");
    queue.enqueue(&1).await?;

    store.set_down(true);
    assert!(queue.enqueue(&2).await.is_err());
    assert!(queue.dequeue().await.is_err());
    assert!(queue.iter().await.is_err());
    assert!(queue.clear().await.is_err());

    store.set_down(false);
    assert_eq!(drain_all(&queue).await?, vec![1]);
    Ok(())
}
