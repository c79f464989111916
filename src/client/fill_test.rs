use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use dashmap::DashMap;
use tonic::async_trait;

use super::*;
use crate::Error;
use crate::Result;

#[derive(Default)]
struct RecordingPutter {
    store: DashMap<String, String>,
}

#[async_trait]
impl KvPutter for RecordingPutter {
    async fn put(
        &self,
        key: String,
        value: String,
    ) -> Result<()> {
        self.store.insert(key, value);
        Ok(())
    }
}

#[tokio::test]
async fn test_fill_with_data_writes_every_key_once() {
    let putter = RecordingPutter::default();

    fill_with_data(&putter, 1000).await.expect("fill should succeed");

    assert_eq!(putter.store.len(), 100);
    for i in 0..100 {
        let value = putter.store.get(&i.to_string()).expect("key should exist");
        assert_eq!(value.len(), 10);
    }
}

#[tokio::test]
async fn test_fill_with_data_rounds_value_size_down() {
    let putter = RecordingPutter::default();

    fill_with_data(&putter, 1050).await.unwrap();

    assert!(putter.store.iter().all(|entry| entry.value().len() == 10));
}

#[tokio::test]
async fn test_fill_with_data_returns_first_writer_error() {
    let attempts = std::sync::Arc::new(AtomicUsize::new(0));
    let attempts_clone = attempts.clone();

    let mut putter = MockKvPutter::new();
    putter.expect_put().returning(move |key, _| {
        attempts_clone.fetch_add(1, Ordering::SeqCst);
        if key == "42" {
            Err(Error::Fatal("disk full".to_string()))
        } else {
            Ok(())
        }
    });

    let result = fill_with_data(&putter, 1000).await;

    assert!(matches!(result, Err(Error::Fatal(msg)) if msg == "disk full"));
    // The failing writer stops at its third key, so the load never completes.
    assert!(attempts.load(Ordering::SeqCst) < 100);
}
