//! In-memory message store: every accepted send request, in arrival order.
//!
//! Append-only for the lifetime of the process. Nothing is persisted.

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// One inbound SMS send request. All fields are opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub to: String,
    pub from: String,
    pub body: String,
}

impl Message {
    pub fn new(to: impl Into<String>, from: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            from: from.into(),
            body: body.into(),
        }
    }
}

/// Ordered, append-only store. Share it behind an `Arc`.
pub struct MessageStore {
    inner: RwLock<Vec<Message>>,
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
        }
    }

    /// Add a message to the end of the sequence. Returns the new length.
    pub async fn append(&self, msg: Message) -> usize {
        let mut g = self.inner.write().await;
        g.push(msg);
        g.len()
    }

    /// Clone of the current contents, oldest first.
    pub async fn snapshot(&self) -> Vec<Message> {
        self.inner.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn new_store_is_empty() {
        let store = MessageStore::new();
        assert!(store.is_empty().await);
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn append_preserves_order_and_duplicates() {
        let store = MessageStore::new();
        assert_eq!(store.append(Message::new("1", "a", "first")).await, 1);
        assert_eq!(store.append(Message::new("2", "b", "second")).await, 2);
        assert_eq!(store.append(Message::new("1", "a", "first")).await, 3);

        let all = store.snapshot().await;
        assert_eq!(
            all,
            vec![
                Message::new("1", "a", "first"),
                Message::new("2", "b", "second"),
                Message::new("1", "a", "first"),
            ]
        );
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn snapshot_is_detached_from_later_appends() {
        let store = MessageStore::new();
        store.append(Message::new("1", "a", "x")).await;
        let before = store.snapshot().await;
        store.append(Message::new("2", "b", "y")).await;
        assert_eq!(before.len(), 1);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn concurrent_appends_are_all_kept() {
        let store = Arc::new(MessageStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append(Message::new(i.to_string(), "x", "y")).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(store.len().await, 32);
    }

    #[test]
    fn message_serializes_as_to_from_body() {
        let json = serde_json::to_string(&Message::new("+15550001", "+15559999", "hello")).unwrap();
        assert_eq!(json, r#"{"to":"+15550001","from":"+15559999","body":"hello"}"#);
    }
}
