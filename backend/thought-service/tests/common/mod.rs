#![allow(dead_code)]

use async_trait::async_trait;
use resilience::{RetryConfig, ServiceConfig, TimeoutConfig};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thought_service::db::{MemoryThoughtStore, StoreError, ThoughtStore};
use thought_service::models::{Comment, Mood, Post, PostWithComments};
use thought_service::services::ThoughtService;
use tokio::time::Instant;
use uuid::Uuid;

/// Retries without real waiting, for HTTP-level tests
pub fn fast_policy() -> ServiceConfig {
    ServiceConfig {
        timeout: TimeoutConfig {
            duration: Duration::from_secs(2),
        },
        retry: RetryConfig::linear(3, Duration::from_millis(1)),
    }
}

pub fn memory_service() -> ThoughtService {
    ThoughtService::with_policy(Arc::new(MemoryThoughtStore::new()), fast_policy())
}

/// Memory store that fails the next `failures` calls with a transient error
/// and records when each call was attempted
///
/// `lose_replies` makes inserts commit and then report a transient error,
/// as when the connection drops before the answer arrives.
pub struct FlakyStore {
    inner: MemoryThoughtStore,
    failures_left: AtomicU32,
    lost_replies_left: AtomicU32,
    attempts: Mutex<Vec<Instant>>,
}

impl FlakyStore {
    pub fn new(failures: u32) -> Self {
        Self {
            inner: MemoryThoughtStore::new(),
            failures_left: AtomicU32::new(failures),
            lost_replies_left: AtomicU32::new(0),
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_next(&self, failures: u32) {
        self.failures_left.store(failures, Ordering::SeqCst);
    }

    pub fn lose_replies(&self, replies: u32) {
        self.lost_replies_left.store(replies, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn clear_attempts(&self) {
        self.attempts.lock().unwrap().clear();
    }

    fn deliver<T>(&self, committed: T) -> Result<T, StoreError> {
        let lost = self
            .lost_replies_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if lost {
            Err(StoreError::Unavailable("connection reset after commit".into()))
        } else {
            Ok(committed)
        }
    }

    fn gate(&self) -> Result<(), StoreError> {
        self.attempts.lock().unwrap().push(Instant::now());
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            Err(StoreError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ThoughtStore for FlakyStore {
    async fn list_posts(&self) -> Result<Vec<PostWithComments>, StoreError> {
        self.gate()?;
        self.inner.list_posts().await
    }

    async fn insert_post(&self, id: Uuid, content: &str, mood: Mood) -> Result<Post, StoreError> {
        self.gate()?;
        let post = self.inner.insert_post(id, content, mood).await?;
        self.deliver(post)
    }

    async fn post_exists(&self, post_id: Uuid) -> Result<bool, StoreError> {
        self.gate()?;
        self.inner.post_exists(post_id).await
    }

    async fn insert_comment(
        &self,
        id: Uuid,
        post_id: Uuid,
        content: &str,
    ) -> Result<Comment, StoreError> {
        self.gate()?;
        let comment = self.inner.insert_comment(id, post_id, content).await?;
        self.deliver(comment)
    }

    async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>, StoreError> {
        self.gate()?;
        self.inner.find_comment(comment_id).await
    }

    async fn delete_comment(&self, comment_id: Uuid) -> Result<bool, StoreError> {
        self.gate()?;
        self.inner.delete_comment(comment_id).await
    }

    async fn increment_likes(&self, post_id: Uuid) -> Result<Option<i64>, StoreError> {
        self.gate()?;
        self.inner.increment_likes(post_id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.gate()
    }
}

/// Store whose calls never complete
pub struct StalledStore;

#[async_trait]
impl ThoughtStore for StalledStore {
    async fn list_posts(&self) -> Result<Vec<PostWithComments>, StoreError> {
        std::future::pending().await
    }

    async fn insert_post(
        &self,
        _id: Uuid,
        _content: &str,
        _mood: Mood,
    ) -> Result<Post, StoreError> {
        std::future::pending().await
    }

    async fn post_exists(&self, _post_id: Uuid) -> Result<bool, StoreError> {
        std::future::pending().await
    }

    async fn insert_comment(
        &self,
        _id: Uuid,
        _post_id: Uuid,
        _content: &str,
    ) -> Result<Comment, StoreError> {
        std::future::pending().await
    }

    async fn find_comment(&self, _comment_id: Uuid) -> Result<Option<Comment>, StoreError> {
        std::future::pending().await
    }

    async fn delete_comment(&self, _comment_id: Uuid) -> Result<bool, StoreError> {
        std::future::pending().await
    }

    async fn increment_likes(&self, _post_id: Uuid) -> Result<Option<i64>, StoreError> {
        std::future::pending().await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        std::future::pending().await
    }
}
