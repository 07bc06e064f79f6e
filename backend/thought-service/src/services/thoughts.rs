/// Thought service - posts, comments and likes
///
/// Validation runs before any store call. Every store call is one retried
/// unit: each attempt is bounded by the policy timeout, and only transient
/// [`StoreError`]s are retried. New rows get their id before the first
/// attempt, so a retry after a lost reply cannot insert twice.
use crate::db::{StoreError, ThoughtStore};
use crate::error::{AppError, Result};
use crate::metrics::record_store_operation;
use crate::models::{Comment, DeleteResponse, LikeResponse, PostWithComments};
use crate::services::validation::{parse_mood, validate_content};
use resilience::{with_retry_if, with_timeout_result, RetryError, ServiceConfig, TimeoutError};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct ThoughtService {
    store: Arc<dyn ThoughtStore>,
    policy: ServiceConfig,
}

impl ThoughtService {
    /// Uses the database preset: 10s per attempt, 3 attempts, 1s/2s backoff
    pub fn new(store: Arc<dyn ThoughtStore>) -> Self {
        Self::with_policy(store, resilience::database_config())
    }

    pub fn with_policy(store: Arc<dyn ThoughtStore>, policy: ServiceConfig) -> Self {
        Self { store, policy }
    }

    async fn call<T, F, Fut>(&self, operation: &'static str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, StoreError>>,
    {
        let timeout = self.policy.timeout.duration;
        let started = Instant::now();

        let result = with_retry_if(
            self.policy.retry.clone(),
            || {
                let attempt = f();
                async move {
                    with_timeout_result(timeout, attempt)
                        .await
                        .map_err(|e| match e {
                            TimeoutError::Elapsed(after) => StoreError::Unavailable(format!(
                                "{} timed out after {:?}",
                                operation, after
                            )),
                            TimeoutError::OperationFailed(err) => err,
                        })
                }
            },
            StoreError::is_transient,
        )
        .await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(RetryError::Exhausted { .. }) => "unavailable",
            Err(RetryError::Aborted(_)) => "rejected",
        };
        record_store_operation(operation, outcome, started.elapsed().as_secs_f64());

        result.map_err(AppError::from)
    }

    /// All posts newest first, each with its comments
    pub async fn list_posts(&self) -> Result<Vec<PostWithComments>> {
        self.call("list_posts", || self.store.list_posts()).await
    }

    pub async fn create_post(
        &self,
        content: Option<&str>,
        mood: Option<&str>,
    ) -> Result<PostWithComments> {
        let content = validate_content(content, "Content")?;
        let mood = parse_mood(mood)?;

        // Chosen once so every attempt writes the same row
        let id = Uuid::new_v4();
        let post = self
            .call("insert_post", || self.store.insert_post(id, &content, mood))
            .await?;

        info!(post_id = %post.id, mood = %post.mood, "Post created");
        Ok(PostWithComments::new(post))
    }

    /// An unknown post is `NotFound` whatever the content looks like
    pub async fn create_comment(&self, post_id: Uuid, content: Option<&str>) -> Result<Comment> {
        let exists = self
            .call("post_exists", || self.store.post_exists(post_id))
            .await?;
        if !exists {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        let content = validate_content(content, "Comment content")?;

        let id = Uuid::new_v4();
        let comment = self
            .call("insert_comment", || {
                self.store.insert_comment(id, post_id, &content)
            })
            .await?;

        info!(post_id = %post_id, comment_id = %comment.id, "Comment created");
        Ok(comment)
    }

    pub async fn delete_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<DeleteResponse> {
        let comment = self
            .call("find_comment", || self.store.find_comment(comment_id))
            .await?;

        match comment {
            Some(comment) if comment.post_id == post_id => {}
            _ => return Err(AppError::NotFound("Comment not found".to_string())),
        }

        let removed = self
            .call("delete_comment", || self.store.delete_comment(comment_id))
            .await?;
        if !removed {
            // Lost a race with another delete
            return Err(AppError::NotFound("Comment not found".to_string()));
        }

        info!(post_id = %post_id, comment_id = %comment_id, "Comment deleted");
        Ok(DeleteResponse { success: true })
    }

    pub async fn like_post(&self, post_id: Uuid) -> Result<LikeResponse> {
        let likes = self
            .call("increment_likes", || self.store.increment_likes(post_id))
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        info!(post_id = %post_id, likes, "Post liked");
        Ok(LikeResponse { likes })
    }

    /// Single store round trip for readiness checks, no retries
    pub async fn health(&self) -> std::result::Result<(), StoreError> {
        with_timeout_result(self.policy.timeout.duration, self.store.ping())
            .await
            .map_err(|e| match e {
                TimeoutError::Elapsed(after) => {
                    StoreError::Unavailable(format!("ping timed out after {:?}", after))
                }
                TimeoutError::OperationFailed(err) => err,
            })
    }
}
