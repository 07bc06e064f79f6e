/// Database access layer
///
/// The gateway talks to storage only through [`ThoughtStore`]. Two
/// implementations ship with the service:
/// - `pg_store`: PostgreSQL via sqlx (production)
/// - `memory_store`: in-process maps (tests, local runs without Postgres)
use crate::models::{Comment, Mood, Post, PostWithComments};
use async_trait::async_trait;
use uuid::Uuid;

pub mod memory_store;
pub mod pg_store;

pub use memory_store::MemoryThoughtStore;
pub use pg_store::PgThoughtStore;

/// Storage failure, split by whether trying again can help
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Connection-level or resource failure; the same call may succeed later
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The store refused the operation; retrying returns the same answer
    #[error("store rejected operation: {0}")]
    Rejected(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let transient = match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => true,
            sqlx::Error::Database(db_err) => db_err
                .code()
                .map(|code| is_transient_sqlstate(&code))
                .unwrap_or(false),
            _ => false,
        };

        if transient {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Rejected(err.to_string())
        }
    }
}

/// SQLSTATE codes worth another attempt
///
/// Class 08 (connection exception), class 53 (insufficient resources),
/// 57P01..57P03 (admin/crash shutdown, cannot connect now), 40001
/// (serialization failure) and 40P01 (deadlock detected).
fn is_transient_sqlstate(code: &str) -> bool {
    code.starts_with("08")
        || code.starts_with("53")
        || matches!(code, "57P01" | "57P02" | "57P03" | "40001" | "40P01")
}

/// Repository-style interface over the relational store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ThoughtStore: Send + Sync {
    /// All posts newest first, each with its comments oldest first
    async fn list_posts(&self) -> Result<Vec<PostWithComments>, StoreError>;

    /// Inserts under the caller's id; a repeated insert returns the stored row
    async fn insert_post(&self, id: Uuid, content: &str, mood: Mood) -> Result<Post, StoreError>;

    async fn post_exists(&self, post_id: Uuid) -> Result<bool, StoreError>;

    /// Same id contract as [`ThoughtStore::insert_post`]
    async fn insert_comment(
        &self,
        id: Uuid,
        post_id: Uuid,
        content: &str,
    ) -> Result<Comment, StoreError>;

    async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>, StoreError>;

    /// Returns whether a row was removed
    async fn delete_comment(&self, comment_id: Uuid) -> Result<bool, StoreError>;

    /// Atomically bumps the like counter; `None` when the post does not exist
    async fn increment_likes(&self, post_id: Uuid) -> Result<Option<i64>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
