use super::{StoreError, ThoughtStore};
use crate::models::{Comment, Mood, Post, PostWithComments};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
    /// Insertion sequence, used to keep ordering stable when timestamps tie
    sequence: HashMap<Uuid, u64>,
    next_seq: u64,
}

impl Tables {
    fn stamp(&mut self, id: Uuid) -> u64 {
        self.next_seq += 1;
        self.sequence.insert(id, self.next_seq);
        self.next_seq
    }

    fn seq(&self, id: &Uuid) -> u64 {
        self.sequence.get(id).copied().unwrap_or_default()
    }
}

/// In-process store with the same semantics as the PostgreSQL one
///
/// Deleting a post is not part of the API, so comment cascade is not modelled.
#[derive(Default)]
pub struct MemoryThoughtStore {
    tables: RwLock<Tables>,
}

impl MemoryThoughtStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ThoughtStore for MemoryThoughtStore {
    async fn list_posts(&self) -> Result<Vec<PostWithComments>, StoreError> {
        let tables = self.tables.read().await;

        let mut posts: Vec<&Post> = tables.posts.values().collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| tables.seq(&b.id).cmp(&tables.seq(&a.id)))
        });

        let mut comments: Vec<&Comment> = tables.comments.values().collect();
        comments.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| tables.seq(&a.id).cmp(&tables.seq(&b.id)))
        });

        Ok(posts
            .into_iter()
            .map(|post| PostWithComments {
                post: post.clone(),
                comments: comments
                    .iter()
                    .filter(|c| c.post_id == post.id)
                    .map(|c| (*c).clone())
                    .collect(),
            })
            .collect())
    }

    async fn insert_post(&self, id: Uuid, content: &str, mood: Mood) -> Result<Post, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.posts.get(&id) {
            return Ok(existing.clone());
        }

        let post = Post {
            id,
            content: content.to_string(),
            mood,
            likes: 0,
            created_at: Utc::now(),
        };
        tables.stamp(post.id);
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn post_exists(&self, post_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tables.read().await.posts.contains_key(&post_id))
    }

    async fn insert_comment(
        &self,
        id: Uuid,
        post_id: Uuid,
        content: &str,
    ) -> Result<Comment, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.comments.get(&id) {
            return Ok(existing.clone());
        }
        if !tables.posts.contains_key(&post_id) {
            return Err(StoreError::Rejected(format!(
                "foreign key violation: post {} does not exist",
                post_id
            )));
        }

        let comment = Comment {
            id,
            post_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        tables.stamp(comment.id);
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>, StoreError> {
        Ok(self.tables.read().await.comments.get(&comment_id).cloned())
    }

    async fn delete_comment(&self, comment_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        tables.sequence.remove(&comment_id);
        Ok(tables.comments.remove(&comment_id).is_some())
    }

    async fn increment_likes(&self, post_id: Uuid) -> Result<Option<i64>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.posts.get_mut(&post_id).map(|post| {
            post.likes += 1;
            post.likes
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
