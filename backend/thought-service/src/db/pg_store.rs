use super::{StoreError, ThoughtStore};
use crate::models::{Comment, Mood, Post, PostWithComments};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    content: String,
    mood: String,
    likes: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = StoreError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let mood = row
            .mood
            .parse::<Mood>()
            .map_err(|e| StoreError::Rejected(format!("post {}: {}", row.id, e)))?;

        Ok(Post {
            id: row.id,
            content: row.content,
            mood,
            likes: row.likes,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            post_id: row.post_id,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgThoughtStore {
    pool: PgPool,
}

impl PgThoughtStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        MIGRATOR.run(&self.pool).await
    }
}

#[async_trait]
impl ThoughtStore for PgThoughtStore {
    async fn list_posts(&self) -> Result<Vec<PostWithComments>, StoreError> {
        // One snapshot for both queries so comments match the posts listed
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let post_rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, content, mood, likes, created_at
            FROM posts
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let post_ids: Vec<Uuid> = post_rows.iter().map(|row| row.id).collect();

        let comment_rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, post_id, content, created_at
            FROM comments
            WHERE post_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(&post_ids)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut comments_by_post: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for row in comment_rows {
            comments_by_post
                .entry(row.post_id)
                .or_default()
                .push(row.into());
        }

        post_rows
            .into_iter()
            .map(|row| {
                let post = Post::try_from(row)?;
                let comments = comments_by_post.remove(&post.id).unwrap_or_default();
                Ok(PostWithComments { post, comments })
            })
            .collect()
    }

    async fn insert_post(&self, id: Uuid, content: &str, mood: Mood) -> Result<Post, StoreError> {
        // A retried insert whose first attempt committed hits the conflict
        // and reads the row back instead of creating a second one
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            WITH inserted AS (
                INSERT INTO posts (id, content, mood)
                VALUES ($1, $2, $3)
                ON CONFLICT (id) DO NOTHING
                RETURNING id, content, mood, likes, created_at
            )
            SELECT id, content, mood, likes, created_at FROM inserted
            UNION ALL
            SELECT id, content, mood, likes, created_at FROM posts WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(id)
        .bind(content)
        .bind(mood.as_str())
        .fetch_one(&self.pool)
        .await?;

        Post::try_from(row)
    }

    async fn post_exists(&self, post_id: Uuid) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn insert_comment(
        &self,
        id: Uuid,
        post_id: Uuid,
        content: &str,
    ) -> Result<Comment, StoreError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (id, post_id, content)
                VALUES ($1, $2, $3)
                ON CONFLICT (id) DO NOTHING
                RETURNING id, post_id, content, created_at
            )
            SELECT id, post_id, content, created_at FROM inserted
            UNION ALL
            SELECT id, post_id, content, created_at FROM comments WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(id)
        .bind(post_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>, StoreError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, post_id, content, created_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Comment::from))
    }

    async fn delete_comment(&self, comment_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_likes(&self, post_id: Uuid) -> Result<Option<i64>, StoreError> {
        let likes: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE posts
            SET likes = likes + 1
            WHERE id = $1
            RETURNING likes
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(likes)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(StoreError::from)
    }
}
