use crate::{
    error::Result,
    models::comment::{Comment, CommentView},
    services::Database,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct CommentService {
    db: Arc<Database>,
}

impl CommentService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn create(&self, post_id: i64, author_id: i64, text: &str) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (text, author_id, post_id, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, text, author_id, post_id, created_at
            "#,
        )
        .bind(text)
        .bind(author_id)
        .bind(post_id)
        .bind(Utc::now())
        .fetch_one(self.db.pool())
        .await?;

        info!("User {} commented on post {}", author_id, post_id);
        Ok(comment)
    }

    /// 帖子下的评论，先发布的在前
    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentView>> {
        let comments = sqlx::query_as::<_, CommentView>(
            r#"
            SELECT c.id, c.text, c.author_id, c.post_id, c.created_at,
                   u.username AS author_username
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = ?
            ORDER BY c.created_at, c.id
            "#,
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(comments)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}
