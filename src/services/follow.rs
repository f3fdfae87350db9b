use crate::{
    error::{AppError, Result},
    models::follow::Follow,
    services::Database,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// 关注关系服务
#[derive(Clone)]
pub struct FollowService {
    db: Arc<Database>,
}

impl FollowService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// 关注作者，已关注时不做任何事；返回是否新建了关注
    pub async fn follow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        // 不能关注自己
        if user_id == author_id {
            debug!("User {} tried to follow themselves", user_id);
            return Ok(false);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO follows (user_id, author_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT (user_id, author_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await?;

        let created = result.rows_affected() > 0;
        if created {
            info!("User {} now follows {}", user_id, author_id);
        }
        Ok(created)
    }

    /// 取消关注，没有关注关系时报错
    pub async fn unfollow(&self, user_id: i64, author_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::FollowLookup(format!(
                "user {} does not follow {}",
                user_id, author_id
            )));
        }

        info!("User {} unfollowed {}", user_id, author_id);
        Ok(())
    }

    pub async fn get(&self, user_id: i64, author_id: i64) -> Result<Option<Follow>> {
        let follow = sqlx::query_as::<_, Follow>(
            "SELECT * FROM follows WHERE user_id = ? AND author_id = ?",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(follow)
    }

    pub async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool> {
        Ok(self.get(user_id, author_id).await?.is_some())
    }

    pub async fn follower_count(&self, author_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE author_id = ?")
            .bind(author_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    pub async fn following_count(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    pub async fn count_all(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}
