use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Follow {
    pub id: i64,
    /// 关注者
    pub user_id: i64,
    /// 被关注的作者
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}
