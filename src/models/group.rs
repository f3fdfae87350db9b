use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 社区分组，帖子可以选择归属于某个分组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    /// 为空时根据标题生成
    pub slug: Option<String>,
    pub description: String,
}
