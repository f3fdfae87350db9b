use crate::{
    error::{AppError, Result},
    models::group::{Group, NewGroup},
    services::Database,
    utils::slug::{generate_slug, is_valid_slug, make_slug_unique},
};
use std::sync::Arc;
use tracing::{debug, info};

/// 社区分组服务
#[derive(Clone)]
pub struct GroupService {
    db: Arc<Database>,
}

impl GroupService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// 创建分组，未给出 slug 时由标题生成
    pub async fn create(&self, new_group: NewGroup) -> Result<Group> {
        let title = new_group.title.trim();
        if title.is_empty() {
            return Err(AppError::bad_request("Group title is required"));
        }

        let base_slug = match new_group.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => {
                if !is_valid_slug(slug) {
                    return Err(AppError::BadRequest(format!("Invalid slug: {}", slug)));
                }
                slug.to_string()
            }
            _ => generate_slug(title),
        };

        let existing: Vec<String> =
            sqlx::query_scalar("SELECT slug FROM post_groups WHERE slug = ? OR slug LIKE ?")
                .bind(&base_slug)
                .bind(format!("{}-%", base_slug))
                .fetch_all(self.db.pool())
                .await?;
        let slug = make_slug_unique(&base_slug, &existing);
        debug!("Resolved group slug {} from {}", slug, base_slug);

        let group = sqlx::query_as::<_, Group>(
            "INSERT INTO post_groups (title, slug, description) VALUES (?, ?, ?) RETURNING id, title, slug, description",
        )
        .bind(title)
        .bind(&slug)
        .bind(new_group.description.trim())
        .fetch_one(self.db.pool())
        .await?;

        info!("Created group {} ({})", group.slug, group.id);
        Ok(group)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>("SELECT * FROM post_groups WHERE slug = ?")
            .bind(slug)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(group)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>("SELECT * FROM post_groups WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(group)
    }

    /// 所有分组，按标题排序，用于表单下拉框
    pub async fn list_all(&self) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>("SELECT * FROM post_groups ORDER BY title, id")
            .fetch_all(self.db.pool())
            .await?;
        Ok(groups)
    }
}
