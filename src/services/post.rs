use crate::{
    error::Result,
    models::post::{ImageChange, NewPost, Post, PostChanges, PostFilter, PostView},
    services::{
        database::{Page, PageRequest},
        Database,
    },
};
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::sync::Arc;
use tracing::{debug, info};

const POST_VIEW_SELECT: &str = r#"
    SELECT p.id, p.text, p.image, p.author_id, p.group_id, p.created_at,
           u.username AS author_username,
           u.first_name AS author_first_name,
           u.last_name AS author_last_name,
           g.title AS group_title,
           g.slug AS group_slug,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

/// 帖子服务
#[derive(Clone)]
pub struct PostService {
    db: Arc<Database>,
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: PostFilter) {
    match filter {
        PostFilter::All => {}
        PostFilter::Group(group_id) => {
            builder.push(" WHERE p.group_id = ").push_bind(group_id);
        }
        PostFilter::Author(author_id) => {
            builder.push(" WHERE p.author_id = ").push_bind(author_id);
        }
        PostFilter::FollowedBy(user_id) => {
            builder
                .push(" WHERE p.author_id IN (SELECT author_id FROM follows WHERE user_id = ")
                .push_bind(user_id)
                .push(")");
        }
    }
}

impl PostService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn create(&self, author_id: i64, new_post: NewPost) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (text, image, author_id, group_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, text, image, author_id, group_id, created_at
            "#,
        )
        .bind(&new_post.text)
        .bind(&new_post.image)
        .bind(author_id)
        .bind(new_post.group_id)
        .bind(Utc::now())
        .fetch_one(self.db.pool())
        .await?;

        info!("User {} published post {}", author_id, post.id);
        Ok(post)
    }

    /// 更新正文、分组和图片，作者和发布时间不变
    pub async fn update(&self, post_id: i64, changes: PostChanges) -> Result<Post> {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE posts SET text = ");
        builder.push_bind(changes.text);
        builder.push(", group_id = ").push_bind(changes.group_id);
        match changes.image {
            ImageChange::Keep => {}
            ImageChange::Clear => {
                builder.push(", image = NULL");
            }
            ImageChange::Replace(path) => {
                builder.push(", image = ").push_bind(path);
            }
        }
        builder.push(" WHERE id = ").push_bind(post_id);
        builder.push(" RETURNING id, text, image, author_id, group_id, created_at");

        let post = builder
            .build_query_as::<Post>()
            .fetch_one(self.db.pool())
            .await?;
        debug!("Updated post {}", post.id);
        Ok(post)
    }

    pub async fn get(&self, post_id: i64) -> Result<Option<PostView>> {
        let mut builder = QueryBuilder::<Sqlite>::new(POST_VIEW_SELECT);
        builder.push(" WHERE p.id = ").push_bind(post_id);
        let post = builder
            .build_query_as::<PostView>()
            .fetch_optional(self.db.pool())
            .await?;
        Ok(post)
    }

    /// 帖子必须属于 URL 中的用户
    pub async fn get_by_author_and_id(&self, username: &str, post_id: i64) -> Result<Option<PostView>> {
        let mut builder = QueryBuilder::<Sqlite>::new(POST_VIEW_SELECT);
        builder.push(" WHERE p.id = ").push_bind(post_id);
        builder.push(" AND u.username = ").push_bind(username.to_string());
        let post = builder
            .build_query_as::<PostView>()
            .fetch_optional(self.db.pool())
            .await?;
        Ok(post)
    }

    pub async fn count(&self, filter: PostFilter) -> Result<usize> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM posts p");
        push_filter(&mut builder, filter);
        let row = builder.build().fetch_one(self.db.pool()).await?;
        let total: i64 = row.try_get(0)?;
        Ok(total as usize)
    }

    pub async fn count_by_author(&self, author_id: i64) -> Result<usize> {
        self.count(PostFilter::Author(author_id)).await
    }

    pub async fn count_all(&self) -> Result<usize> {
        self.count(PostFilter::All).await
    }

    /// 按发布时间倒序分页列出帖子，`raw_page` 为查询参数 `page` 的原始值
    pub async fn list(
        &self,
        filter: PostFilter,
        raw_page: Option<&str>,
        per_page: usize,
    ) -> Result<Page<PostView>> {
        let total = self.count(filter).await?;
        let request = PageRequest::resolve(raw_page, total, per_page);

        let mut builder = QueryBuilder::<Sqlite>::new(POST_VIEW_SELECT);
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ");
        builder.push_bind(request.per_page as i64);
        builder.push(" OFFSET ");
        builder.push_bind(request.offset() as i64);

        let posts = builder
            .build_query_as::<PostView>()
            .fetch_all(self.db.pool())
            .await?;
        debug!(
            "Listed {} of {} posts ({:?}, page {})",
            posts.len(),
            total,
            filter,
            request.page
        );

        Ok(request.into_page(posts, total))
    }
}
