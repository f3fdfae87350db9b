use crate::{
    config::Config,
    error::Result,
    services::{
        AuthService, CommentService, Database, FollowService, GroupService, MediaService,
        PostService, UserService,
    },
    utils::cache::Cache,
    views::Views,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 数据库连接
    pub db: Arc<Database>,

    /// 模板渲染
    pub views: Views,

    /// 首页列表缓存
    pub page_cache: Cache<String>,

    pub auth_service: AuthService,
    pub user_service: UserService,
    pub group_service: GroupService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub follow_service: FollowService,
    pub media_service: MediaService,
}

impl AppState {
    /// 连接数据库、执行迁移并创建所有服务
    pub async fn new(config: Config) -> Result<Self> {
        let db = Database::new(&config).await?;
        db.verify_connection().await?;
        db.run_migrations().await?;
        info!("Database ready at {}", config.database_url);

        Self::with_database(config, Arc::new(db))
    }

    pub fn with_database(config: Config, db: Arc<Database>) -> Result<Self> {
        let auth_service = AuthService::new(&config);

        Ok(Self {
            views: Views::new()?,
            page_cache: Cache::new(Duration::from_secs(config.index_cache_ttl)),
            user_service: UserService::new(db.clone(), auth_service.clone()),
            group_service: GroupService::new(db.clone()),
            post_service: PostService::new(db.clone()),
            comment_service: CommentService::new(db.clone()),
            follow_service: FollowService::new(db.clone()),
            media_service: MediaService::new(&config),
            auth_service,
            db,
            config,
        })
    }
}
