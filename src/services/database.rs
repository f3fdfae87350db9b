use crate::config::Config;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info};

/// 数据库服务
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
    pub config: Config,
}

impl Database {
    /// 创建新的数据库实例
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Initializing database connection to {}", config.database_url);

        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // 内存数据库只存在于单个连接中，连接不能被回收
        let in_memory = config.database_url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(config.database_max_connections)
        };

        let pool = pool_options.connect_with(options).await?;

        Ok(Self {
            pool,
            config: config.clone(),
        })
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<()> {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(e.into())
            }
        }
    }

    /// 执行内嵌的迁移脚本
    pub async fn run_migrations(&self) -> Result<()> {
        debug!("Running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// 分页结果结构
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.per_page
    }
}

/// 分页请求，`page` 为查询参数中的原始值
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl PageRequest {
    /// 解析 `?page=`：不是整数时取第一页，超出范围（包括小于 1）时取最后一页
    pub fn resolve(raw: Option<&str>, total: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total_pages(total, per_page);
        let page = match raw.map(str::trim) {
            None => 1,
            Some(value) => match value.parse::<i64>() {
                Ok(requested) if requested < 1 => total_pages,
                Ok(requested) => usize::try_from(requested).map_or(total_pages, |p| p.min(total_pages)),
                // 溢出 i64 的整数仍然是超出范围的页码
                Err(_) if is_integer(value) => total_pages,
                Err(_) => 1,
            },
        };

        Self { page, per_page }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.per_page
    }

    pub fn into_page<T>(self, items: Vec<T>, total: usize) -> Page<T> {
        Page {
            items,
            total,
            page: self.page,
            per_page: self.per_page,
            total_pages: total_pages(total, self.per_page),
        }
    }
}

fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix('-').or_else(|| value.strip_prefix('+')).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// 空列表也有一页
fn total_pages(total: usize, per_page: usize) -> usize {
    if total == 0 {
        1
    } else {
        (total + per_page - 1) / per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_connection() {
        let config = Config::default();
        let db = Database::new(&config).await.unwrap();
        db.verify_connection().await.unwrap();
        db.run_migrations().await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_page_request_resolution() {
        assert_eq!(PageRequest::resolve(None, 12, 5).page, 1);
        assert_eq!(PageRequest::resolve(Some("2"), 12, 5).page, 2);
        assert_eq!(PageRequest::resolve(Some("99"), 12, 5).page, 3);
        assert_eq!(PageRequest::resolve(Some("0"), 12, 5).page, 3);
        assert_eq!(PageRequest::resolve(Some("-4"), 12, 5).page, 3);
        assert_eq!(PageRequest::resolve(Some("abc"), 12, 5).page, 1);
        assert_eq!(PageRequest::resolve(Some("3"), 0, 5).page, 1);
        assert_eq!(PageRequest::resolve(Some("99999999999999999999"), 12, 5).page, 3);
        assert_eq!(PageRequest::resolve(Some("-99999999999999999999"), 12, 5).page, 3);
        assert_eq!(PageRequest::resolve(Some("-"), 12, 5).page, 1);
        assert_eq!(PageRequest::resolve(Some("1.5"), 12, 5).page, 1);
    }

    #[test]
    fn test_page_navigation() {
        let page = PageRequest::resolve(Some("2"), 12, 5).into_page(vec![6, 7, 8, 9, 10], 12);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.offset(), 5);
        assert!(page.has_next());
        assert!(page.has_prev());

        let empty: Page<i32> = PageRequest::resolve(None, 0, 5).into_page(Vec::new(), 0);
        assert_eq!(empty.total_pages, 1);
        assert!(!empty.has_next());
        assert!(!empty.has_prev());
    }
}
