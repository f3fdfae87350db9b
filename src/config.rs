use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,
    pub log_format: String,

    // Database configuration
    pub database_url: String,
    pub database_max_connections: u32,

    // Authentication configuration
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub session_cookie_name: String,
    pub login_url: String,

    // Storage configuration
    pub media_root: String,
    pub media_url: String,
    pub max_upload_size: usize,
    pub allowed_image_types: String,

    // Content settings
    pub posts_per_page: usize,

    // Index page cache
    pub index_cache_ttl: u64,
    pub index_cache_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 8000,
            environment: "development".to_string(),
            log_level: "rainbow_posts=debug,tower_http=debug".to_string(),
            log_format: "pretty".to_string(),
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 5,
            jwt_secret: "development-only-secret-change-me".to_string(),
            jwt_expiry_hours: 24 * 14,
            session_cookie_name: "rainbow_session".to_string(),
            login_url: "/auth/login/".to_string(),
            media_root: "media".to_string(),
            media_url: "/media/".to_string(),
            max_upload_size: 5 * 1024 * 1024,
            allowed_image_types: "jpeg,jpg,png,gif,webp".to_string(),
            posts_per_page: 5,
            index_cache_ttl: 20,
            index_cache_prefix: "index_page".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Config::default();
        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment == "production" => {
                anyhow::bail!("JWT_SECRET must be set in production")
            }
            Err(_) => defaults.jwt_secret,
        };

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()?,
            environment,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: env::var("LOG_FORMAT").unwrap_or(defaults.log_format),

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://rainbow-posts.db".to_string()),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,

            jwt_secret,
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "336".to_string())
                .parse()?,
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or(defaults.session_cookie_name),
            login_url: env::var("LOGIN_URL").unwrap_or(defaults.login_url),

            media_root: env::var("MEDIA_ROOT").unwrap_or(defaults.media_root),
            media_url: env::var("MEDIA_URL").unwrap_or(defaults.media_url),
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .unwrap_or_else(|_| "5242880".to_string())
                .parse()?,
            allowed_image_types: env::var("ALLOWED_IMAGE_TYPES")
                .unwrap_or(defaults.allowed_image_types),

            posts_per_page: env::var("POSTS_PER_PAGE")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,

            index_cache_ttl: env::var("INDEX_CACHE_TTL")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,
            index_cache_prefix: env::var("INDEX_CACHE_PREFIX")
                .unwrap_or(defaults.index_cache_prefix),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// 允许上传的图片扩展名
    pub fn allowed_image_extensions(&self) -> Vec<String> {
        self.allowed_image_types
            .split(',')
            .map(|ext| ext.trim().to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }
}
