use axum::{
    extract::multipart::MultipartError,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// 未登录访问受保护页面，携带完整的登录跳转地址
    #[error("Login required, redirecting to {0}")]
    LoginRequired(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// 取消关注一个并未关注的作者
    #[error("Follow lookup failed: {0}")]
    FollowLookup(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("Template syntax error: {0}")]
    TemplateSyntax(#[from] handlebars::TemplateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Password hash error: {0}")]
    PasswordHash(String),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
}

/// 标记响应需要渲染为错误页面，由 `error_pages` 中间件处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPage {
    pub status: StatusCode,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::LoginRequired(_) => StatusCode::FOUND,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Multipart(_) => StatusCode::BAD_REQUEST,
            AppError::FollowLookup(_)
            | AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Internal(_)
            | AppError::Template(_)
            | AppError::TemplateSyntax(_)
            | AppError::Serialization(_)
            | AppError::Io(_)
            | AppError::Jwt(_)
            | AppError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::LoginRequired(location) = &self {
            return (StatusCode::FOUND, [(header::LOCATION, location.clone())]).into_response();
        }

        let status = self.status_code();
        let message = match &self {
            AppError::NotFound(msg) => {
                tracing::debug!("Not found: {}", msg);
                "Page not found".to_string()
            }
            AppError::Authentication(msg) | AppError::BadRequest(msg) => msg.clone(),
            AppError::Multipart(e) => {
                tracing::warn!("Multipart error: {}", e);
                "Malformed form submission".to_string()
            }
            AppError::FollowLookup(msg) => {
                tracing::error!("Follow lookup failed: {}", msg);
                "Server error".to_string()
            }
            other => {
                tracing::error!("Internal error: {}", other);
                "Server error".to_string()
            }
        };

        let mut response = (status, message).into_response();
        response.extensions_mut().insert(ErrorPage { status });
        response
    }
}

// 便利函数，用于创建常见错误
impl AppError {
    pub fn not_found(resource: &str) -> Self {
        Self::NotFound(format!("{} not found", resource))
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::BadRequest(msg.to_string())
    }
}

// 从其他错误类型转换
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AppError::PasswordHash(err.to_string())
    }
}
