pub mod auth;
pub mod comments;
pub mod follows;
pub mod groups;
pub mod posts;
pub mod users;

use crate::{
    error::{AppError, Result},
    state::AppState,
};
use axum::{
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;

/// 所有页面路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .merge(posts::router())
        .merge(groups::router())
        .merge(follows::router())
        .merge(comments::router())
        .merge(users::router())
}

/// GET /health
async fn health() -> &'static str {
    "ok"
}

/// 未匹配任何路由
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

/// 302 跳转
pub fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// 查询串中的 `page` 参数，重复时取最后一个
pub fn page_param(query: Option<&str>) -> Option<String> {
    let pairs: Vec<(String, String)> = query
        .and_then(|q| serde_urlencoded::from_str(q).ok())
        .unwrap_or_default();
    pairs
        .into_iter()
        .rev()
        .find(|(key, _)| key == "page")
        .map(|(_, value)| value)
}

/// URL 中的帖子编号，不是整数时按 404 处理
pub fn parse_post_id(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("Post {} not found", raw)))
}
