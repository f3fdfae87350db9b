pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
pub mod views;

use crate::{
    state::AppState,
    utils::middleware::{auth_middleware, error_pages_middleware, security_headers_middleware},
};
use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

/// 表单字段在图片之外额外允许的请求体大小
const FORM_OVERHEAD: usize = 64 * 1024;

/// 构建完整的应用路由
pub fn app(state: Arc<AppState>) -> Router {
    let media_mount = format!("/{}", state.config.media_url.trim_matches('/'));

    Router::new()
        .merge(routes::router())
        .nest_service(&media_mount, ServeDir::new(&state.config.media_root))
        .fallback(routes::not_found)
        .layer(DefaultBodyLimit::max(state.config.max_upload_size + FORM_OVERHEAD))
        .layer(from_fn_with_state(state.clone(), error_pages_middleware))
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
