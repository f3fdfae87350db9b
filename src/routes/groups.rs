use crate::{
    error::{AppError, Result},
    models::post::PostFilter,
    routes::{page_param, posts::listing_context},
    state::AppState,
    utils::middleware::OptionalAuth,
};
use axum::{
    extract::{Path, RawQuery, State},
    response::Html,
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/group/:slug/", get(group_posts))
}

/// 分组中的帖子
/// GET /group/:slug/
async fn group_posts(
    State(state): State<Arc<AppState>>,
    OptionalAuth(viewer): OptionalAuth,
    Path(slug): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Html<String>> {
    debug!("Listing posts of group {}", slug);

    let group = state
        .group_service
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Group {} not found", slug)))?;

    let page_number = page_param(query.as_deref());
    let page = state
        .post_service
        .list(
            PostFilter::Group(group.id),
            page_number.as_deref(),
            state.config.posts_per_page,
        )
        .await?;

    let mut data = listing_context(&state, &page);
    data["group"] = json!(group);

    state.views.page(viewer.as_ref(), &group.title, "group", &data)
}
