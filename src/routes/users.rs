use crate::{
    error::Result,
    models::{post::PostFilter, user::ProfileStats},
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

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/:username/", get(profile))
}

/// 用户主页：帖子列表和关注统计
/// GET /:username/
async fn profile(
    State(state): State<Arc<AppState>>,
    OptionalAuth(viewer): OptionalAuth,
    Path(username): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Html<String>> {
    let author = state.user_service.require_by_username(&username).await?;

    let page_number = page_param(query.as_deref());
    let page = state
        .post_service
        .list(
            PostFilter::Author(author.id),
            page_number.as_deref(),
            state.config.posts_per_page,
        )
        .await?;

    let is_following = match &viewer {
        Some(viewer) => state.follow_service.is_following(viewer.id, author.id).await?,
        None => false,
    };
    let stats = ProfileStats {
        post_count: page.total as i64,
        follower_count: state.follow_service.follower_count(author.id).await?,
        following_count: state.follow_service.following_count(author.id).await?,
        is_following,
    };

    let mut data = listing_context(&state, &page);
    data["author"] = json!({
        "username": author.username,
        "name": author.display_name(),
    });
    data["stats"] = json!(stats);
    data["can_follow"] = json!(viewer.as_ref().map(|v| v.id != author.id).unwrap_or(false));

    state
        .views
        .page(viewer.as_ref(), &author.display_name(), "profile", &data)
}
