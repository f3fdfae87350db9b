use crate::{
    error::Result,
    models::post::PostFilter,
    routes::{page_param, posts::listing_context, redirect},
    state::AppState,
    utils::middleware::RequireAuth,
};
use axum::{
    extract::{Path, RawQuery, State},
    response::{Html, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/follow/", get(follow_index))
        .route("/:username/follow/", post(profile_follow))
        .route("/:username/unfollow/", post(profile_unfollow))
}

/// 关注的作者发布的帖子
/// GET /follow/
async fn follow_index(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    RawQuery(query): RawQuery,
) -> Result<Html<String>> {
    let page_number = page_param(query.as_deref());
    let page = state
        .post_service
        .list(
            PostFilter::FollowedBy(user.id),
            page_number.as_deref(),
            state.config.posts_per_page,
        )
        .await?;

    state.views.page(
        Some(&user),
        "Following",
        "follow",
        &listing_context(&state, &page),
    )
}

/// 关注用户
/// POST /:username/follow/
async fn profile_follow(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(username): Path<String>,
) -> Result<Response> {
    debug!("User {} following {}", user.username, username);

    let author = state.user_service.require_by_username(&username).await?;
    state.follow_service.follow(user.id, author.id).await?;

    Ok(redirect(&format!("/{}/", author.username)))
}

/// 取消关注用户
/// POST /:username/unfollow/
///
/// 用户名不存在时返回 404，与关注接口一致；只有未关注过该作者才按 500 处理
async fn profile_unfollow(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(username): Path<String>,
) -> Result<Response> {
    debug!("User {} unfollowing {}", user.username, username);

    let author = state.user_service.require_by_username(&username).await?;
    state.follow_service.unfollow(user.id, author.id).await?;

    Ok(redirect(&format!("/{}/", author.username)))
}
