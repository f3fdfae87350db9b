use crate::{
    error::{AppError, Result},
    models::{comment::CommentForm, post::PostView, user::User},
    routes::{parse_post_id, redirect},
    state::AppState,
    utils::{forms::RawForm, middleware::RequireAuth, validation::FormErrors},
    views::form_context,
};
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/:username/:post_id/comment/",
        get(comment_form).post(add_comment),
    )
}

fn render_comment_form(
    state: &AppState,
    user: &User,
    action: &str,
    form: &CommentForm,
    errors: &FormErrors,
) -> Result<Html<String>> {
    let mut form = form_context(form, errors)?;
    form["action"] = action.into();
    state.views.page(
        Some(user),
        "Add a comment",
        "comments",
        &serde_json::json!({ "form": form }),
    )
}

async fn comment_target(state: &AppState, username: &str, raw_post_id: &str) -> Result<PostView> {
    let post_id = parse_post_id(raw_post_id)?;
    state
        .post_service
        .get_by_author_and_id(username, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} by {} not found", post_id, username)))
}

fn post_url(post: &PostView) -> String {
    format!("/{}/{}/", post.author_username, post.id)
}

/// 评论表单
/// GET /:username/:post_id/comment/
async fn comment_form(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path((username, post_id)): Path<(String, String)>,
) -> Result<Html<String>> {
    let post = comment_target(&state, &username, &post_id).await?;
    render_comment_form(
        &state,
        &user,
        &format!("{}comment/", post_url(&post)),
        &CommentForm::default(),
        &FormErrors::new(),
    )
}

/// 添加评论
/// POST /:username/:post_id/comment/
async fn add_comment(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path((username, post_id)): Path<(String, String)>,
    raw: RawForm,
) -> Result<Response> {
    let post = comment_target(&state, &username, &post_id).await?;
    let form = CommentForm::from_raw(&raw);

    match form.clean() {
        Ok(draft) => {
            state
                .comment_service
                .create(post.id, user.id, &draft.text)
                .await?;
            Ok(redirect(&post_url(&post)))
        }
        Err(errors) => Ok(render_comment_form(
            &state,
            &user,
            &format!("{}comment/", post_url(&post)),
            &form,
            &errors,
        )?
        .into_response()),
    }
}
