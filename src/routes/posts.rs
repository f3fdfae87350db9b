use crate::{
    error::{AppError, Result},
    models::{
        group::Group,
        post::{ImageChange, NewPost, PostChanges, PostFilter, PostForm, PostView},
        user::User,
    },
    routes::{page_param, parse_post_id, redirect},
    services::database::Page,
    state::AppState,
    utils::{
        cache::page_key,
        forms::RawForm,
        middleware::{OptionalAuth, RequireAuth},
        validation::FormErrors,
    },
    views::{form_context, group_options, Paginator, PostCard},
};
use axum::{
    extract::{Path, RawQuery, State},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/new/", get(new_post_form).post(new_post))
        .route("/:username/:post_id/", get(post_view))
        .route("/:username/:post_id/edit/", get(post_edit_form).post(post_edit))
}

/// 帖子列表页面共用的模板数据
pub(crate) fn listing_context(state: &AppState, page: &Page<PostView>) -> Value {
    json!({
        "posts": PostCard::from_page(page, &state.media_service),
        "paginator": Paginator::from(page),
    })
}

struct PostFormPage<'a> {
    header_name: &'a str,
    action: String,
    form: &'a PostForm,
    errors: &'a FormErrors,
    groups: &'a [Group],
    edit_mode: bool,
    current_image: Option<String>,
}

fn render_post_form(state: &AppState, viewer: &User, page: PostFormPage<'_>) -> Result<Html<String>> {
    let data = json!({
        "header_name": page.header_name,
        "action": page.action,
        "form": form_context(page.form, page.errors)?,
        "groups": group_options(page.groups, page.form.selected_group()),
        "edit_mode": page.edit_mode,
        "current_image": page.current_image,
    });
    state
        .views
        .page(Some(viewer), page.header_name, "new_post", &data)
}

/// 首页，列表部分按查询串缓存
/// GET /
async fn index(
    State(state): State<Arc<AppState>>,
    OptionalAuth(viewer): OptionalAuth,
    RawQuery(query): RawQuery,
) -> Result<Html<String>> {
    let key = page_key(&state.config.index_cache_prefix, query.as_deref());

    let content = match state.page_cache.get(&key) {
        Some(content) => {
            debug!("Serving index from cache: {}", key);
            content
        }
        None => {
            let page_number = page_param(query.as_deref());
            let page = state
                .post_service
                .list(PostFilter::All, page_number.as_deref(), state.config.posts_per_page)
                .await?;
            let content = state.views.render("index", &listing_context(&state, &page))?;
            state.page_cache.set(key, content.clone());
            content
        }
    };

    Ok(Html(state.views.layout(viewer.as_ref(), "Latest posts", &content)?))
}

/// 发布帖子表单
/// GET /new/
async fn new_post_form(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
) -> Result<Html<String>> {
    let groups = state.group_service.list_all().await?;
    render_post_form(
        &state,
        &user,
        PostFormPage {
            header_name: "New post",
            action: "/new/".to_string(),
            form: &PostForm::default(),
            errors: &FormErrors::new(),
            groups: &groups,
            edit_mode: false,
            current_image: None,
        },
    )
}

/// 发布帖子
/// POST /new/
async fn new_post(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    raw: RawForm,
) -> Result<Response> {
    let groups = state.group_service.list_all().await?;
    let form = PostForm::from_raw(&raw);

    let draft = match form.clean(
        &groups,
        &state.config.allowed_image_extensions(),
        state.config.max_upload_size,
    ) {
        Ok(draft) => draft,
        Err(errors) => {
            debug!("Rejected new post from {}: {:?}", user.username, errors);
            return Ok(render_post_form(
                &state,
                &user,
                PostFormPage {
                    header_name: "New post",
                    action: "/new/".to_string(),
                    form: &form,
                    errors: &errors,
                    groups: &groups,
                    edit_mode: false,
                    current_image: None,
                },
            )?
            .into_response());
        }
    };

    let image = match &draft.image {
        Some(file) => Some(state.media_service.save_post_image(file).await?),
        None => None,
    };
    state
        .post_service
        .create(
            user.id,
            NewPost {
                text: draft.text,
                group_id: draft.group_id,
                image,
            },
        )
        .await?;

    Ok(redirect("/"))
}

async fn find_post(state: &AppState, username: &str, raw_post_id: &str) -> Result<PostView> {
    let post_id = parse_post_id(raw_post_id)?;
    state
        .post_service
        .get_by_author_and_id(username, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} by {} not found", post_id, username)))
}

/// 帖子详情和评论
/// GET /:username/:post_id/
async fn post_view(
    State(state): State<Arc<AppState>>,
    OptionalAuth(viewer): OptionalAuth,
    Path((username, post_id)): Path<(String, String)>,
) -> Result<Html<String>> {
    let post = find_post(&state, &username, &post_id).await?;
    let count = state.post_service.count_by_author(post.author_id).await?;
    let comments = state.comment_service.list_for_post(post.id).await?;
    let card = PostCard::new(&post, &state.media_service);

    let mut form = form_context(&json!({ "text": "" }), &FormErrors::new())?;
    form["action"] = json!(card.comment_url);

    let data = json!({
        "author": {
            "username": post.author_username,
            "name": post.author_display_name(),
        },
        "count": count,
        "comments": comments.iter().map(|comment| json!({
            "author_username": comment.author_username,
            "text": comment.text,
            "created_at": comment.created_at.format("%d %b %Y %H:%M").to_string(),
        })).collect::<Vec<_>>(),
        "is_author": viewer.as_ref().map(|v| v.id == post.author_id).unwrap_or(false),
        "viewer_authenticated": viewer.is_some(),
        "form": form,
        "post": card,
    });

    state
        .views
        .page(viewer.as_ref(), &format!("Post by {}", post.author_username), "post", &data)
}

fn edit_page<'a>(
    state: &AppState,
    post: &PostView,
    form: &'a PostForm,
    errors: &'a FormErrors,
    groups: &'a [Group],
) -> PostFormPage<'a> {
    PostFormPage {
        header_name: "Edit post",
        action: format!("/{}/{}/edit/", post.author_username, post.id),
        form,
        errors,
        groups,
        edit_mode: true,
        current_image: post.image.as_deref().map(|path| state.media_service.url(path)),
    }
}

/// 编辑帖子表单
/// GET /:username/:post_id/edit/
async fn post_edit_form(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path((username, post_id)): Path<(String, String)>,
) -> Result<Html<String>> {
    let post = find_post(&state, &username, &post_id).await?;
    let groups = state.group_service.list_all().await?;
    let form = PostForm::from_post(&post);
    let errors = FormErrors::new();

    render_post_form(&state, &user, edit_page(&state, &post, &form, &errors, &groups))
}

/// 保存帖子修改，只有作者可以修改
/// POST /:username/:post_id/edit/
async fn post_edit(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path((username, post_id)): Path<(String, String)>,
    raw: RawForm,
) -> Result<Response> {
    let post = find_post(&state, &username, &post_id).await?;
    let groups = state.group_service.list_all().await?;
    let form = PostForm::from_raw(&raw);

    if post.author_id != user.id {
        debug!("User {} may not edit post {}", user.username, post.id);
        let errors = FormErrors::new();
        return Ok(
            render_post_form(&state, &user, edit_page(&state, &post, &form, &errors, &groups))?
                .into_response(),
        );
    }

    let draft = match form.clean(
        &groups,
        &state.config.allowed_image_extensions(),
        state.config.max_upload_size,
    ) {
        Ok(draft) => draft,
        Err(errors) => {
            return Ok(
                render_post_form(&state, &user, edit_page(&state, &post, &form, &errors, &groups))?
                    .into_response(),
            );
        }
    };

    let image = match (&draft.image, draft.clear_image) {
        (Some(file), _) => ImageChange::Replace(state.media_service.save_post_image(file).await?),
        (None, true) => ImageChange::Clear,
        (None, false) => ImageChange::Keep,
    };
    let updated = state
        .post_service
        .update(
            post.id,
            PostChanges {
                text: draft.text,
                group_id: draft.group_id,
                image,
            },
        )
        .await?;
    info!("User {} edited post {}", user.username, updated.id);

    Ok(redirect(&format!("/{}/{}/", post.author_username, updated.id)))
}
