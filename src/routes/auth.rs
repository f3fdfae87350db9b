use crate::{
    error::Result,
    models::user::{LoginForm, SignUpForm, User},
    state::AppState,
    utils::{
        forms::RawForm,
        middleware::{safe_next, OptionalAuth},
        validation::{FormErrors, NON_FIELD},
    },
    views::form_context,
};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login/", get(login_form).post(login))
        .route("/auth/signup/", get(signup_form).post(signup))
        .route("/auth/logout/", get(logout).post(logout))
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// 写入会话 cookie 并跳转
fn start_session(state: &AppState, user: &User, location: &str) -> Result<Response> {
    let token = state.auth_service.issue_token(user.id)?;
    info!("User {} logged in", user.username);
    Ok((
        StatusCode::FOUND,
        [
            (header::SET_COOKIE, state.auth_service.session_cookie(&token)),
            (header::LOCATION, location.to_string()),
        ],
    )
        .into_response())
}

fn render_login(
    state: &AppState,
    viewer: Option<&User>,
    form: &LoginForm,
    errors: &FormErrors,
) -> Result<Html<String>> {
    let data = json!({
        "form": form_context(form, errors)?,
        "next": form.next.clone().unwrap_or_default(),
    });
    state.views.page(viewer, "Log in", "auth/login", &data)
}

/// 登录页面
/// GET /auth/login/
async fn login_form(
    State(state): State<Arc<AppState>>,
    OptionalAuth(viewer): OptionalAuth,
    Query(query): Query<NextQuery>,
) -> Result<Html<String>> {
    let form = LoginForm {
        next: query.next,
        ..LoginForm::default()
    };
    render_login(&state, viewer.as_ref(), &form, &FormErrors::new())
}

/// 登录
/// POST /auth/login/
async fn login(
    State(state): State<Arc<AppState>>,
    OptionalAuth(viewer): OptionalAuth,
    raw: RawForm,
) -> Result<Response> {
    let form = LoginForm::from_raw(&raw);
    if let Err(errors) = form.clean() {
        return Ok(render_login(&state, viewer.as_ref(), &form, &errors)?.into_response());
    }

    match state
        .user_service
        .authenticate(&form.username, &form.password)
        .await?
    {
        Some(user) => start_session(&state, &user, &safe_next(form.next.as_deref())),
        None => {
            warn!("Failed login attempt for {}", form.username);
            let mut errors = FormErrors::new();
            errors.add(NON_FIELD, INVALID_LOGIN);
            Ok(render_login(&state, viewer.as_ref(), &form, &errors)?.into_response())
        }
    }
}

fn render_signup(
    state: &AppState,
    viewer: Option<&User>,
    form: &SignUpForm,
    errors: &FormErrors,
) -> Result<Html<String>> {
    let data = json!({ "form": form_context(form, errors)? });
    state.views.page(viewer, "Sign up", "auth/signup", &data)
}

/// 注册页面
/// GET /auth/signup/
async fn signup_form(
    State(state): State<Arc<AppState>>,
    OptionalAuth(viewer): OptionalAuth,
) -> Result<Html<String>> {
    render_signup(&state, viewer.as_ref(), &SignUpForm::default(), &FormErrors::new())
}

/// 注册并登录
/// POST /auth/signup/
async fn signup(
    State(state): State<Arc<AppState>>,
    OptionalAuth(viewer): OptionalAuth,
    raw: RawForm,
) -> Result<Response> {
    let form = SignUpForm::from_raw(&raw);
    let mut errors = FormErrors::new();

    let new_user = match form.clean() {
        Ok(new_user) => Some(new_user),
        Err(form_errors) => {
            errors.merge(form_errors);
            None
        }
    };
    if !errors.has("username") && state.user_service.username_taken(&form.username).await? {
        errors.add("username", USERNAME_TAKEN);
    }

    match new_user {
        Some(new_user) if errors.is_empty() => {
            let user = state.user_service.create_user(new_user).await?;
            start_session(&state, &user, "/")
        }
        _ => Ok(render_signup(&state, viewer.as_ref(), &form, &errors)?.into_response()),
    }
}

/// 退出登录
/// GET /auth/logout/
async fn logout(State(state): State<Arc<AppState>>) -> Result<Response> {
    let html = state
        .views
        .page(None, "Logged out", "auth/logged_out", &json!({}))?;
    Ok((
        [(header::SET_COOKIE, state.auth_service.clear_cookie())],
        html,
    )
        .into_response())
}
