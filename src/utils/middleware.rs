use crate::{
    error::{AppError, ErrorPage},
    models::user::User,
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    headers::{authorization::Bearer, Authorization, Cookie, HeaderMapExt},
    http::{header, request::Parts, HeaderMap, HeaderValue, Request, StatusCode, Uri},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// 从 Authorization 头或会话 cookie 中取出令牌
fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }

    headers
        .typed_get::<Cookie>()
        .and_then(|cookie| cookie.get(cookie_name).map(str::to_string))
        .filter(|token| !token.is_empty())
}

/// 认证中间件：令牌有效时把当前用户放入请求扩展，否则按匿名请求继续
pub async fn auth_middleware(
    State(app_state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next<Body>,
) -> Response {
    if let Some(token) = session_token(request.headers(), app_state.auth_service.cookie_name()) {
        match app_state
            .auth_service
            .verify_token(&token)
            .and_then(|claims| claims.user_id())
        {
            Ok(user_id) => match app_state.user_service.get_by_id(user_id).await {
                Ok(Some(user)) => {
                    debug!("Authenticated user: {} ({})", user.username, user.id);
                    request.extensions_mut().insert(user);
                }
                Ok(None) => warn!("Session token refers to missing user {}", user_id),
                Err(e) => warn!("Failed to load user {}: {}", user_id, e),
            },
            Err(e) => debug!("Ignoring invalid session token: {}", e),
        }
    }

    next.run(request).await
}

/// 把带有 `ErrorPage` 标记的响应渲染成 404/500 页面
pub async fn error_pages_middleware(
    State(app_state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next<Body>,
) -> Response {
    let path = request.uri().path().to_string();
    let viewer = request.extensions().get::<User>().cloned();

    let response = next.run(request).await;
    let status = match response.extensions().get::<ErrorPage>() {
        Some(marker) => marker.status,
        // 路由层直接返回的 405 没有标记
        None if response.status() == StatusCode::METHOD_NOT_ALLOWED => response.status(),
        None => return response,
    };

    match app_state.views.error_page(status, &path, viewer.as_ref()) {
        Ok(html) => {
            let mut page = (status, Html(html)).into_response();
            if let Some(allow) = response.headers().get(header::ALLOW) {
                page.headers_mut().insert(header::ALLOW, allow.clone());
            }
            page
        }
        Err(e) => {
            error!("Failed to render error page for {}: {}", path, e);
            response
        }
    }
}

/// 安全头中间件
pub async fn security_headers_middleware(request: Request<Body>, next: Next<Body>) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

/// 登录页地址，带上当前请求的路径作为 `next`
pub fn login_redirect(login_url: &str, uri: &Uri) -> String {
    let next = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    format!(
        "{}?next={}",
        login_url,
        urlencoding::encode(next).replace("%2F", "/")
    )
}

/// 只接受本站路径作为登录后的跳转目标
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

/// 可选认证提取器
pub struct OptionalAuth(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(parts.extensions.get::<User>().cloned()))
    }
}

/// 必须登录，否则跳转到登录页
pub struct RequireAuth(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<User>() {
            Some(user) => Ok(RequireAuth(user.clone())),
            None => {
                debug!("Anonymous request to {} requires login", parts.uri.path());
                Err(AppError::LoginRequired(login_redirect(
                    &state.config.login_url,
                    &parts.uri,
                )))
            }
        }
    }
}
