#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use rainbow_posts::{
    app,
    config::Config,
    models::{group::Group, group::NewGroup, post::NewPost, post::Post, user::NewUser, user::User},
    state::AppState,
    utils::forms::UploadedFile,
};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// 1x1 GIF
pub const TINY_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0xFF, 0xFF,
    0xFF, 0x00, 0x00, 0x00, 0x21, 0xF9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3B,
];

pub const PASSWORD: &str = "correct horse battery";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
    }
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
    _media: TempDir,
}

pub struct TestUser {
    pub user: User,
    pub cookie: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let media = tempfile::tempdir().expect("temp media dir");
        let config = Config {
            media_root: media.path().to_string_lossy().into_owned(),
            ..Config::default()
        };
        let state = Arc::new(AppState::new(config).await.expect("app state"));
        let router = app(state.clone());

        Self {
            state,
            router,
            _media: media,
        }
    }

    pub async fn user(&self, username: &str) -> TestUser {
        let user = self
            .state
            .user_service
            .create_user(NewUser {
                username: username.to_string(),
                password: PASSWORD.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
            })
            .await
            .expect("create user");
        let token = self.state.auth_service.issue_token(user.id).expect("token");

        TestUser {
            cookie: format!("{}={}", self.state.config.session_cookie_name, token),
            user,
        }
    }

    pub async fn group(&self, title: &str, slug: &str) -> Group {
        self.state
            .group_service
            .create(NewGroup {
                title: title.to_string(),
                slug: Some(slug.to_string()),
                description: String::new(),
            })
            .await
            .expect("create group")
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>, with_image: bool) -> Post {
        let image = if with_image {
            let file = UploadedFile {
                file_name: Some("pixel.gif".to_string()),
                content_type: Some("image/gif".to_string()),
                data: TINY_GIF.to_vec(),
            };
            Some(
                self.state
                    .media_service
                    .save_post_image(&file)
                    .await
                    .expect("save image"),
            )
        } else {
            None
        };

        self.state
            .post_service
            .create(
                author.id,
                NewPost {
                    text: text.to_string(),
                    group_id: group.map(|g| g.id),
                    image,
                },
            )
            .await
            .expect("create post")
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = hyper::body::to_bytes(response.into_body())
            .await
            .expect("read body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&self, path: &str, user: Option<&TestUser>) -> TestResponse {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(user) = user {
            builder = builder.header(header::COOKIE, &user.cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, path: &str, user: Option<&TestUser>, fields: &[(&str, &str)]) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(user) = user {
            builder = builder.header(header::COOKIE, &user.cookie);
        }
        let body = serde_urlencoded::to_string(fields).unwrap();
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// multipart 表单，可附带一个图片字段
    pub async fn post_multipart(
        &self,
        path: &str,
        user: Option<&TestUser>,
        fields: &[(&str, &str)],
        image: Option<(&str, &[u8])>,
    ) -> TestResponse {
        const BOUNDARY: &str = "RAINBOWTESTBOUNDARY";
        let mut body: Vec<u8> = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        if let Some((filename, data)) = image {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    BOUNDARY, filename
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            );
        if let Some(user) = user {
            builder = builder.header(header::COOKIE, &user.cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    pub async fn post_count(&self) -> usize {
        self.state.post_service.count_all().await.unwrap()
    }
}
