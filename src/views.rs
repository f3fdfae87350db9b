use crate::{
    error::Result,
    models::{group::Group, post::PostView, user::User},
    services::{database::Page, MediaService},
    utils::validation::FormErrors,
};
use axum::{http::StatusCode, response::Html};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

const TEMPLATES: &[(&str, &str)] = &[
    ("base", include_str!("../templates/base.hbs")),
    ("index", include_str!("../templates/index.hbs")),
    ("group", include_str!("../templates/group.hbs")),
    ("profile", include_str!("../templates/profile.hbs")),
    ("post", include_str!("../templates/post.hbs")),
    ("new_post", include_str!("../templates/new_post.hbs")),
    ("comments", include_str!("../templates/comments.hbs")),
    ("follow", include_str!("../templates/follow.hbs")),
    ("misc/404", include_str!("../templates/misc/404.hbs")),
    ("misc/500", include_str!("../templates/misc/500.hbs")),
    ("auth/login", include_str!("../templates/auth/login.hbs")),
    ("auth/signup", include_str!("../templates/auth/signup.hbs")),
    ("auth/logged_out", include_str!("../templates/auth/logged_out.hbs")),
];

const PARTIALS: &[(&str, &str)] = &[
    ("post_item", include_str!("../templates/partials/post_item.hbs")),
    ("paginator", include_str!("../templates/partials/paginator.hbs")),
    ("comment_form", include_str!("../templates/partials/comment_form.hbs")),
];

/// 页面渲染器，模板在编译期嵌入
#[derive(Clone)]
pub struct Views {
    handlebars: Arc<Handlebars<'static>>,
}

impl Views {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        for (name, source) in TEMPLATES {
            handlebars.register_template_string(name, source)?;
        }
        for (name, source) in PARTIALS {
            handlebars.register_partial(name, source)?;
        }

        Ok(Self {
            handlebars: Arc::new(handlebars),
        })
    }

    /// 只渲染页面主体，不含布局
    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String> {
        Ok(self.handlebars.render(template, data)?)
    }

    /// 把已渲染的主体放进基础布局
    pub fn layout(&self, viewer: Option<&User>, title: &str, content: &str) -> Result<String> {
        let data = json!({
            "title": title,
            "content": content,
            "viewer": viewer.map(|user| json!({
                "username": user.username,
                "name": user.display_name(),
            })),
        });
        self.render("base", &data)
    }

    pub fn page<T: Serialize>(
        &self,
        viewer: Option<&User>,
        title: &str,
        template: &str,
        data: &T,
    ) -> Result<Html<String>> {
        let content = self.render(template, data)?;
        Ok(Html(self.layout(viewer, title, &content)?))
    }

    /// 404 和 500 页面
    pub fn error_page(&self, status: StatusCode, path: &str, viewer: Option<&User>) -> Result<String> {
        let (template, title) = if status == StatusCode::NOT_FOUND {
            ("misc/404", "Page not found")
        } else if status.is_server_error() {
            ("misc/500", "Server error")
        } else {
            ("misc/500", status.canonical_reason().unwrap_or("Bad request"))
        };
        let content = self.render(
            template,
            &json!({
                "path": path,
                "status": status.as_u16(),
                "reason": status.canonical_reason().unwrap_or_default(),
            }),
        )?;
        self.layout(viewer, title, &content)
    }
}

/// 列表中的一条帖子
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub id: i64,
    pub text: String,
    pub author_username: String,
    pub author_name: String,
    pub group_title: Option<String>,
    pub group_url: Option<String>,
    pub created_at: String,
    pub image_url: Option<String>,
    pub post_url: String,
    pub profile_url: String,
    pub comment_url: String,
    pub edit_url: String,
    pub comment_count: i64,
}

impl PostCard {
    pub fn new(post: &PostView, media: &MediaService) -> Self {
        let profile_url = format!("/{}/", post.author_username);
        let post_url = format!("{}{}/", profile_url, post.id);
        Self {
            id: post.id,
            text: post.text.clone(),
            author_username: post.author_username.clone(),
            author_name: post.author_display_name(),
            group_title: post.group_title.clone(),
            group_url: post.group_slug.as_ref().map(|slug| format!("/group/{}/", slug)),
            created_at: post.created_at.format("%d %b %Y").to_string(),
            image_url: post.image.as_deref().map(|path| media.url(path)),
            comment_url: format!("{}comment/", post_url),
            edit_url: format!("{}edit/", post_url),
            post_url,
            profile_url,
            comment_count: post.comment_count,
        }
    }

    pub fn from_page(page: &Page<PostView>, media: &MediaService) -> Vec<Self> {
        page.items.iter().map(|post| Self::new(post, media)).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageLink {
    pub number: usize,
    pub current: bool,
}

/// 分页导航
#[derive(Debug, Clone, Serialize)]
pub struct Paginator {
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_page: usize,
    pub next_page: usize,
    pub links: Vec<PageLink>,
}

impl<T> From<&Page<T>> for Paginator {
    fn from(page: &Page<T>) -> Self {
        Self {
            page: page.page,
            total_pages: page.total_pages,
            total: page.total,
            has_prev: page.has_prev(),
            has_next: page.has_next(),
            prev_page: page.page.saturating_sub(1).max(1),
            next_page: (page.page + 1).min(page.total_pages),
            links: (1..=page.total_pages)
                .map(|number| PageLink {
                    number,
                    current: number == page.page,
                })
                .collect(),
        }
    }
}

/// 表单中分组下拉框的选项
#[derive(Debug, Clone, Serialize)]
pub struct GroupOption {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

pub fn group_options(groups: &[Group], selected: Option<i64>) -> Vec<GroupOption> {
    groups
        .iter()
        .map(|group| GroupOption {
            id: group.id,
            title: group.title.clone(),
            selected: Some(group.id) == selected,
        })
        .collect()
}

/// 表单的错误和已提交的值，供模板回填
pub fn form_context<T: Serialize>(form: &T, errors: &FormErrors) -> Result<Value> {
    Ok(json!({
        "values": serde_json::to_value(form)?,
        "errors": errors,
        "has_errors": !errors.is_empty(),
    }))
}
