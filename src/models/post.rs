use crate::{
    models::group::Group,
    utils::{
        forms::{RawForm, UploadedFile},
        image::ImageProcessor,
        validation::{validate_not_blank, FormErrors, INVALID_CHOICE, INVALID_IMAGE},
    },
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    /// 相对于媒体目录的图片路径
    pub image: Option<String>,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// 列表和详情页使用的帖子行，带作者、分组和评论数
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PostView {
    pub id: i64,
    pub text: String,
    pub image: Option<String>,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
    pub comment_count: i64,
}

impl PostView {
    pub fn author_display_name(&self) -> String {
        let full_name = format!("{} {}", self.author_first_name.trim(), self.author_last_name.trim());
        let full_name = full_name.trim();
        if full_name.is_empty() {
            self.author_username.clone()
        } else {
            full_name.to_string()
        }
    }
}

/// 帖子列表的过滤条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// 指定用户关注的所有作者的帖子
    FollowedBy(i64),
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// 编辑帖子时对图片的处理
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageChange {
    Keep,
    Clear,
    Replace(String),
}

#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: ImageChange,
}

/// 帖子表单：分组可选、正文必填、图片可选
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct PostForm {
    pub group: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub text: String,
    #[serde(skip)]
    pub image: Option<UploadedFile>,
    pub clear_image: bool,
}

/// 校验通过、尚未保存的帖子，作者由调用方指定
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<UploadedFile>,
    pub clear_image: bool,
}

impl PostForm {
    pub fn from_raw(raw: &RawForm) -> Self {
        Self {
            group: raw.non_empty("group"),
            text: raw.text("text"),
            image: raw.file("image").cloned(),
            clear_image: raw.is_checked("image-clear"),
        }
    }

    /// 编辑页面的初始值
    pub fn from_post(post: &PostView) -> Self {
        Self {
            group: post.group_id.map(|id| id.to_string()),
            text: post.text.clone(),
            image: None,
            clear_image: false,
        }
    }

    pub fn selected_group(&self) -> Option<i64> {
        self.group.as_deref().and_then(|g| g.parse().ok())
    }

    /// 校验表单，`groups` 为可选的分组
    pub fn clean(
        &self,
        groups: &[Group],
        allowed_image_extensions: &[String],
        max_image_size: usize,
    ) -> Result<PostDraft, FormErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => FormErrors::from(e),
        };

        let group_id = match self.group.as_deref() {
            None => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    errors.add("group", INVALID_CHOICE);
                    None
                }
            },
        };

        if let Some(image) = &self.image {
            if ImageProcessor::validate_image(
                &image.data,
                allowed_image_extensions,
                Some(max_image_size),
            )
            .is_err()
            {
                errors.add("image", INVALID_IMAGE);
            }
        }

        errors.into_result(PostDraft {
            text: self.text.trim().to_string(),
            group_id,
            image: self.image.clone(),
            clear_image: self.clear_image,
        })
    }
}
