use crate::utils::{
    forms::RawForm,
    validation::{validate_not_blank, FormErrors},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub author_id: i64,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
}

/// 带作者信息的评论
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommentView {
    pub id: i64,
    pub text: String,
    pub author_id: i64,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
    pub author_username: String,
}

/// 校验通过的评论，帖子和作者由调用方指定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct CommentForm {
    #[validate(custom = "validate_not_blank")]
    pub text: String,
}

impl CommentForm {
    pub fn from_raw(raw: &RawForm) -> Self {
        Self {
            text: raw.text("text"),
        }
    }

    pub fn clean(&self) -> Result<CommentDraft, FormErrors> {
        match self.validate() {
            Ok(()) => Ok(CommentDraft {
                text: self.text.trim().to_string(),
            }),
            Err(e) => Err(FormErrors::from(e)),
        }
    }
}
