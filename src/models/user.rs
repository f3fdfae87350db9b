use crate::utils::{
    forms::RawForm,
    validation::{validate_not_blank, validate_password_strength, validate_username, FormErrors},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// 全名，未填写时退回用户名
    pub fn display_name(&self) -> String {
        let full_name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full_name = full_name.trim();
        if full_name.is_empty() {
            self.username.clone()
        } else {
            full_name.to_string()
        }
    }
}

/// 新用户数据，密码为明文，由服务层哈希
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// 个人主页上的统计
#[derive(Debug, Clone, Serialize)]
pub struct ProfileStats {
    pub post_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
    pub is_following: bool,
}

/// 注册表单
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct SignUpForm {
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub first_name: String,
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub last_name: String,
    #[validate(
        custom = "validate_username",
        length(max = 150, message = "Ensure this value has at most 150 characters.")
    )]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[serde(skip_serializing)]
    #[validate(custom = "validate_password_strength")]
    pub password: String,
}

impl SignUpForm {
    pub fn from_raw(raw: &RawForm) -> Self {
        Self {
            first_name: raw.text("first_name").trim().to_string(),
            last_name: raw.text("last_name").trim().to_string(),
            username: raw.text("username").trim().to_string(),
            email: raw.non_empty("email"),
            password: raw.text("password"),
        }
    }

    /// 校验表单，用户名唯一性由调用方检查
    pub fn clean(&self) -> Result<NewUser, FormErrors> {
        let errors = match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => FormErrors::from(e),
        };

        errors.into_result(NewUser {
            username: self.username.clone(),
            password: self.password.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone().unwrap_or_default(),
        })
    }
}

/// 登录表单
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct LoginForm {
    #[validate(custom = "validate_not_blank")]
    pub username: String,
    #[serde(skip_serializing)]
    #[validate(custom = "validate_not_blank")]
    pub password: String,
    pub next: Option<String>,
}

impl LoginForm {
    pub fn from_raw(raw: &RawForm) -> Self {
        Self {
            username: raw.text("username").trim().to_string(),
            password: raw.text("password"),
            next: raw.non_empty("next"),
        }
    }

    pub fn clean(&self) -> Result<(), FormErrors> {
        match self.validate() {
            Ok(()) => Ok(()),
            Err(e) => Err(FormErrors::from(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> User {
        User {
            id: 1,
            username: "Barney".to_string(),
            password_hash: String::new(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(user("", "").display_name(), "Barney");
        assert_eq!(user("Barney", "Stinson").display_name(), "Barney Stinson");
        assert_eq!(user("Barney", " ").display_name(), "Barney");
    }

    #[test]
    fn test_signup_form_clean() {
        let raw = RawForm::from_pairs([
            ("first_name", "Lola"),
            ("last_name", ""),
            ("username", " Lola "),
            ("email", ""),
            ("password", "long enough pass"),
        ]);
        let new_user = SignUpForm::from_raw(&raw).clean().unwrap();
        assert_eq!(new_user.username, "Lola");
        assert_eq!(new_user.email, "");

        let raw = RawForm::from_pairs([
            ("username", "bad name"),
            ("email", "not-an-email"),
            ("password", "123"),
        ]);
        let errors = SignUpForm::from_raw(&raw).clean().unwrap_err();
        assert!(errors.has("username"));
        assert!(errors.has("email"));
        assert!(errors.has("password"));
    }

    #[test]
    fn test_login_form_requires_both_fields() {
        let raw = RawForm::from_pairs([("username", "Barney"), ("next", "/new/")]);
        let form = LoginForm::from_raw(&raw);
        assert_eq!(form.next.as_deref(), Some("/new/"));
        let errors = form.clean().unwrap_err();
        assert!(errors.has("password"));
        assert!(!errors.has("username"));
    }
}
