use crate::{
    error::{AppError, Result},
    models::user::{NewUser, User},
    services::{AuthService, Database},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// 用户服务，处理注册、查找和登录校验
#[derive(Clone)]
pub struct UserService {
    db: Arc<Database>,
    auth: AuthService,
}

impl UserService {
    pub fn new(db: Arc<Database>, auth: AuthService) -> Self {
        Self { db, auth }
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        debug!("Creating user: {}", new_user.username);

        if self.username_taken(&new_user.username).await? {
            return Err(AppError::BadRequest(
                "A user with that username already exists.".to_string(),
            ));
        }

        let password_hash = self.auth.hash_password(&new_user.password)?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, first_name, last_name, email, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, username, password_hash, first_name, last_name, email, created_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.email)
        .bind(Utc::now())
        .fetch_one(self.db.pool())
        .await?;

        info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(user)
    }

    /// 按用户名查找，不存在时返回 404
    pub async fn require_by_username(&self, username: &str) -> Result<User> {
        self.get_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count > 0)
    }

    /// 校验用户名和密码，失败时返回 `None`
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let user = match self.get_by_username(username).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        if self.auth.verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            debug!("Password mismatch for user {}", username);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    async fn service() -> UserService {
        let config = Config::default();
        let db = Database::new(&config).await.unwrap();
        db.run_migrations().await.unwrap();
        UserService::new(Arc::new(db), AuthService::new(&config))
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "correct horse".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let users = service().await;
        let user = users.create_user(new_user("Barney")).await.unwrap();

        assert!(users.username_taken("Barney").await.unwrap());
        assert!(!users.username_taken("Lola").await.unwrap());
        assert_eq!(users.get_by_id(user.id).await.unwrap().unwrap().username, "Barney");
        assert!(matches!(
            users.require_by_username("Lola").await,
            Err(AppError::NotFound(_))
        ));
        assert!(users.create_user(new_user("Barney")).await.is_err());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let users = service().await;
        users.create_user(new_user("Lola")).await.unwrap();

        assert!(users.authenticate("Lola", "correct horse").await.unwrap().is_some());
        assert!(users.authenticate("Lola", "wrong").await.unwrap().is_none());
        assert!(users.authenticate("Nobody", "correct horse").await.unwrap().is_none());
    }
}
