//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, LoginRequest, NewUser, Role, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new account
    pub async fn signup(&self, request: CreateUser) -> AppResult<User> {
        request.validate()?;

        let role = request.role.unwrap_or(Role::Reader);
        if role == Role::Librarian && !self.config.allow_librarian_signup {
            return Err(AppError::Authorization(
                "Librarian accounts cannot be self-registered".to_string(),
            ));
        }

        let user = self
            .repository
            .users
            .create(NewUser {
                user_id: Uuid::new_v4(),
                username: request.username,
                password_hash: self.hash_password(&request.password)?,
                email: request.email,
                role,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(user_id = %user.user_id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Check credentials and issue a JWT
    pub async fn login(&self, request: LoginRequest) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_username(&request.username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !self.verify_password(&user, &request.password)? {
            tracing::debug!(username = %request.username, "Rejected login");
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let token = self.create_token(&user)?;
        Ok((token, user))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, user_id: Uuid) -> AppResult<User> {
        self.repository.users.get_by_id(user_id).await
    }

    fn create_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.config.jwt_expiration_hours as i64);

        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.user_id,
            role: user.role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
