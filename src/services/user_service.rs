use sqlx::PgPool;

use crate::database::models::{Role, User, REDACTED_PASSWORD};
use crate::database::repository::{RoleRepository, UserRepository};
use crate::error::AppError;
use crate::services::password;

/// User and role management on top of the repositories. Constructed per
/// request from the tenant's pool.
pub struct UserService {
    users: UserRepository,
    roles: RoleRepository,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            roles: RoleRepository::new(pool),
        }
    }

    /// Verify a username/password pair. Unknown users and wrong passwords
    /// are indistinguishable to the caller.
    pub async fn check_credentials(&self, username: &str, pass: &str) -> Result<bool, AppError> {
        match self.users.find_by_username(username).await? {
            Some(user) => Ok(password::verify_password(pass, &user.password)),
            None => Ok(false),
        }
    }

    /// Persist a new user with a hashed password. The returned entity has
    /// the password redacted and no roles.
    pub async fn create_user(&self, mut user: User) -> Result<User, AppError> {
        user.password = password::hash_password(&user.password)?;
        let mut created = self.users.save(&user).await?;
        created.roles = vec![];
        created.password = REDACTED_PASSWORD.to_string();
        Ok(created)
    }

    /// Update the user row, then resync the `user_role` assignments to the
    /// roles carried on the entity.
    pub async fn update_user(&self, mut user: User) -> Result<User, AppError> {
        user.password = password::hash_password(&user.password)?;
        self.users.update(&user).await?;

        let id = user.id.ok_or(crate::database::DbError::MissingId)?;
        self.users.delete_user_roles(id).await?;
        for role in &user.roles {
            if let Some(role_id) = role.id {
                self.users.save_user_role(id, role_id).await?;
            }
        }

        user.roles = self.roles.find_by_user(id).await?;
        user.password = REDACTED_PASSWORD.to_string();
        Ok(user)
    }

    /// All users with their roles attached, passwords redacted.
    pub async fn get_all_users(&self) -> Result<Vec<User>, AppError> {
        let mut users = self.users.find_all().await?;
        for user in &mut users {
            if let Some(id) = user.id {
                user.roles = self.roles.find_by_user(id).await?;
            }
            user.password = REDACTED_PASSWORD.to_string();
        }
        Ok(users)
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<User, AppError> {
        let mut user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::IndexNotFound("User not found".to_string()))?;
        user.roles = self.roles.find_by_user(id).await?;
        Ok(user)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<User, AppError> {
        let mut user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::IndexNotFound("User not found".to_string()))?;
        if let Some(id) = user.id {
            user.roles = self.roles.find_by_user(id).await?;
        }
        Ok(user)
    }

    pub async fn get_role_by_id(&self, id: i64) -> Result<Role, AppError> {
        self.roles
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::IndexNotFound("Role not found".to_string()))
    }

    /// Delete a user and their role assignments. Returns the number of
    /// deleted user rows.
    pub async fn delete_user_by_id(&self, id: i64) -> Result<u64, AppError> {
        self.users.delete_user_roles(id).await?;
        let deleted = self.users.delete_by_id(id).await?;
        if deleted == 0 {
            return Err(AppError::IndexNotFound("User not found".to_string()));
        }
        Ok(deleted)
    }
}
