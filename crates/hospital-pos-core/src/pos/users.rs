//! Operator registration and login.

use super::{hash_password, image_data_url, verify_password, PosApp, PosError, PosResult};
use crate::db::DbError;
use crate::models::User;
use crate::repository::PosStore;

impl<S: PosStore> PosApp<S> {
    pub fn register_user(
        &mut self,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> PosResult<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(PosError::MissingField("username"));
        }
        if password.is_empty() {
            return Err(PosError::MissingField("password"));
        }
        if password != confirm_password {
            return Err(PosError::PasswordMismatch);
        }
        if self.store.get_user(username)?.is_some() {
            return Err(PosError::DuplicateUsername(username.to_string()));
        }

        let user = User::new(username.to_string(), hash_password(password)?);
        self.store.insert_user(&user).map_err(|e| match e {
            DbError::Constraint(_) => PosError::DuplicateUsername(user.username.clone()),
            other => other.into(),
        })?;

        tracing::info!(username, "Registered user");
        Ok(user)
    }

    pub fn login(&self, username: &str, password: &str) -> PosResult<User> {
        let user = self
            .store
            .get_user(username.trim())?
            .filter(|user| verify_password(password, &user.password_hash))
            .ok_or(PosError::InvalidCredentials)?;

        tracing::info!(username = %user.username, "User logged in");
        Ok(user)
    }

    pub fn set_profile_image(
        &mut self,
        username: &str,
        bytes: &[u8],
        mime_type: &str,
    ) -> PosResult<User> {
        let username = username.trim();
        let mut user = self
            .store
            .get_user(username)?
            .ok_or_else(|| PosError::UserNotFound(username.to_string()))?;
        user.profile_image = Some(image_data_url(bytes, mime_type)?);

        if !self.store.update_user(&user)? {
            return Err(PosError::UserNotFound(username.to_string()));
        }
        Ok(user)
    }
}
