//! User account database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::User;
use crate::repository::UserRepository;

impl UserRepository for Database {
    fn insert_user(&mut self, user: &User) -> DbResult<()> {
        let result = self.conn.execute(
            r#"
            INSERT INTO users (username, password_hash, profile_image, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                user.username,
                user.password_hash,
                user.profile_image,
                user.created_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(DbError::Constraint(format!(
                    "username already exists: {}",
                    user.username
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_user(&self, username: &str) -> DbResult<Option<User>> {
        self.conn
            .query_row(
                r#"
                SELECT username, password_hash, profile_image, created_at
                FROM users
                WHERE username = ?
                "#,
                [username],
                |row| {
                    Ok(User {
                        username: row.get(0)?,
                        password_hash: row.get(1)?,
                        profile_image: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    fn update_user(&mut self, user: &User) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE users SET password_hash = ?2, profile_image = ?3 WHERE username = ?1",
            params![user.username, user.password_hash, user.profile_image],
        )?;
        Ok(rows_affected > 0)
    }
}
