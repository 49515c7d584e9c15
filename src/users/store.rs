// src/users/store.rs

use chrono::Utc;
use sqlx::SqlitePool;

use super::types::{Role, RoleName, UserResponse, UserRow};
use crate::error::{PdmsError, PdmsResult};
use crate::page::{Page, PageParams};

pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        role_ids: &[i64],
    ) -> PdmsResult<UserResponse> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (email, password_hash, name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        for role_id in role_ids {
            sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
                .bind(id)
                .bind(role_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.get(id)
            .await?
            .ok_or_else(|| PdmsError::internal("User vanished after insert"))
    }

    pub async fn get(&self, id: i64) -> PdmsResult<Option<UserResponse>> {
        match self.get_row(id).await? {
            Some(row) => {
                let roles = self.roles_for(row.id).await?;
                Ok(Some(UserResponse::from_row(row, roles)))
            }
            None => Ok(None),
        }
    }

    pub async fn get_row(&self, id: i64) -> PdmsResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn find_by_email(&self, email: &str) -> PdmsResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ? COLLATE NOCASE")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn roles_for(&self, user_id: i64) -> PdmsResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.id, r.name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = ?
            ORDER BY r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    /// Role names for a user; names outside the known set are skipped
    pub async fn role_names_for(&self, user_id: i64) -> PdmsResult<Vec<RoleName>> {
        Ok(self
            .roles_for(user_id)
            .await?
            .iter()
            .filter_map(|r| RoleName::parse(&r.name))
            .collect())
    }

    pub async fn email_exists(&self, email: &str) -> PdmsResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ? COLLATE NOCASE")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// True when another account (not `user_id`) already uses this email
    pub async fn email_taken_by_other(&self, email: &str, user_id: i64) -> PdmsResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE email = ? COLLATE NOCASE AND id != ?",
        )
        .bind(email)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn update(
        &self,
        id: i64,
        email: &str,
        name: &str,
        password_hash: Option<&str>,
        role_ids: Option<&[i64]>,
    ) -> PdmsResult<Option<UserResponse>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE users SET email = ?, name = ?, updated_at = ? WHERE id = ?")
            .bind(email)
            .bind(name)
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        if let Some(hash) = password_hash {
            sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
                .bind(hash)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(role_ids) = role_ids {
            sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for role_id in role_ids {
                sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
                    .bind(id)
                    .bind(role_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> PdmsResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list(&self, params: &PageParams) -> PdmsResult<Page<UserResponse>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY id LIMIT ? OFFSET ?")
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&self.pool)
            .await?;

        let content = self.with_roles(rows).await?;
        Ok(Page::new(content, params, total))
    }

    /// Case-insensitive substring search over name and email
    pub async fn search(&self, query: &str, params: &PageParams) -> PdmsResult<Page<UserResponse>> {
        let pattern = format!("%{}%", escape_like(query.trim()));

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE name LIKE ? ESCAPE '\' OR email LIKE ? ESCAPE '\'
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT * FROM users
            WHERE name LIKE ? ESCAPE '\' OR email LIKE ? ESCAPE '\'
            ORDER BY id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        let content = self.with_roles(rows).await?;
        Ok(Page::new(content, params, total))
    }

    async fn with_roles(&self, rows: Vec<UserRow>) -> PdmsResult<Vec<UserResponse>> {
        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            let roles = self.roles_for(row.id).await?;
            users.push(UserResponse::from_row(row, roles));
        }
        Ok(users)
    }
}

/// Escapes LIKE wildcards so user input matches literally
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub struct RoleStore {
    pool: SqlitePool,
}

impl RoleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> PdmsResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    pub async fn get(&self, id: i64) -> PdmsResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    pub async fn get_by_name(&self, name: RoleName) -> PdmsResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE name = ?")
            .bind(name.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    /// Insert any missing default role; returns how many were created
    pub async fn ensure_defaults(&self) -> PdmsResult<usize> {
        let mut created = 0;
        for role in RoleName::ALL {
            let result = sqlx::query("INSERT OR IGNORE INTO roles (name) VALUES (?)")
                .bind(role.as_str())
                .execute(&self.pool)
                .await?;
            created += result.rows_affected() as usize;
        }
        Ok(created)
    }

    /// Resolve every id or fail with the first unknown one
    pub async fn require_all(&self, ids: &[i64]) -> PdmsResult<Vec<Role>> {
        let mut roles = Vec::with_capacity(ids.len());
        for id in ids {
            let role = self
                .get(*id)
                .await?
                .ok_or_else(|| PdmsError::entity_not_found("Role", *id))?;
            roles.push(role);
        }
        Ok(roles)
    }
}
