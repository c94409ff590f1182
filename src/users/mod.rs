//! Persistent user store.
//!
//! Users are the only durable records in the system. The store owns them
//! exclusively: created by registration, read by login and password change,
//! mutated only by password change. The phone column holds an opaque
//! ciphertext blob; plaintext never reaches the database.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub encrypted_phone: String,
}

/// Outcome when attempting to create a new user.
#[derive(Debug)]
pub enum CreateOutcome {
    Created,
    Conflict,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        encrypted_phone: &str,
    ) -> Result<CreateOutcome>;

    /// Case-sensitive lookup by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    async fn find_password_hash(&self, id: Uuid) -> Result<Option<String>>;

    /// Replace the stored hash. Returns `false` when the user is missing.
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        encrypted_phone: &str,
    ) -> Result<CreateOutcome> {
        let query = r"
            INSERT INTO users (username, password_hash, encrypted_phone)
            VALUES ($1, $2, $3)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(username)
            .bind(password_hash)
            .bind(encrypted_phone)
            .execute(&self.pool)
            .instrument(span)
            .await;

        match result {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::Conflict),
            Err(err) => Err(err).context("failed to insert user"),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let query = r"
            SELECT id, username, password_hash, encrypted_phone
            FROM users
            WHERE username = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user")?;

        Ok(row.map(|row| UserRecord {
            id: row.get("id"),
            username: row.get("username"),
            password_hash: row.get("password_hash"),
            encrypted_phone: row.get("encrypted_phone"),
        }))
    }

    async fn find_password_hash(&self, id: Uuid) -> Result<Option<String>> {
        let query = "SELECT password_hash FROM users WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup password hash")?;

        Ok(row.map(|row| row.get("password_hash")))
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let query = "UPDATE users SET password_hash = $1 WHERE id = $2";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update password hash")?;

        Ok(result.rows_affected() > 0)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

/// In-memory user store for exercising the auth flows without Postgres.
#[cfg(test)]
pub(crate) struct MemoryUserStore {
    users: tokio::sync::Mutex<std::collections::HashMap<String, UserRecord>>,
    lookups: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MemoryUserStore {
    pub(crate) fn new() -> Self {
        Self {
            users: tokio::sync::Mutex::new(std::collections::HashMap::new()),
            lookups: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Number of `find_by_username` calls served so far.
    pub(crate) fn lookup_count(&self) -> usize {
        self.lookups.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        encrypted_phone: &str,
    ) -> Result<CreateOutcome> {
        let mut users = self.users.lock().await;
        if users.contains_key(username) {
            return Ok(CreateOutcome::Conflict);
        }

        users.insert(
            username.to_string(),
            UserRecord {
                id: Uuid::new_v4(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                encrypted_phone: encrypted_phone.to_string(),
            },
        );

        Ok(CreateOutcome::Created)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        self.lookups
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let users = self.users.lock().await;
        Ok(users.get(username).cloned())
    }

    async fn find_password_hash(&self, id: Uuid) -> Result<Option<String>> {
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|user| user.id == id)
            .map(|user| user.password_hash.clone()))
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let mut users = self.users.lock().await;
        for user in users.values_mut() {
            if user.id == id {
                user.password_hash = password_hash.to_string();
                return Ok(true);
            }
        }

        Ok(false)
    }
}
