//! Profile lookup — maps an identity to its host/guest role flag.
//!
//! A missing row is a valid state meaning "guest": role resolution fails open
//! to the lesser privilege, and this only steers UI routing. It is not a
//! security boundary.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::identity::Identity;

/// Application-level metadata keyed by identity id. `is_host` selects the
/// host dashboard over the buyer/guest one.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub is_host: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Row access for profiles, injectable so tests run without Postgres.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Single-row fetch; `Ok(None)` means no profile exists for the id.
    async fn fetch(&self, id: Uuid) -> Result<Option<Profile>, ProfileError>;

    /// Upsert on login. Inserts a guest profile for first-time identities,
    /// refreshes the email for returning ones, and never changes `is_host`.
    async fn ensure(&self, identity: &Identity) -> Result<Profile, ProfileError>;
}

/// Postgres-backed store over the shared pool.
pub struct PgProfiles {
    pool: PgPool,
}

impl PgProfiles {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn profile_from_row(row: &sqlx::postgres::PgRow) -> Profile {
    Profile {
        id: row.get("id"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        is_host: row.get("is_host"),
    }
}

#[async_trait]
impl ProfileStore for PgProfiles {
    async fn fetch(&self, id: Uuid) -> Result<Option<Profile>, ProfileError> {
        let row = sqlx::query("SELECT id, email, display_name, is_host FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(profile_from_row))
    }

    async fn ensure(&self, identity: &Identity) -> Result<Profile, ProfileError> {
        let row = sqlx::query(
            r"INSERT INTO profiles (id, email)
              VALUES ($1, $2)
              ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email
              RETURNING id, email, display_name, is_host",
        )
        .bind(identity.id)
        .bind(&identity.email)
        .fetch_one(&self.pool)
        .await?;
        Ok(profile_from_row(&row))
    }
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
