//! SQLite-backed registration store.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::common::error::StoreResult;

/// A Discord user's chosen character.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CharacterRegistration {
    pub discord_username: String,
    pub character_name: String,
    pub server: String,
    pub registered_at: DateTime<Utc>,
}

impl CharacterRegistration {
    pub fn new(
        discord_username: impl Into<String>,
        character_name: impl Into<String>,
        server: impl Into<String>,
    ) -> Self {
        Self {
            discord_username: discord_username.into(),
            character_name: character_name.into(),
            server: server.into(),
            registered_at: Utc::now(),
        }
    }
}

const CREATE_CHARACTERS: &str = "
    CREATE TABLE IF NOT EXISTS characters (
        discord_username TEXT PRIMARY KEY,
        character_name TEXT NOT NULL,
        server TEXT NOT NULL,
        registered_at TEXT NOT NULL
    )";

const CREATE_ADMINS: &str = "
    CREATE TABLE IF NOT EXISTS admins (
        discord_username TEXT PRIMARY KEY
    )";

/// Registrations and bot admins, one row per Discord username.
#[derive(Debug, Clone)]
pub struct RegistrationStore {
    pool: SqlitePool,
}

impl RegistrationStore {
    /// Open (creating if needed) the database file at `path`.
    pub async fn connect(path: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        info!("Opened registration database at {}", path);
        Self::init(pool).await
    }

    /// A private in-memory database.
    #[cfg(test)]
    pub async fn in_memory() -> StoreResult<Self> {
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // Every connection to :memory: is a separate database, so keep
        // exactly one alive for the pool's lifetime.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::init(pool).await
    }

    /// Close the pool; later queries fail.
    #[cfg(test)]
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn init(pool: SqlitePool) -> StoreResult<Self> {
        sqlx::query(CREATE_CHARACTERS).execute(&pool).await?;
        sqlx::query(CREATE_ADMINS).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Insert or replace the registration for its username.
    pub async fn register_character(&self, registration: &CharacterRegistration) -> StoreResult<()> {
        sqlx::query(
            "REPLACE INTO characters (discord_username, character_name, server, registered_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&registration.discord_username)
        .bind(&registration.character_name)
        .bind(&registration.server)
        .bind(registration.registered_at)
        .execute(&self.pool)
        .await?;

        debug!(
            "Stored registration {} -> {} ({})",
            registration.discord_username, registration.character_name, registration.server
        );
        Ok(())
    }

    pub async fn get_character(&self, discord_username: &str) -> StoreResult<Option<CharacterRegistration>> {
        let registration = sqlx::query_as::<_, CharacterRegistration>(
            "SELECT discord_username, character_name, server, registered_at
             FROM characters WHERE discord_username = ?",
        )
        .bind(discord_username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(registration)
    }

    /// Remove a registration. Returns whether one existed.
    pub async fn remove_registration(&self, discord_username: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM characters WHERE discord_username = ?")
            .bind(discord_username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_registrations(&self) -> StoreResult<Vec<CharacterRegistration>> {
        let registrations = sqlx::query_as::<_, CharacterRegistration>(
            "SELECT discord_username, character_name, server, registered_at
             FROM characters ORDER BY discord_username",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(registrations)
    }

    pub async fn is_admin(&self, discord_username: &str) -> StoreResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins WHERE discord_username = ?")
            .bind(discord_username)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn add_admin(&self, discord_username: &str) -> StoreResult<()> {
        sqlx::query("INSERT OR REPLACE INTO admins (discord_username) VALUES (?)")
            .bind(discord_username)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove an admin. Returns whether one existed.
    pub async fn remove_admin(&self, discord_username: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM admins WHERE discord_username = ?")
            .bind(discord_username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_get() {
        let store = RegistrationStore::in_memory().await.unwrap();
        let registration = CharacterRegistration::new("alice", "Arthas", "Stormrage");

        store.register_character(&registration).await.unwrap();
        let fetched = store.get_character("alice").await.unwrap().unwrap();

        assert_eq!(fetched.character_name, "Arthas");
        assert_eq!(fetched.server, "Stormrage");
        assert!(store.get_character("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_replaces_existing() {
        let store = RegistrationStore::in_memory().await.unwrap();
        store
            .register_character(&CharacterRegistration::new("alice", "Arthas", "Stormrage"))
            .await
            .unwrap();
        store
            .register_character(&CharacterRegistration::new("alice", "Jaina", "Area 52"))
            .await
            .unwrap();

        let all = store.list_registrations().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].character_name, "Jaina");
        assert_eq!(all[0].server, "Area 52");
    }

    #[tokio::test]
    async fn test_remove_registration() {
        let store = RegistrationStore::in_memory().await.unwrap();
        store
            .register_character(&CharacterRegistration::new("alice", "Arthas", "Stormrage"))
            .await
            .unwrap();

        assert!(store.remove_registration("alice").await.unwrap());
        assert!(!store.remove_registration("alice").await.unwrap());
        assert!(store.get_character("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_ordered() {
        let store = RegistrationStore::in_memory().await.unwrap();
        for (user, character) in [("carol", "C"), ("alice", "A"), ("bob", "B")] {
            store
                .register_character(&CharacterRegistration::new(user, character, "Stormrage"))
                .await
                .unwrap();
        }

        let users: Vec<String> = store
            .list_registrations()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.discord_username)
            .collect();
        assert_eq!(users, vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn test_admins() {
        let store = RegistrationStore::in_memory().await.unwrap();
        assert!(!store.is_admin("root").await.unwrap());

        store.add_admin("root").await.unwrap();
        store.add_admin("root").await.unwrap();
        assert!(store.is_admin("root").await.unwrap());

        assert!(store.remove_admin("root").await.unwrap());
        assert!(!store.is_admin("root").await.unwrap());
        assert!(!store.remove_admin("root").await.unwrap());
    }
}
