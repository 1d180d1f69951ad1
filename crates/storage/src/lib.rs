use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use scout_core::ConversationSession;
use sqlx::{Row, SqlitePool};

/// Append-then-read turn log, keyed by session id. The executor loads a
/// session, appends the finished turn, and writes it back.
pub trait SessionRepository: Send + Sync {
    async fn load_session(&self, session_id: &str) -> Result<Option<ConversationSession>>;
    async fn upsert_session(&self, session: &ConversationSession) -> Result<()>;
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<String, ConversationSession>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRepository for MemoryStore {
    async fn load_session(&self, session_id: &str) -> Result<Option<ConversationSession>> {
        Ok(self.sessions.read().get(session_id).cloned())
    }

    async fn upsert_session(&self, session: &ConversationSession) -> Result<()> {
        self.sessions
            .write()
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut removed = 0_u64;
        self.sessions.write().retain(|_, session| {
            let keep = session.expires_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });

        Ok(removed)
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
              session_id TEXT PRIMARY KEY,
              expires_at TEXT NOT NULL,
              turns_json TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl SessionRepository for SqliteStore {
    async fn load_session(&self, session_id: &str) -> Result<Option<ConversationSession>> {
        let row = sqlx::query(
            r#"
            SELECT session_id, expires_at, turns_json
            FROM sessions
            WHERE session_id = ?1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let turns_json: String = row.get("turns_json");
        let turns = serde_json::from_str(&turns_json).unwrap_or_default();

        let session = ConversationSession {
            session_id: row.get("session_id"),
            expires_at: row
                .get::<String, _>("expires_at")
                .parse()
                .unwrap_or_else(|_| Utc::now()),
            turns,
        };

        Ok(Some(session))
    }

    async fn upsert_session(&self, session: &ConversationSession) -> Result<()> {
        let turns_json = serde_json::to_string(&session.turns)?;

        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, expires_at, turns_json)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(session_id) DO UPDATE SET
              expires_at=excluded.expires_at,
              turns_json=excluded.turns_json
            "#,
        )
        .bind(&session.session_id)
        .bind(session.expires_at.to_rfc3339())
        .bind(turns_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?1")
            .bind(now.to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteStore::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }
}

impl SessionRepository for Store {
    async fn load_session(&self, session_id: &str) -> Result<Option<ConversationSession>> {
        match self {
            Store::Memory(store) => store.load_session(session_id).await,
            Store::Sqlite(store) => store.load_session(session_id).await,
        }
    }

    async fn upsert_session(&self, session: &ConversationSession) -> Result<()> {
        match self {
            Store::Memory(store) => store.upsert_session(session).await,
            Store::Sqlite(store) => store.upsert_session(session).await,
        }
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        match self {
            Store::Memory(store) => store.purge_expired(now).await,
            Store::Sqlite(store) => store.purge_expired(now).await,
        }
    }
}
