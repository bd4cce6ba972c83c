//! Store module - SQLite-backed key-value persistence
//!
//! The whole application state lives under one key and is rewritten
//! wholesale after every mutation: no partial writes, no schema versioning,
//! last write wins.

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::model::{AppState, User};

const APP_DATA_KEY: &str = "app_data";
const SKIP_LOGIN_KEY: &str = "skip_login_flag";
const KNOWN_ACCOUNTS_KEY: &str = "known_accounts";

/// Key-value store over SQLite, JSON-encoded values.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create the store.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Read a JSON value. A blob that no longer parses logs a warning and
    /// reads as absent, so a corrupt store never blocks startup.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("discarding unreadable blob under {key:?}: {e}");
                Ok(None)
            }
        }
    }

    fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.put_raw(key, &serde_json::to_string(value)?)
    }

    /// Load the application state, defaulting to empty on first run.
    pub fn load_state(&self) -> Result<AppState> {
        Ok(self.get_json(APP_DATA_KEY)?.unwrap_or_default())
    }

    /// Persist the full application state.
    pub fn save_state(&self, state: &AppState) -> Result<()> {
        self.put_json(APP_DATA_KEY, state)
    }

    pub fn skip_login(&self) -> Result<bool> {
        Ok(self.get_json(SKIP_LOGIN_KEY)?.unwrap_or(false))
    }

    /// Set once the user skips login or completes any login; never unset.
    pub fn set_skip_login(&self) -> Result<()> {
        self.put_json(SKIP_LOGIN_KEY, &true)
    }

    pub fn known_accounts(&self) -> Result<Vec<User>> {
        Ok(self.get_json(KNOWN_ACCOUNTS_KEY)?.unwrap_or_default())
    }

    /// Remember an account for the "choose an account" list, deduplicated by
    /// email.
    pub fn remember_account(&self, user: &User) -> Result<()> {
        let mut accounts = self.known_accounts()?;
        if accounts.iter().any(|a| a.email == user.email) {
            return Ok(());
        }
        accounts.push(user.clone());
        self.put_json(KNOWN_ACCOUNTS_KEY, &accounts)
    }
}
