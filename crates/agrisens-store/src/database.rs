//! SQLite-backed user accounts and farm profiles

use crate::error::{Result, StoreError};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, info};

/// A registered user. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// A user's farm profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Farm {
    pub id: i64,
    pub user_id: i64,
    pub farm_name: Option<String>,
    pub location: Option<String>,
    pub soil_type: Option<String>,
}

/// Fields of a farm profile update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmUpdate {
    #[serde(default)]
    pub farm_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub soil_type: Option<String>,
}

/// SHA-256 hex digest of a password
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Shared handle to the account database
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and its tables
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "Opened account database");
        Self::init(conn)
    }

    /// A private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS farms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                farm_name TEXT,
                location TEXT,
                soil_type TEXT,
                FOREIGN KEY (user_id) REFERENCES users (id)
            );",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Register a user. Returns `false` when the username is taken.
    pub fn add_user(&self, username: &str, password: &str) -> Result<bool> {
        if username.is_empty() || password.is_empty() {
            return Err(StoreError::invalid_input("username and password are required"));
        }

        let conn = self.conn.lock();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO users (username, password_hash) VALUES (?1, ?2)",
            params![username, hash_password(password)],
        )?;
        debug!(username, created = inserted == 1, "Signup");
        Ok(inserted == 1)
    }

    /// Verify credentials, returning the user on success
    pub fn check_user(&self, username: &str, password: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT id, username, password_hash FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok((
                        User {
                            id: row.get(0)?,
                            username: row.get(1)?,
                        },
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((user, stored_hash)) = row else {
            return Ok(None);
        };
        let candidate = hash_password(password);
        if bool::from(candidate.as_bytes().ct_eq(stored_hash.as_bytes())) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Look up a user by id
    pub fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.conn.lock();
        let user = conn
            .query_row(
                "SELECT id, username FROM users WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// The farm profile of a user, if one was saved
    pub fn get_farm_details(&self, user_id: i64) -> Result<Option<Farm>> {
        let conn = self.conn.lock();
        let farm = conn
            .query_row(
                "SELECT id, user_id, farm_name, location, soil_type FROM farms WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(Farm {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        farm_name: row.get(2)?,
                        location: row.get(3)?,
                        soil_type: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(farm)
    }

    /// Save a user's farm profile, updating it when one exists
    pub fn update_farm_details(&self, user_id: i64, update: &FarmUpdate) -> Result<Farm> {
        if self.get_user(user_id)?.is_none() {
            return Err(StoreError::UnknownUser(user_id));
        }

        {
            let conn = self.conn.lock();
            let updated = conn.execute(
                "UPDATE farms SET farm_name = ?1, location = ?2, soil_type = ?3 WHERE user_id = ?4",
                params![update.farm_name, update.location, update.soil_type, user_id],
            )?;
            if updated == 0 {
                conn.execute(
                    "INSERT INTO farms (user_id, farm_name, location, soil_type) VALUES (?1, ?2, ?3, ?4)",
                    params![user_id, update.farm_name, update.location, update.soil_type],
                )?;
            }
            debug!(user_id, created = updated == 0, "Farm profile saved");
        }

        self.get_farm_details(user_id)?
            .ok_or(StoreError::UnknownUser(user_id))
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        assert_eq!(
            hash_password("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }

    #[test]
    fn test_signup_and_login() {
        let db = Database::open_in_memory().unwrap();

        assert!(db.add_user("farmer", "s3cret").unwrap());
        assert!(!db.add_user("farmer", "other").unwrap());

        let user = db.check_user("farmer", "s3cret").unwrap().unwrap();
        assert_eq!(user.username, "farmer");
        assert!(db.check_user("farmer", "wrong").unwrap().is_none());
        assert!(db.check_user("nobody", "s3cret").unwrap().is_none());
    }

    #[test]
    fn test_empty_credentials_rejected() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.add_user("", "x"), Err(StoreError::InvalidInput(_))));
        assert!(matches!(db.add_user("x", ""), Err(StoreError::InvalidInput(_))));
    }

    #[test]
    fn test_farm_upsert() {
        let db = Database::open_in_memory().unwrap();
        db.add_user("farmer", "pw").unwrap();
        let user = db.check_user("farmer", "pw").unwrap().unwrap();

        assert!(db.get_farm_details(user.id).unwrap().is_none());

        let first = db
            .update_farm_details(
                user.id,
                &FarmUpdate {
                    farm_name: Some("North Field".to_string()),
                    location: Some("Pune".to_string()),
                    soil_type: Some("Black".to_string()),
                },
            )
            .unwrap();
        assert_eq!(first.soil_type.as_deref(), Some("Black"));

        let second = db
            .update_farm_details(
                user.id,
                &FarmUpdate {
                    soil_type: Some("Loamy".to_string()),
                    ..FarmUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.soil_type.as_deref(), Some("Loamy"));
        assert!(second.farm_name.is_none());
    }

    #[test]
    fn test_farm_for_unknown_user() {
        let db = Database::open_in_memory().unwrap();
        let err = db.update_farm_details(99, &FarmUpdate::default()).unwrap_err();
        assert!(matches!(err, StoreError::UnknownUser(99)));
    }
}
