use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{ErrorCode, OptionalExtension};
use uuid::Uuid;

use daybook_types::{User, UserSummary};

use crate::db::convert::{datetime_at, uuid_at};
use crate::db::DbPool;

pub struct UserRepository {
    pool: DbPool,
}

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_at(row, 0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        join_date: datetime_at(row, 3)?,
    })
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a user with no username yet
    pub fn create(&self, email: &str) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            email: email.trim().to_lowercase(),
            username: None,
            join_date: Utc::now(),
        };

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO users (id, email, username, join_date) VALUES (?, ?, NULL, ?)",
            (user.id.to_string(), &user.email, user.join_date.to_rfc3339()),
        )
        .context("Failed to create user")?;

        Ok(user)
    }

    /// Get user by ID
    pub fn get_by_id(&self, user_id: &Uuid) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                "SELECT id, email, username, join_date FROM users WHERE id = ?",
                [user_id.to_string()],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get user by email (case-insensitive)
    pub fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                "SELECT id, email, username, join_date FROM users WHERE email = ?",
                [email.trim().to_lowercase()],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Check whether another user already holds `username` (case-insensitive)
    pub fn username_taken(&self, username: &str, except: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ? COLLATE NOCASE AND id != ?",
            (username, except.to_string()),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Assign a username. Returns `false` when the unique index rejects it,
    /// which covers a competing claim that landed after `username_taken`.
    pub fn set_username(&self, user_id: &Uuid, username: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        match conn.execute(
            "UPDATE users SET username = ? WHERE id = ?",
            (username, user_id.to_string()),
        ) {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
                Ok(false)
            }
            Err(e) => Err(e).context("Failed to set username"),
        }
    }

    /// Case-insensitive substring search over claimed usernames.
    /// Exact matches sort first, then alphabetical.
    pub fn search(&self, query: &str, exclude: &Uuid, limit: i64) -> Result<Vec<UserSummary>> {
        let needle = query.trim().to_lowercase();
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, username FROM users
             WHERE username IS NOT NULL
               AND instr(lower(username), ?1) > 0
               AND id != ?2
             ORDER BY (lower(username) = ?1) DESC, lower(username) ASC
             LIMIT ?3",
        )?;

        let users = stmt
            .query_map((&needle, exclude.to_string(), limit), |row| {
                Ok(UserSummary {
                    id: uuid_at(row, 0)?,
                    username: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Delete a user; owned rows go with it through ON DELETE CASCADE
    pub fn delete(&self, user_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute("DELETE FROM users WHERE id = ?", [user_id.to_string()])
            .context("Failed to delete user")?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn setup() -> (Database, UserRepository) {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize schema");
        db.seed_demo_data().expect("Failed to seed demo data");
        let repo = UserRepository::new(db.pool.clone());
        (db, repo)
    }

    #[test]
    fn test_create_and_lookup_by_email() {
        let (_db, repo) = setup();
        let user = repo.create("  New.Person@Example.com ").unwrap();
        assert_eq!(user.email, "new.person@example.com");
        assert!(user.username.is_none());

        let found = repo.get_by_email("NEW.PERSON@example.com").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(repo.get_by_id(&user.id).unwrap().unwrap().email, user.email);
    }

    #[test]
    fn test_username_uniqueness_ignores_case() {
        let (_db, repo) = setup();
        let user = repo.create("someone@example.com").unwrap();

        assert!(repo.username_taken("ADA", &user.id).unwrap());
        assert!(!repo.set_username(&user.id, "Ada").unwrap());
        assert!(repo.set_username(&user.id, "someone").unwrap());

        // Re-claiming your own name is not a conflict
        assert!(!repo.username_taken("someone", &user.id).unwrap());
    }

    #[test]
    fn test_search_orders_exact_match_first() {
        let (_db, repo) = setup();
        let viewer = repo.create("viewer@example.com").unwrap();
        let other = repo.create("other@example.com").unwrap();
        repo.set_username(&other.id, "adamant").unwrap();

        let results = repo.search("ADA", &viewer.id, 20).unwrap();
        let names: Vec<&str> = results.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["ada", "adamant"]);
    }

    #[test]
    fn test_search_excludes_caller_and_unnamed_users() {
        let (_db, repo) = setup();
        let ada_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap();
        let results = repo.search("a", &ada_id, 20).unwrap();
        assert!(results.iter().all(|u| u.id != ada_id));
        assert!(results.iter().all(|u| !u.username.is_empty()));
    }
}
