use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::db::DbPool;

pub struct LikeRepository {
    pool: DbPool,
}

impl LikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Record a like. Returns `false` if the user already liked the post.
    pub fn like(&self, user_id: &Uuid, post_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "INSERT OR IGNORE INTO likes (post_id, user_id, created_at) VALUES (?, ?, ?)",
                (post_id.to_string(), user_id.to_string(), Utc::now().to_rfc3339()),
            )
            .context("Failed to record like")?;
        Ok(rows > 0)
    }

    /// Remove a like. Returns `false` if there was nothing to remove.
    pub fn unlike(&self, user_id: &Uuid, post_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM likes WHERE post_id = ? AND user_id = ?",
                (post_id.to_string(), user_id.to_string()),
            )
            .context("Failed to remove like")?;
        Ok(rows > 0)
    }

    pub fn exists(&self, user_id: &Uuid, post_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ? AND user_id = ?",
            (post_id.to_string(), user_id.to_string()),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Remove every like on a post
    pub fn delete_for_post(&self, post_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute("DELETE FROM likes WHERE post_id = ?", [post_id.to_string()])
            .context("Failed to delete likes for post")?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    const LINUS: &str = "550e8400-e29b-41d4-a716-446655440003";
    const GRACE_READING_GROUP: &str = "650e8400-e29b-41d4-a716-446655440003";
    const ADA_DEEP_WORK: &str = "650e8400-e29b-41d4-a716-446655440001";

    fn setup() -> (Database, LikeRepository) {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize schema");
        db.seed_demo_data().expect("Failed to seed demo data");
        let repo = LikeRepository::new(db.pool.clone());
        (db, repo)
    }

    #[test]
    fn test_like_is_idempotent() {
        let (_db, repo) = setup();
        let user = Uuid::parse_str(LINUS).unwrap();
        let post = Uuid::parse_str(GRACE_READING_GROUP).unwrap();

        assert!(!repo.exists(&user, &post).unwrap());
        assert!(repo.like(&user, &post).unwrap());
        assert!(!repo.like(&user, &post).unwrap());
        assert!(repo.exists(&user, &post).unwrap());

        assert!(repo.unlike(&user, &post).unwrap());
        assert!(!repo.unlike(&user, &post).unwrap());
        assert!(!repo.exists(&user, &post).unwrap());
    }

    #[test]
    fn test_delete_for_post() {
        let (_db, repo) = setup();
        let post = Uuid::parse_str(ADA_DEEP_WORK).unwrap();
        assert_eq!(repo.delete_for_post(&post).unwrap(), 2);
        assert_eq!(repo.delete_for_post(&post).unwrap(), 0);
    }
}
