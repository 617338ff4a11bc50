use anyhow::{Context, Result};
use chrono::NaiveTime;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use daybook_types::{FeedScope, Post};

use crate::db::convert::{datetime_at, optional_time_at, time_to_sql, uuid_at};
use crate::db::DbPool;

/// Columns shared by every post query. `?1` is the viewer, used to derive `liked_by_user`.
const POST_SELECT: &str = "SELECT p.id, p.author_id, u.username, p.content, p.created_at,
        p.start_time, p.end_time, p.completed,
        (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes_count,
        EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = ?1) AS liked_by_user
     FROM posts p
     JOIN users u ON p.author_id = u.id";

fn map_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    let likes_count: i64 = row.get(8)?;
    Ok(Post {
        id: uuid_at(row, 0)?,
        author_id: uuid_at(row, 1)?,
        author_username: row.get(2)?,
        content: row.get(3)?,
        created_at: datetime_at(row, 4)?,
        start_time: optional_time_at(row, 5)?,
        end_time: optional_time_at(row, 6)?,
        completed: row.get::<_, i64>(7)? != 0,
        likes_count: u32::try_from(likes_count).unwrap_or(u32::MAX),
        liked_by_user: row.get::<_, i64>(9)? != 0,
    })
}

pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new post
    pub fn create(&self, post: &Post) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO posts (id, author_id, content, created_at, start_time, end_time, completed)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                post.id.to_string(),
                post.author_id.to_string(),
                &post.content,
                post.created_at.to_rfc3339(),
                post.start_time.map(time_to_sql),
                post.end_time.map(time_to_sql),
                post.completed as i64,
            ),
        )
        .context("Failed to create post")?;
        Ok(())
    }

    /// List a feed for `viewer`, newest first
    pub fn list(&self, scope: FeedScope, viewer: &Uuid, limit: i64) -> Result<Vec<Post>> {
        let filter = match scope {
            FeedScope::Self_ => "WHERE p.author_id = ?1",
            FeedScope::Friends => {
                "WHERE p.author_id IN (
                    SELECT followee_id FROM follows WHERE follower_id = ?1 AND status = 'accepted'
                 )"
            }
            FeedScope::World => "",
        };
        let query = format!("{} {} ORDER BY p.created_at DESC LIMIT ?2", POST_SELECT, filter);

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&query)?;
        let posts = stmt
            .query_map((viewer.to_string(), limit), map_post)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    /// Get a single post by ID, with like fields derived for `viewer`
    pub fn get_by_id(&self, post_id: &Uuid, viewer: &Uuid) -> Result<Option<Post>> {
        let conn = self.pool.get()?;
        let query = format!("{} WHERE p.id = ?2", POST_SELECT);
        let post = conn
            .query_row(&query, (viewer.to_string(), post_id.to_string()), map_post)
            .optional()?;
        Ok(post)
    }

    /// Replace the content and time block of a post
    pub fn update(
        &self,
        post_id: &Uuid,
        content: &str,
        start_time: Option<NaiveTime>,
        end_time: Option<NaiveTime>,
    ) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE posts SET content = ?, start_time = ?, end_time = ? WHERE id = ?",
                (
                    content,
                    start_time.map(time_to_sql),
                    end_time.map(time_to_sql),
                    post_id.to_string(),
                ),
            )
            .context("Failed to update post")?;
        Ok(rows)
    }

    pub fn set_completed(&self, post_id: &Uuid, completed: bool) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE posts SET completed = ? WHERE id = ?",
                (completed as i64, post_id.to_string()),
            )
            .context("Failed to update completion")?;
        Ok(rows)
    }

    pub fn delete(&self, post_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute("DELETE FROM posts WHERE id = ?", [post_id.to_string()])
            .context("Failed to delete post")?;
        Ok(rows)
    }
}
