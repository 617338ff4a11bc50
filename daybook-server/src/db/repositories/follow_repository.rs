use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use daybook_types::{FollowEdge, FollowStatus};

use crate::db::convert::{datetime_at, status_at, uuid_at};
use crate::db::DbPool;

const EDGE_SELECT: &str = "SELECT f.id, f.follower_id, f.followee_id, a.username, b.username, f.status, f.created_at
     FROM follows f
     JOIN users a ON f.follower_id = a.id
     JOIN users b ON f.followee_id = b.id";

fn map_edge(row: &rusqlite::Row<'_>) -> rusqlite::Result<FollowEdge> {
    Ok(FollowEdge {
        id: uuid_at(row, 0)?,
        follower_id: uuid_at(row, 1)?,
        followee_id: uuid_at(row, 2)?,
        follower_username: row.get(3)?,
        followee_username: row.get(4)?,
        status: status_at(row, 5)?,
        created_at: datetime_at(row, 6)?,
    })
}

fn find_edge(conn: &Connection, follower_id: &Uuid, followee_id: &Uuid) -> Result<Option<FollowEdge>> {
    let query = format!("{} WHERE f.follower_id = ? AND f.followee_id = ?", EDGE_SELECT);
    let edge = conn
        .query_row(
            &query,
            (follower_id.to_string(), followee_id.to_string()),
            map_edge,
        )
        .optional()?;
    Ok(edge)
}

/// Outcome of a follow request
#[derive(Debug, Clone, PartialEq)]
pub enum FollowRequest {
    /// A new pending edge was written
    Created(FollowEdge),
    /// A pending or accepted edge already existed
    Existing(FollowEdge),
}

impl FollowRequest {
    pub fn edge(&self) -> &FollowEdge {
        match self {
            FollowRequest::Created(edge) | FollowRequest::Existing(edge) => edge,
        }
    }

    pub fn into_edge(self) -> FollowEdge {
        match self {
            FollowRequest::Created(edge) | FollowRequest::Existing(edge) => edge,
        }
    }
}

pub struct FollowRepository {
    pool: DbPool,
}

impl FollowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn get(&self, edge_id: &Uuid) -> Result<Option<FollowEdge>> {
        let conn = self.pool.get()?;
        let query = format!("{} WHERE f.id = ?", EDGE_SELECT);
        let edge = conn
            .query_row(&query, [edge_id.to_string()], map_edge)
            .optional()?;
        Ok(edge)
    }

    pub fn find(&self, follower_id: &Uuid, followee_id: &Uuid) -> Result<Option<FollowEdge>> {
        let conn = self.pool.get()?;
        find_edge(&conn, follower_id, followee_id)
    }

    /// Ask to follow `followee_id`.
    ///
    /// A pending or accepted edge is returned untouched. A rejected edge is
    /// replaced by a fresh pending request with a new id.
    pub fn request(&self, follower_id: &Uuid, followee_id: &Uuid) -> Result<FollowRequest> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        if let Some(existing) = find_edge(&tx, follower_id, followee_id)? {
            if existing.status != FollowStatus::Rejected {
                return Ok(FollowRequest::Existing(existing));
            }
            tx.execute("DELETE FROM follows WHERE id = ?", [existing.id.to_string()])
                .context("Failed to clear rejected follow request")?;
        }

        let edge = FollowEdge::pending(*follower_id, *followee_id);
        tx.execute(
            "INSERT INTO follows (id, follower_id, followee_id, status, created_at) VALUES (?, ?, ?, ?, ?)",
            (
                edge.id.to_string(),
                follower_id.to_string(),
                followee_id.to_string(),
                edge.status.as_str(),
                edge.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create follow request")?;

        // Re-read so usernames are filled in
        let stored = find_edge(&tx, follower_id, followee_id)?.unwrap_or(edge);
        tx.commit()?;

        Ok(FollowRequest::Created(stored))
    }

    /// Remove the edge from `follower_id` to `followee_id`, whatever its status
    pub fn delete(&self, follower_id: &Uuid, followee_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM follows WHERE follower_id = ? AND followee_id = ?",
                (follower_id.to_string(), followee_id.to_string()),
            )
            .context("Failed to delete follow")?;
        Ok(rows)
    }

    /// Edges where `user_id` is the follower, newest first
    pub fn outgoing(&self, user_id: &Uuid) -> Result<Vec<FollowEdge>> {
        let conn = self.pool.get()?;
        let query = format!("{} WHERE f.follower_id = ? ORDER BY f.created_at DESC", EDGE_SELECT);
        let mut stmt = conn.prepare(&query)?;
        let edges = stmt
            .query_map([user_id.to_string()], map_edge)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(edges)
    }

    /// Edges where `user_id` is the followee, optionally filtered by status
    pub fn incoming(&self, user_id: &Uuid, status: Option<FollowStatus>) -> Result<Vec<FollowEdge>> {
        let conn = self.pool.get()?;
        let edges = match status {
            Some(status) => {
                let query = format!(
                    "{} WHERE f.followee_id = ? AND f.status = ? ORDER BY f.created_at DESC",
                    EDGE_SELECT
                );
                let mut stmt = conn.prepare(&query)?;
                let rows = stmt
                    .query_map((user_id.to_string(), status.as_str()), map_edge)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let query = format!("{} WHERE f.followee_id = ? ORDER BY f.created_at DESC", EDGE_SELECT);
                let mut stmt = conn.prepare(&query)?;
                let rows = stmt
                    .query_map([user_id.to_string()], map_edge)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(edges)
    }

    /// Answer a pending edge. Returns 0 if the edge is missing or no longer pending.
    pub fn set_status(&self, edge_id: &Uuid, status: FollowStatus) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE follows SET status = ? WHERE id = ? AND status = 'pending'",
                (status.as_str(), edge_id.to_string()),
            )
            .context("Failed to update follow status")?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    const ADA: &str = "550e8400-e29b-41d4-a716-446655440001";
    const GRACE: &str = "550e8400-e29b-41d4-a716-446655440002";
    const LINUS: &str = "550e8400-e29b-41d4-a716-446655440003";
    const LINUS_TO_ADA: &str = "750e8400-e29b-41d4-a716-446655440003";

    fn id(s: &str) -> Uuid {
        Uuid::parse_str(s).unwrap()
    }

    fn setup() -> (Database, FollowRepository) {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize schema");
        db.seed_demo_data().expect("Failed to seed demo data");
        let repo = FollowRepository::new(db.pool.clone());
        (db, repo)
    }

    #[test]
    fn test_request_creates_pending_edge_with_usernames() {
        let (_db, repo) = setup();
        let outcome = repo.request(&id(GRACE), &id(LINUS)).unwrap();
        let FollowRequest::Created(edge) = outcome else {
            panic!("expected a new edge");
        };
        assert_eq!(edge.status, FollowStatus::Pending);
        assert_eq!(edge.follower_username.as_deref(), Some("grace"));
        assert_eq!(edge.followee_username.as_deref(), Some("linus"));
    }

    #[test]
    fn test_request_is_idempotent_for_pending_and_accepted() {
        let (_db, repo) = setup();

        let pending = repo.request(&id(LINUS), &id(ADA)).unwrap();
        assert!(matches!(pending, FollowRequest::Existing(_)));
        assert_eq!(pending.edge().id, id(LINUS_TO_ADA));

        let accepted = repo.request(&id(ADA), &id(GRACE)).unwrap();
        assert!(matches!(accepted, FollowRequest::Existing(_)));
        assert_eq!(accepted.edge().status, FollowStatus::Accepted);
    }

    #[test]
    fn test_request_after_rejection_starts_over() {
        let (_db, repo) = setup();
        assert_eq!(repo.set_status(&id(LINUS_TO_ADA), FollowStatus::Rejected).unwrap(), 1);

        let outcome = repo.request(&id(LINUS), &id(ADA)).unwrap();
        let edge = outcome.into_edge();
        assert_ne!(edge.id, id(LINUS_TO_ADA));
        assert_eq!(edge.status, FollowStatus::Pending);
        assert!(repo.get(&id(LINUS_TO_ADA)).unwrap().is_none());
    }

    #[test]
    fn test_answered_edge_cannot_be_answered_again() {
        let (_db, repo) = setup();
        assert_eq!(repo.set_status(&id(LINUS_TO_ADA), FollowStatus::Accepted).unwrap(), 1);
        assert_eq!(repo.set_status(&id(LINUS_TO_ADA), FollowStatus::Rejected).unwrap(), 0);

        let edge = repo.get(&id(LINUS_TO_ADA)).unwrap().unwrap();
        assert_eq!(edge.status, FollowStatus::Accepted);
    }

    #[test]
    fn test_unknown_stored_status_is_an_error() {
        let (db, repo) = setup();
        {
            let conn = db.pool.get().unwrap();
            conn.execute_batch("PRAGMA ignore_check_constraints = ON").unwrap();
            conn.execute(
                "UPDATE follows SET status = 'archived' WHERE id = ?",
                [LINUS_TO_ADA],
            )
            .unwrap();
            conn.execute_batch("PRAGMA ignore_check_constraints = OFF").unwrap();
        }

        assert!(repo.get(&id(LINUS_TO_ADA)).is_err());
    }

    #[test]
    fn test_incoming_and_outgoing() {
        let (_db, repo) = setup();

        let pending = repo.incoming(&id(ADA), Some(FollowStatus::Pending)).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].follower_id, id(LINUS));

        let all = repo.incoming(&id(ADA), None).unwrap();
        assert_eq!(all.len(), 2);

        let outgoing = repo.outgoing(&id(LINUS)).unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].followee_id, id(ADA));
    }

    #[test]
    fn test_delete_removes_edge() {
        let (_db, repo) = setup();
        assert_eq!(repo.delete(&id(ADA), &id(GRACE)).unwrap(), 1);
        assert!(repo.find(&id(ADA), &id(GRACE)).unwrap().is_none());
        assert_eq!(repo.delete(&id(ADA), &id(GRACE)).unwrap(), 0);
    }
}
