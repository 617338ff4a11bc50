use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use daybook_types::{ScheduleEntry, ScheduleEntryDraft};

use crate::db::convert::{date_at, time_at, time_to_sql, uuid_at};
use crate::db::DbPool;

fn map_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduleEntry> {
    Ok(ScheduleEntry {
        id: uuid_at(row, 0)?,
        owner_id: uuid_at(row, 1)?,
        date: date_at(row, 2)?,
        start_time: time_at(row, 3)?,
        end_time: time_at(row, 4)?,
        text: row.get(5)?,
    })
}

/// Private per-user schedule entries. Every query is scoped to the owner.
pub struct ScheduleRepository {
    pool: DbPool,
}

impl ScheduleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Entries for one day, ordered by start time
    pub fn list_for_day(&self, owner_id: &Uuid, date: NaiveDate) -> Result<Vec<ScheduleEntry>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, owner_id, date, start_time, end_time, text
             FROM schedule_entries
             WHERE owner_id = ? AND date = ?
             ORDER BY start_time ASC",
        )?;
        let entries = stmt
            .query_map((owner_id.to_string(), date.to_string()), map_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn get(&self, owner_id: &Uuid, entry_id: &Uuid) -> Result<Option<ScheduleEntry>> {
        let conn = self.pool.get()?;
        let entry = conn
            .query_row(
                "SELECT id, owner_id, date, start_time, end_time, text
                 FROM schedule_entries WHERE id = ? AND owner_id = ?",
                (entry_id.to_string(), owner_id.to_string()),
                map_entry,
            )
            .optional()?;
        Ok(entry)
    }

    pub fn create(&self, owner_id: &Uuid, draft: &ScheduleEntryDraft) -> Result<ScheduleEntry> {
        let entry = ScheduleEntry {
            id: Uuid::new_v4(),
            owner_id: *owner_id,
            date: draft.date,
            start_time: draft.start_time,
            end_time: draft.end_time,
            text: draft.text.trim().to_string(),
        };

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO schedule_entries (id, owner_id, date, start_time, end_time, text)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                entry.id.to_string(),
                owner_id.to_string(),
                entry.date.to_string(),
                time_to_sql(entry.start_time),
                time_to_sql(entry.end_time),
                &entry.text,
            ),
        )
        .context("Failed to create schedule entry")?;

        Ok(entry)
    }

    /// Returns the number of rows changed; zero means the entry is missing or not owned
    pub fn update(&self, owner_id: &Uuid, entry_id: &Uuid, draft: &ScheduleEntryDraft) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE schedule_entries SET date = ?, start_time = ?, end_time = ?, text = ?
                 WHERE id = ? AND owner_id = ?",
                (
                    draft.date.to_string(),
                    time_to_sql(draft.start_time),
                    time_to_sql(draft.end_time),
                    draft.text.trim(),
                    entry_id.to_string(),
                    owner_id.to_string(),
                ),
            )
            .context("Failed to update schedule entry")?;
        Ok(rows)
    }

    pub fn delete(&self, owner_id: &Uuid, entry_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM schedule_entries WHERE id = ? AND owner_id = ?",
                (entry_id.to_string(), owner_id.to_string()),
            )
            .context("Failed to delete schedule entry")?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use chrono::NaiveTime;

    const ADA: &str = "550e8400-e29b-41d4-a716-446655440001";
    const GRACE: &str = "550e8400-e29b-41d4-a716-446655440002";

    fn setup() -> (Database, ScheduleRepository) {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize schema");
        db.seed_demo_data().expect("Failed to seed demo data");
        let repo = ScheduleRepository::new(db.pool.clone());
        (db, repo)
    }

    fn draft(h: u32, text: &str) -> ScheduleEntryDraft {
        ScheduleEntryDraft {
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            start_time: NaiveTime::from_hms_opt(h, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(h + 1, 0, 0).unwrap(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_day_listing_is_sorted_and_scoped() {
        let (_db, repo) = setup();
        let ada = Uuid::parse_str(ADA).unwrap();
        let grace = Uuid::parse_str(GRACE).unwrap();

        repo.create(&ada, &draft(14, "Pi day talk")).unwrap();
        repo.create(&ada, &draft(9, "Breakfast")).unwrap();
        repo.create(&grace, &draft(10, "Not Ada's")).unwrap();

        let day = repo.list_for_day(&ada, draft(0, "").date).unwrap();
        let texts: Vec<&str> = day.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Breakfast", "Pi day talk"]);

        let other_day = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert!(repo.list_for_day(&ada, other_day).unwrap().is_empty());
    }

    #[test]
    fn test_other_users_cannot_touch_entry() {
        let (_db, repo) = setup();
        let ada = Uuid::parse_str(ADA).unwrap();
        let grace = Uuid::parse_str(GRACE).unwrap();
        let entry = repo.create(&ada, &draft(9, "Standup")).unwrap();

        assert!(repo.get(&grace, &entry.id).unwrap().is_none());
        assert_eq!(repo.update(&grace, &entry.id, &draft(10, "Hijacked")).unwrap(), 0);
        assert_eq!(repo.delete(&grace, &entry.id).unwrap(), 0);

        assert_eq!(repo.update(&ada, &entry.id, &draft(10, "Standup, later")).unwrap(), 1);
        let stored = repo.get(&ada, &entry.id).unwrap().unwrap();
        assert_eq!(stored.text, "Standup, later");
        assert_eq!(stored.start_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(repo.delete(&ada, &entry.id).unwrap(), 1);
    }
}
