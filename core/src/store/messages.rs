use super::SimStore;
use crate::{
    clock::format_day_key,
    error::SimResult,
    types::{DayKey, EntityId},
};
use rusqlite::params;

#[derive(Debug, Clone)]
pub struct PlayerMessageRow {
    pub message_id: EntityId,
    pub player_id: EntityId,
    pub dedupe_key: String,
    pub kind: String,
    pub body: String,
    pub day_key: String,
    pub read_at: Option<String>,
}

impl SimStore {
    /// At-most-once insert per (player, dedupe_key). Returns Ok(true) when
    /// a row was written, Ok(false) when the event was already delivered —
    /// the UNIQUE constraint swallows the duplicate, not an error path.
    pub fn insert_player_message(
        &self,
        message_id: &str,
        player_id: &str,
        dedupe_key: &str,
        kind: &str,
        body: &str,
        day: DayKey,
    ) -> SimResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO player_message
             (message_id, player_id, dedupe_key, kind, body, day_key)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![message_id, player_id, dedupe_key, kind, body, format_day_key(day)],
        )?;
        Ok(inserted > 0)
    }

    pub fn message_exists(&self, player_id: &str, dedupe_key: &str) -> SimResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM player_message WHERE player_id = ?1 AND dedupe_key = ?2",
            params![player_id, dedupe_key],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn messages_for_player(&self, player_id: &str) -> SimResult<Vec<PlayerMessageRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT message_id, player_id, dedupe_key, kind, body, day_key, read_at
             FROM player_message WHERE player_id = ?1
             ORDER BY day_key ASC, message_id ASC",
        )?;
        let rows = stmt
            .query_map(params![player_id], |row| {
                Ok(PlayerMessageRow {
                    message_id: row.get(0)?,
                    player_id: row.get(1)?,
                    dedupe_key: row.get(2)?,
                    kind: row.get(3)?,
                    body: row.get(4)?,
                    day_key: row.get(5)?,
                    read_at: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
