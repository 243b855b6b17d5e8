//! Player notifications with at-most-once delivery per logical event.
//!
//! The (player, dedupe_key) uniqueness lives in the store; this helper
//! just mints the message id and keeps the suppressed-duplicate path a
//! quiet success.

use crate::{error::SimResult, store::SimStore, types::DayKey};

/// Create a notification unless one with this dedupe key already exists
/// for the player. Returns whether a new message was written.
pub fn notify_once(
    store: &SimStore,
    player_id: &str,
    dedupe_key: &str,
    kind: &str,
    body: &str,
    day: DayKey,
) -> SimResult<bool> {
    let message_id = uuid::Uuid::new_v4().to_string();
    let created =
        store.insert_player_message(&message_id, player_id, dedupe_key, kind, body, day)?;
    if !created {
        log::debug!("notify: duplicate {dedupe_key} for {player_id} suppressed");
    }
    Ok(created)
}
