//! The idempotent ledger poster — the primitive every financial side
//! effect in the game goes through.
//!
//! A posting is one `wallet_transaction` row plus one balance delta,
//! applied together on the caller's connection (and therefore inside the
//! caller's transaction). The UNIQUE idempotency key makes retries safe:
//! a duplicate key is success-no-op, not an error.

use super::SimStore;
use crate::{
    clock::format_day_key,
    error::{SimError, SimResult},
    types::{DayKey, EntityId},
};
use rusqlite::{params, OptionalExtension};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Usd,
    Xp,
    Diamond,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Xp => "XP",
            Self::Diamond => "DIAMOND",
        }
    }
}

/// One logical financial movement, identified by its idempotency key.
#[derive(Debug, Clone)]
pub struct LedgerPosting {
    pub idempotency_key: String,
    pub player_id: EntityId,
    pub direction: Direction,
    pub category: String,
    pub currency: Currency,
    pub amount: f64,
    pub day_key: DayKey,
}

#[derive(Debug, Clone)]
pub struct WalletRow {
    pub player_id: EntityId,
    pub balance_usd: f64,
    pub balance_xp: f64,
    pub balance_diamond: f64,
}

impl SimStore {
    pub fn create_wallet(&self, player_id: &str) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO wallet (player_id) VALUES (?1)",
            params![player_id],
        )?;
        Ok(())
    }

    pub fn get_wallet(&self, player_id: &str) -> SimResult<WalletRow> {
        self.conn
            .query_row(
                "SELECT player_id, balance_usd, balance_xp, balance_diamond
                 FROM wallet WHERE player_id = ?1",
                params![player_id],
                |row| {
                    Ok(WalletRow {
                        player_id: row.get(0)?,
                        balance_usd: row.get(1)?,
                        balance_xp: row.get(2)?,
                        balance_diamond: row.get(3)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| SimError::NotFound {
                entity: "wallet",
                id: player_id.to_string(),
            })
    }

    /// Post one financial movement and apply its balance delta.
    ///
    /// Returns Ok(true) when a new ledger row was written, Ok(false) when
    /// the idempotency key was already consumed — in which case no balance
    /// mutation happens either. The ignored-duplicate path is what makes a
    /// reissued day advancement safe.
    pub fn post_wallet_transaction(&self, posting: &LedgerPosting) -> SimResult<bool> {
        let wallet_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM wallet WHERE player_id = ?1",
            params![posting.player_id],
            |row| row.get(0),
        )?;
        if wallet_count == 0 {
            return Err(SimError::NotFound {
                entity: "wallet",
                id: posting.player_id.clone(),
            });
        }

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO wallet_transaction
             (idempotency_key, player_id, direction, category, currency, amount, day_key)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                posting.idempotency_key,
                posting.player_id,
                posting.direction.as_str(),
                posting.category,
                posting.currency.as_str(),
                posting.amount,
                format_day_key(posting.day_key)
            ],
        )?;
        if inserted == 0 {
            log::debug!(
                "ledger: duplicate idempotency key {} ignored",
                posting.idempotency_key
            );
            return Ok(false);
        }

        let signed = match posting.direction {
            Direction::In => posting.amount,
            Direction::Out => -posting.amount,
        };
        // Balances floor at zero; an overdraft burns the remainder.
        let sql = match posting.currency {
            Currency::Usd => {
                "UPDATE wallet SET balance_usd = MAX(0.0, balance_usd + ?1) WHERE player_id = ?2"
            }
            Currency::Xp => {
                "UPDATE wallet SET balance_xp = MAX(0.0, balance_xp + ?1) WHERE player_id = ?2"
            }
            Currency::Diamond => {
                "UPDATE wallet SET balance_diamond = MAX(0.0, balance_diamond + ?1) WHERE player_id = ?2"
            }
        };
        self.conn.execute(sql, params![signed, posting.player_id])?;
        Ok(true)
    }

    pub fn count_ledger_entries(&self, idempotency_key: &str) -> SimResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM wallet_transaction WHERE idempotency_key = ?1",
            params![idempotency_key],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn ledger_entries_for_player(
        &self,
        player_id: &str,
    ) -> SimResult<Vec<(String, String, String, f64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT idempotency_key, direction, category, amount
             FROM wallet_transaction WHERE player_id = ?1
             ORDER BY txn_id ASC",
        )?;
        let rows = stmt
            .query_map(params![player_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
