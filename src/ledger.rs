//! The ban-tally ledger, backed by SQLite.
//!
//! Two relations: `leaderboard` holds one running tally row per moderator,
//! `ban_details` is an append-only log with one row per attributed ban.
//! Every mutation goes through a single transaction so the tally count and
//! the detail rows can never disagree.

// SQLite stores ids as i64; Discord snowflakes round-trip through a plain
// bit cast. Mutex poisoning means another thread panicked mid-write, which
// is unrecoverable for an embedded database handle.
#![allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::params;
use rusqlite::Connection;
use rusqlite::OptionalExtension;

use crate::error::PersistenceError;
use crate::serenity;
use serenity::UserId;

/// Schema applied on every open; both statements are idempotent.
///
/// `mod_id` is deliberately *not* `INTEGER PRIMARY KEY`: the implicit rowid
/// then records insertion order, which gives [Ledger::top_tallies] its
/// deterministic tie-break and [Ledger::ban_details_for] its ordering.
const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS leaderboard (
        mod_id    INTEGER NOT NULL,
        mod_name  TEXT    NOT NULL,
        ban_count INTEGER NOT NULL,
        UNIQUE(mod_id)
    );
    CREATE TABLE IF NOT EXISTS ban_details (
        mod_id  INTEGER NOT NULL,
        user_id INTEGER NOT NULL
    );
";

/// One row of the leaderboard relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeratorTally {
    /// The moderator this tally belongs to.
    pub mod_id: UserId,
    /// Display name as of the moderator's most recent ban.
    pub mod_name: String,
    /// Number of bans attributed to this moderator.
    pub ban_count: u64,
}

/// Handle to the tally database.
///
/// Opened once at startup and owned by [Data](crate::Data); the connection
/// mutex serializes writers, the transaction boundary makes each
/// [record_ban](Ledger::record_ban) all-or-nothing.
#[derive(Clone)]
pub struct Ledger {
    /// The shared SQLite connection.
    conn: Arc<Mutex<Connection>>,
}

impl Ledger {
    /// Opens (or creates) the ledger database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Creates an in-memory ledger, used by tests.
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Records one attributed ban.
    ///
    /// Upserts the moderator's tally row (first ban inserts with a count of
    /// one, later bans increment and overwrite `mod_name` in case the
    /// display name changed) and appends a detail row, all in a single
    /// transaction. On any failure the transaction rolls back and the error
    /// is returned; nothing is retried here.
    pub fn record_ban(
        &self,
        mod_id: UserId,
        mod_name: &str,
        banned_user: UserId,
    ) -> Result<(), PersistenceError> {
        let mut conn = self.lock_conn();
        let tx = conn.transaction()?;

        let known: Option<i64> = tx
            .query_row(
                "SELECT ban_count FROM leaderboard WHERE mod_id = ?1",
                params![mod_id.get() as i64],
                |row| row.get(0),
            )
            .optional()?;

        match known {
            Some(_) => tx.execute(
                "UPDATE leaderboard SET ban_count = ban_count + 1, mod_name = ?1 WHERE mod_id = ?2",
                params![mod_name, mod_id.get() as i64],
            )?,
            None => tx.execute(
                "INSERT INTO leaderboard (mod_id, mod_name, ban_count) VALUES (?1, ?2, 1)",
                params![mod_id.get() as i64, mod_name],
            )?,
        };

        tx.execute(
            "INSERT INTO ban_details (mod_id, user_id) VALUES (?1, ?2)",
            params![mod_id.get() as i64, banned_user.get() as i64],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Returns up to `limit` tallies, highest ban count first.
    ///
    /// Ties are broken by which moderator got their first ban earlier
    /// (rowid order), so repeated calls against the same store are stable.
    /// An empty ledger yields an empty vec, never an error.
    pub fn top_tallies(&self, limit: usize) -> Result<Vec<ModeratorTally>, PersistenceError> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT mod_id, mod_name, ban_count FROM leaderboard
             ORDER BY ban_count DESC, rowid ASC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(ModeratorTally {
                mod_id: UserId::new(row.get::<_, i64>(0)? as u64),
                mod_name: row.get(1)?,
                ban_count: row.get::<_, i64>(2)? as u64,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Every user this moderator has banned, oldest first.
    pub fn ban_details_for(&self, mod_id: UserId) -> Result<Vec<UserId>, PersistenceError> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT user_id FROM ban_details WHERE mod_id = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map(params![mod_id.get() as i64], |row| {
            Ok(UserId::new(row.get::<_, i64>(0)? as u64))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Locks the connection, panicking on poison (see module allows).
    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("ledger mutex poisoned")
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: UserId = UserId::new(100);
    const BOB: UserId = UserId::new(200);
    const CAROL: UserId = UserId::new(300);

    fn ledger() -> Ledger {
        Ledger::in_memory().expect("in-memory ledger")
    }

    /// Records `n` bans for `moderator` against distinct user ids.
    fn record_many(ledger: &Ledger, moderator: UserId, name: &str, n: u64) {
        for i in 0..n {
            let banned = UserId::new(90_000 + moderator.get() * 100 + i);
            ledger.record_ban(moderator, name, banned).unwrap();
        }
    }

    #[test]
    fn ban_count_matches_detail_rows() {
        let ledger = ledger();
        record_many(&ledger, ALICE, "Alice", 3);
        record_many(&ledger, BOB, "Bob", 1);

        for tally in ledger.top_tallies(10).unwrap() {
            let details = ledger.ban_details_for(tally.mod_id).unwrap();
            assert_eq!(tally.ban_count, details.len() as u64);
        }
    }

    #[test]
    fn name_is_overwritten_by_most_recent_ban() {
        let ledger = ledger();
        ledger.record_ban(ALICE, "Alice", UserId::new(1)).unwrap();
        ledger.record_ban(ALICE, "Alice2", UserId::new(2)).unwrap();

        let tallies = ledger.top_tallies(10).unwrap();
        assert_eq!(tallies.len(), 1);
        assert_eq!(tallies[0].mod_id, ALICE);
        assert_eq!(tallies[0].ban_count, 2);
        assert_eq!(tallies[0].mod_name, "Alice2");
    }

    #[test]
    fn empty_ledger_yields_empty_leaderboard() {
        let ledger = ledger();
        assert!(ledger.top_tallies(10).unwrap().is_empty());
        assert!(ledger.ban_details_for(ALICE).unwrap().is_empty());
    }

    #[test]
    fn ties_break_by_first_ban_order() {
        let ledger = ledger();
        record_many(&ledger, ALICE, "Alice", 5);
        record_many(&ledger, BOB, "Bob", 5);
        record_many(&ledger, CAROL, "Carol", 3);

        // Alice got on the board before Bob, so she wins the tie. Repeated
        // calls against the same store must agree.
        let first = ledger.top_tallies(1).unwrap();
        let second = ledger.top_tallies(1).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].mod_id, ALICE);

        let all = ledger.top_tallies(10).unwrap();
        let order: Vec<UserId> = all.iter().map(|t| t.mod_id).collect();
        assert_eq!(order, vec![ALICE, BOB, CAROL]);
    }

    #[test]
    fn limit_caps_returned_rows() {
        let ledger = ledger();
        record_many(&ledger, ALICE, "Alice", 2);
        record_many(&ledger, BOB, "Bob", 1);
        assert_eq!(ledger.top_tallies(1).unwrap().len(), 1);
    }

    #[test]
    fn details_keep_insertion_order() {
        let ledger = ledger();
        let (u1, u2) = (UserId::new(11), UserId::new(22));
        ledger.record_ban(ALICE, "Alice", u1).unwrap();
        ledger.record_ban(ALICE, "Alice", u2).unwrap();

        assert_eq!(ledger.ban_details_for(ALICE).unwrap(), vec![u1, u2]);
    }

    #[test]
    fn same_user_banned_twice_keeps_both_rows() {
        let ledger = ledger();
        let repeat = UserId::new(55);
        ledger.record_ban(ALICE, "Alice", repeat).unwrap();
        ledger.record_ban(ALICE, "Alice", repeat).unwrap();

        assert_eq!(ledger.ban_details_for(ALICE).unwrap(), vec![repeat, repeat]);
        assert_eq!(ledger.top_tallies(1).unwrap()[0].ban_count, 2);
    }

    #[test]
    fn failed_record_rolls_back_both_relations() {
        let ledger = ledger();
        ledger.record_ban(ALICE, "Alice", UserId::new(1)).unwrap();

        // Simulate a storage fault partway through the transaction: the
        // tally upsert has already run when the detail insert aborts.
        ledger
            .lock_conn()
            .execute_batch(
                "CREATE TRIGGER storage_fault BEFORE INSERT ON ban_details
                 WHEN NEW.user_id = 4242
                 BEGIN SELECT RAISE(ABORT, 'simulated storage fault'); END;",
            )
            .unwrap();

        let result = ledger.record_ban(ALICE, "Alice2", UserId::new(4242));
        assert!(result.is_err());

        // No partial increment, no renamed row, no orphan detail row.
        let tallies = ledger.top_tallies(10).unwrap();
        assert_eq!(tallies.len(), 1);
        assert_eq!(tallies[0].ban_count, 1);
        assert_eq!(tallies[0].mod_name, "Alice");
        assert_eq!(ledger.ban_details_for(ALICE).unwrap().len(), 1);
    }
}
