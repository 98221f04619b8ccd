//! Sqlite-backed local store with named collections and the FIFO pending queue.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, params};
use tracing::warn;

use crate::{
    pending::{PENDING_FORMAT_VERSION, PendingEnvelope, PendingOp, StoredPending},
    record::{Restaurant, Review},
    types::{PendingSeq, RestaurantId},
};

use super::StoreResult;

/// Ordered, additive schema migrations. Index `n` upgrades to version `n + 1`.
const MIGRATIONS: &[&str] = &[
    include_str!("schema_v1.sql"),
    include_str!("schema_v2.sql"),
];

/// Durable record cache and pending-write queue.
///
/// Opening never fails: when the backing database cannot be opened or
/// migrated, the handle downgrades to an unavailable no-op store where
/// every read is a miss and every write is dropped. Callers check
/// [`LocalStore::available`] once instead of re-probing per call.
pub struct LocalStore {
    conn: Option<Connection>,
}

impl LocalStore {
    /// Opens or creates the store at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> Self {
        match Connection::open(path).map_err(Into::into).and_then(Self::init_connection) {
            Ok(store) => store,
            Err(err) => {
                warn!(?err, "local store unavailable, degrading to cache misses");
                Self::unavailable()
            }
        }
    }

    /// Opens an in-memory store.
    pub fn open_in_memory() -> Self {
        match Connection::open_in_memory().map_err(Into::into).and_then(Self::init_connection) {
            Ok(store) => store,
            Err(err) => {
                warn!(?err, "in-memory store unavailable, degrading to cache misses");
                Self::unavailable()
            }
        }
    }

    /// Builds a handle with no backing persistence at all.
    pub fn unavailable() -> Self {
        Self { conn: None }
    }

    /// True when the backing database opened and migrated successfully.
    pub fn available(&self) -> bool {
        self.conn.is_some()
    }

    fn init_connection(conn: Connection) -> StoreResult<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Self::migrate(&conn)?;
        Ok(Self { conn: Some(conn) })
    }

    /// Runs every migration past the recorded schema version, in order.
    fn migrate(conn: &Connection) -> StoreResult<()> {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        for (idx, sql) in MIGRATIONS.iter().enumerate() {
            let target = (idx + 1) as i64;
            if version < target {
                conn.execute_batch(sql)?;
                conn.pragma_update(None, "user_version", target)?;
            }
        }
        Ok(())
    }

    /// Current schema version, 0 when unavailable.
    pub fn schema_version(&self) -> StoreResult<i64> {
        let Some(conn) = &self.conn else {
            return Ok(0);
        };
        Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    /// Upserts one restaurant by primary key.
    pub fn put_restaurant(&self, restaurant: &Restaurant) -> StoreResult<()> {
        let Some(conn) = &self.conn else {
            return Ok(());
        };
        let payload = serde_json::to_vec(restaurant)?;
        conn.execute(
            "INSERT OR REPLACE INTO restaurants(id, payload) VALUES (?1, ?2)",
            params![restaurant.id as i64, payload],
        )?;
        Ok(())
    }

    /// Upserts a batch of restaurants in one transaction.
    pub fn put_restaurants(&mut self, restaurants: &[Restaurant]) -> StoreResult<()> {
        let Some(conn) = &mut self.conn else {
            return Ok(());
        };
        let tx = conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT OR REPLACE INTO restaurants(id, payload) VALUES (?1, ?2)")?;
            for restaurant in restaurants {
                let payload = serde_json::to_vec(restaurant)?;
                stmt.execute(params![restaurant.id as i64, payload])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Looks up one cached restaurant.
    pub fn restaurant(&self, id: RestaurantId) -> StoreResult<Option<Restaurant>> {
        let Some(conn) = &self.conn else {
            return Ok(None);
        };
        let mut stmt = conn.prepare("SELECT payload FROM restaurants WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id as i64], decode_payload_row::<Restaurant>)?;
        rows.next().transpose().map_err(Into::into)
    }

    /// Returns every cached restaurant ordered by id.
    pub fn restaurants(&self) -> StoreResult<Vec<Restaurant>> {
        let Some(conn) = &self.conn else {
            return Ok(Vec::new());
        };
        let mut stmt = conn.prepare("SELECT payload FROM restaurants ORDER BY id ASC")?;
        let rows = stmt.query_map([], decode_payload_row::<Restaurant>)?;
        collect_rows(rows)
    }

    /// Number of cached restaurants.
    pub fn restaurant_count(&self) -> StoreResult<usize> {
        let Some(conn) = &self.conn else {
            return Ok(0);
        };
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM restaurants", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Upserts one review by primary key.
    pub fn put_review(&self, review: &Review) -> StoreResult<()> {
        let Some(conn) = &self.conn else {
            return Ok(());
        };
        let payload = serde_json::to_vec(review)?;
        conn.execute(
            "INSERT OR REPLACE INTO reviews(id, restaurant_id, payload) VALUES (?1, ?2, ?3)",
            params![review.id as i64, review.restaurant_id as i64, payload],
        )?;
        Ok(())
    }

    /// Upserts a batch of reviews in one transaction.
    pub fn put_reviews(&mut self, reviews: &[Review]) -> StoreResult<()> {
        let Some(conn) = &mut self.conn else {
            return Ok(());
        };
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO reviews(id, restaurant_id, payload) VALUES (?1, ?2, ?3)",
            )?;
            for review in reviews {
                let payload = serde_json::to_vec(review)?;
                stmt.execute(params![review.id as i64, review.restaurant_id as i64, payload])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Reviews owned by `restaurant_id`, via the secondary index.
    pub fn reviews_for(&self, restaurant_id: RestaurantId) -> StoreResult<Vec<Review>> {
        let Some(conn) = &self.conn else {
            return Ok(Vec::new());
        };
        let mut stmt = conn
            .prepare("SELECT payload FROM reviews WHERE restaurant_id = ?1 ORDER BY id ASC")?;
        let rows = stmt.query_map(params![restaurant_id as i64], decode_payload_row::<Review>)?;
        collect_rows(rows)
    }

    /// Appends a pending mutation to the queue.
    ///
    /// Returns the assigned sequence, or `None` when persistence is
    /// unavailable; in that case the write is dropped, which is accepted
    /// behavior since offline durability needs the store to exist at all.
    pub fn enqueue_pending(&self, op: &PendingOp) -> StoreResult<Option<PendingSeq>> {
        let Some(conn) = &self.conn else {
            warn!("pending queue is non-durable, dropping queued mutation");
            return Ok(None);
        };
        let payload = serde_json::to_vec(&PendingEnvelope::new(op.clone()))?;
        conn.execute(
            "INSERT INTO pending_requests(ts_ms, kind, payload) VALUES (?1, ?2, ?3)",
            params![now_ms() as i64, pending_kind(op), payload],
        )?;
        Ok(Some(conn.last_insert_rowid() as PendingSeq))
    }

    /// Ordered snapshot of the queue, oldest first.
    ///
    /// Entries enqueued after this call are past the snapshot cursor and
    /// belong to a later drain pass.
    pub fn pending_snapshot(&self) -> StoreResult<Vec<StoredPending>> {
        let Some(conn) = &self.conn else {
            return Ok(Vec::new());
        };
        let mut stmt = conn
            .prepare("SELECT seq, ts_ms, payload FROM pending_requests ORDER BY seq ASC")?;
        let rows = stmt.query_map([], |row| {
            let seq: i64 = row.get(0)?;
            let ts_ms: i64 = row.get(1)?;
            let payload: Vec<u8> = row.get(2)?;
            let op = decode_pending_payload(&payload).map_err(|err| {
                rusqlite::Error::FromSqlConversionFailure(
                    payload.len(),
                    rusqlite::types::Type::Blob,
                    Box::new(std::io::Error::other(err)),
                )
            })?;
            Ok(StoredPending {
                seq: seq as PendingSeq,
                ts_ms: ts_ms as u64,
                op,
            })
        })?;
        collect_rows(rows)
    }

    /// Deletes one queue entry after its replay succeeded.
    pub fn remove_pending(&self, seq: PendingSeq) -> StoreResult<()> {
        let Some(conn) = &self.conn else {
            return Ok(());
        };
        conn.execute("DELETE FROM pending_requests WHERE seq = ?1", params![seq as i64])?;
        Ok(())
    }

    /// Number of queued pending mutations.
    pub fn pending_count(&self) -> StoreResult<usize> {
        let Some(conn) = &self.conn else {
            return Ok(0);
        };
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM pending_requests", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn decode_payload_row<T: serde::de::DeserializeOwned>(
    row: &rusqlite::Row<'_>,
) -> rusqlite::Result<T> {
    let payload: Vec<u8> = row.get(0)?;
    serde_json::from_slice(&payload).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            payload.len(),
            rusqlite::types::Type::Blob,
            Box::new(err),
        )
    })
}

fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> StoreResult<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn decode_pending_payload(payload: &[u8]) -> Result<PendingOp, String> {
    let envelope: PendingEnvelope = serde_json::from_slice(payload)
        .map_err(|e| format!("pending payload decode failed: {e}"))?;
    if envelope.format_version != PENDING_FORMAT_VERSION {
        return Err(format!(
            "unsupported pending format version: {}",
            envelope.format_version
        ));
    }
    Ok(envelope.op)
}

fn pending_kind(op: &PendingOp) -> i64 {
    match op {
        PendingOp::FavoriteUpdate { .. } => 1,
        PendingOp::ReviewCreate { .. } => 2,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
