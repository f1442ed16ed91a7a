//! Durable ledger state
//!
//! Every change to a device goes through [`LedgerStore::transact`], which
//! reads the device's counters, lets the caller modify them and commits the
//! result as one unit. Telemetry history is append-only and never rewritten.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anchor_lang::prelude::Pubkey;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::telemetry::TelemetrySample;
use crate::{LedgerError, Result};

/// How long a writer waits for another connection to release the database
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Accrual state for one device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub unclaimed_rewards: u64,
    #[serde(default)]
    pub last_ping_at: Option<DateTime<Utc>>,
    /// Accepted readings, oldest first
    #[serde(default, rename = "data")]
    pub history: Vec<TelemetrySample>,
    /// Lifetime total named by the newest voucher, or the synced on-ledger
    /// `total_claimed` if that is higher
    #[serde(default)]
    pub vouched_total: u64,
}

/// A device's counters, without its history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceRecord {
    pub unclaimed_rewards: u64,
    pub vouched_total: u64,
    pub last_ping_at: Option<DateTime<Utc>>,
}

/// Changes staged for one device inside a transaction
#[derive(Debug, Default)]
pub struct DeviceUpdate {
    pub record: DeviceRecord,
    appended: Vec<TelemetrySample>,
}

impl DeviceUpdate {
    fn new(record: DeviceRecord) -> Self {
        Self {
            record,
            appended: Vec::new(),
        }
    }

    /// Queue a reading for the device's history
    pub fn append(&mut self, sample: TelemetrySample) {
        self.appended.push(sample);
    }
}

pub trait LedgerStore: Send + Sync {
    /// Run `update` against the device's current record and commit atomically
    ///
    /// Nothing is written when `update` fails. Transactions on the same
    /// device never interleave, across store handles included.
    fn transact<T>(
        &self,
        device: &Pubkey,
        update: impl FnOnce(&mut DeviceUpdate) -> Result<T>,
    ) -> Result<T>;

    fn entry(&self, device: &Pubkey) -> Result<Option<LedgerEntry>>;

    fn device_count(&self) -> Result<usize>;
}

/// SQLite-backed store
///
/// Each transaction starts `IMMEDIATE`, taking the write lock before the
/// device is read, so separate processes sharing one database file
/// serialize their read-modify-write cycles.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let store = Self::with_connection(conn)?;
        info!("Opened ledger database {}", path.display());
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS devices (
                device TEXT PRIMARY KEY,
                unclaimed_rewards INTEGER NOT NULL,
                vouched_total INTEGER NOT NULL,
                last_ping_at TEXT
            );
            CREATE TABLE IF NOT EXISTS telemetry (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device TEXT NOT NULL,
                temperature REAL NOT NULL,
                humidity REAL NOT NULL,
                received_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_telemetry_device ON telemetry (device, id);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl LedgerStore for SqliteStore {
    fn transact<T>(
        &self,
        device: &Pubkey,
        update: impl FnOnce(&mut DeviceUpdate) -> Result<T>,
    ) -> Result<T> {
        let key = device.to_string();
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut pending = DeviceUpdate::new(read_record(&tx, &key)?.unwrap_or_default());
        // an error here drops `tx`, which rolls it back
        let value = update(&mut pending)?;

        let record = pending.record;
        tx.execute(
            "INSERT INTO devices (device, unclaimed_rewards, vouched_total, last_ping_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (device) DO UPDATE SET
                unclaimed_rewards = excluded.unclaimed_rewards,
                vouched_total = excluded.vouched_total,
                last_ping_at = excluded.last_ping_at",
            params![
                key,
                to_db(record.unclaimed_rewards)?,
                to_db(record.vouched_total)?,
                record.last_ping_at.map(|at| at.to_rfc3339()),
            ],
        )?;
        for sample in &pending.appended {
            tx.execute(
                "INSERT INTO telemetry (device, temperature, humidity, received_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    key,
                    sample.temperature,
                    sample.humidity,
                    sample.received_at.to_rfc3339(),
                ],
            )?;
        }
        tx.commit()?;

        debug!(
            "Committed {}: unclaimed={} vouched_total={} appended={}",
            key,
            record.unclaimed_rewards,
            record.vouched_total,
            pending.appended.len()
        );
        Ok(value)
    }

    fn entry(&self, device: &Pubkey) -> Result<Option<LedgerEntry>> {
        let key = device.to_string();
        let conn = self.conn.lock();

        let Some(record) = read_record(&conn, &key)? else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT temperature, humidity, received_at FROM telemetry
             WHERE device = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![key], |row| {
                Ok((
                    row.get::<_, f64>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let history = rows
            .into_iter()
            .map(|(temperature, humidity, received_at)| {
                Ok(TelemetrySample {
                    temperature,
                    humidity,
                    received_at: parse_time(&received_at)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(LedgerEntry {
            unclaimed_rewards: record.unclaimed_rewards,
            last_ping_at: record.last_ping_at,
            history,
            vouched_total: record.vouched_total,
        }))
    }

    fn device_count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM devices", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

fn read_record(conn: &Connection, key: &str) -> Result<Option<DeviceRecord>> {
    let row = conn
        .query_row(
            "SELECT unclaimed_rewards, vouched_total, last_ping_at FROM devices WHERE device = ?1",
            params![key],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        )
        .optional()?;

    row.map(|(unclaimed_rewards, vouched_total, last_ping_at)| {
        Ok(DeviceRecord {
            unclaimed_rewards: from_db(unclaimed_rewards)?,
            vouched_total: from_db(vouched_total)?,
            last_ping_at: last_ping_at.as_deref().map(parse_time).transpose()?,
        })
    })
    .transpose()
}

/// SQLite integers are signed; amounts beyond `i64::MAX` are not stored
fn to_db(amount: u64) -> Result<i64> {
    i64::try_from(amount).map_err(|_| LedgerError::RewardOverflow)
}

fn from_db(amount: i64) -> Result<u64> {
    u64::try_from(amount).map_err(|_| LedgerError::Corrupt(format!("negative amount {}", amount)))
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| LedgerError::Corrupt(format!("timestamp {:?}: {}", value, e)))
}

/// Non-durable store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    devices: Mutex<BTreeMap<String, LedgerEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryStore {
    fn transact<T>(
        &self,
        device: &Pubkey,
        update: impl FnOnce(&mut DeviceUpdate) -> Result<T>,
    ) -> Result<T> {
        let key = device.to_string();
        let mut devices = self.devices.lock();

        let record = devices.get(&key).map_or_else(DeviceRecord::default, |entry| DeviceRecord {
            unclaimed_rewards: entry.unclaimed_rewards,
            vouched_total: entry.vouched_total,
            last_ping_at: entry.last_ping_at,
        });
        let mut pending = DeviceUpdate::new(record);
        let value = update(&mut pending)?;

        let entry = devices.entry(key).or_default();
        entry.unclaimed_rewards = pending.record.unclaimed_rewards;
        entry.vouched_total = pending.record.vouched_total;
        entry.last_ping_at = pending.record.last_ping_at;
        entry.history.append(&mut pending.appended);
        Ok(value)
    }

    fn entry(&self, device: &Pubkey) -> Result<Option<LedgerEntry>> {
        Ok(self.devices.lock().get(&device.to_string()).cloned())
    }

    fn device_count(&self) -> Result<usize> {
        Ok(self.devices.lock().len())
    }
}
