//! Historical size averages (SQLite)

use crate::averager::SizeAverages;
use crate::error::{CheckError, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

pub const SECONDS_PER_DAY: i64 = 86400;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoricalRecord {
    pub timestamp: i64,
    pub real_avg_mb: f64,
    pub shared_avg_mb: f64,
    pub real_total_mb: f64,
    pub running_count: u64,
}

impl HistoricalRecord {
    pub fn from_sizes(timestamp: i64, sizes: &SizeAverages) -> Self {
        Self {
            timestamp,
            real_avg_mb: sizes.real_avg_mb,
            shared_avg_mb: sizes.shared_avg_mb,
            real_total_mb: sizes.real_total_mb,
            running_count: sizes.running_count,
        }
    }
}

/// Which column picks the "largest" historical record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UseMax {
    #[default]
    #[value(name = "realavg")]
    RealAvg,
    Running,
}

impl UseMax {
    fn column(self) -> &'static str {
        match self {
            UseMax::RealAvg => "real_avg_mb",
            UseMax::Running => "running_count",
        }
    }
}

pub trait HistoryStore {
    /// Append `record`, then drop records older than `retain_days` before it.
    fn save(&mut self, record: &HistoricalRecord, retain_days: u32) -> Result<()>;

    /// The record with the largest `by` value at or after `since`.
    fn max_since(&self, since: i64, by: UseMax) -> Result<Option<HistoricalRecord>>;
}

#[derive(Debug)]
pub struct SqliteHistory {
    conn: Connection,
}

impl SqliteHistory {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CheckError::unavailable("history store", parent, e))?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        debug!("history store opened at {}", path.display());
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self { conn: Connection::open_in_memory()? };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(include_str!("../schema.sql"))?;
        Ok(())
    }

    pub fn now() -> i64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
    }

    pub fn count(&self) -> Result<u64> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM httpd_history", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn map_record(row: &rusqlite::Row) -> rusqlite::Result<HistoricalRecord> {
        Ok(HistoricalRecord {
            timestamp: row.get(0)?,
            real_avg_mb: row.get(1)?,
            shared_avg_mb: row.get(2)?,
            real_total_mb: row.get(3)?,
            running_count: row.get::<_, i64>(4)? as u64,
        })
    }
}

impl HistoryStore for SqliteHistory {
    fn save(&mut self, record: &HistoricalRecord, retain_days: u32) -> Result<()> {
        let cutoff = record.timestamp - i64::from(retain_days) * SECONDS_PER_DAY;
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO httpd_history (timestamp, real_avg_mb, shared_avg_mb, real_total_mb, running_count)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.timestamp,
                record.real_avg_mb,
                record.shared_avg_mb,
                record.real_total_mb,
                record.running_count as i64
            ],
        )?;
        let pruned = tx.execute("DELETE FROM httpd_history WHERE timestamp < ?1", params![cutoff])?;
        tx.commit()?;
        info!("saved averages to history, pruned {} old records", pruned);
        Ok(())
    }

    fn max_since(&self, since: i64, by: UseMax) -> Result<Option<HistoricalRecord>> {
        let sql = format!(
            "SELECT timestamp, real_avg_mb, shared_avg_mb, real_total_mb, running_count
             FROM httpd_history WHERE timestamp >= ?1
             ORDER BY {} DESC, timestamp DESC LIMIT 1",
            by.column()
        );
        let record = self
            .conn
            .query_row(&sql, params![since], Self::map_record)
            .optional()?;
        Ok(record)
    }
}
