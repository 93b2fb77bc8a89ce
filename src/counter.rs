//! Per-day tally of processed invoices, persisted across restarts.

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fs, io::ErrorKind, path::PathBuf};

/// Namespace key the record is stored under.
pub const COUNTER_KEY: &str = "processedInvoices";

/// Persisted `{date, count}` record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounter {
    pub date: NaiveDate,
    pub count: u32,
}

/// Where the counter record lives.
pub trait CounterStorage {
    /// Read the stored record, `None` when nothing was ever saved.
    fn load(&self) -> Result<Option<DailyCounter>>;
    /// Overwrite the stored record.
    fn save(&mut self, record: &DailyCounter) -> Result<()>;
}

/// Stores the record as JSON in `<dir>/processedInvoices.json`.
#[derive(Clone, Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(format!("{COUNTER_KEY}.json")),
        }
    }
}

impl CounterStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<DailyCounter>> {
        match fs::read(&self.path) {
            Ok(data) if data.is_empty() => Ok(None),
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, record: &DailyCounter) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec(record)?)?;
        Ok(())
    }
}

/// Volatile storage for tests.
#[cfg(test)]
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    pub record: Option<DailyCounter>,
}

#[cfg(test)]
impl CounterStorage for MemoryStorage {
    fn load(&self) -> Result<Option<DailyCounter>> {
        Ok(self.record)
    }

    fn save(&mut self, record: &DailyCounter) -> Result<()> {
        self.record = Some(*record);
        Ok(())
    }
}

/// Date-scoped counter on top of a storage port.
///
/// The count resets whenever the stored date differs from today and grows by
/// exactly one per completed processing run.
#[derive(Debug)]
pub struct CounterStore<S> {
    storage: S,
}

impl<S: CounterStorage> CounterStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Count for `today`, resetting the stored record when it is stale.
    pub fn load(&mut self, today: NaiveDate) -> u32 {
        match self.read() {
            Some(rec) if rec.date == today => rec.count,
            _ => {
                self.write(DailyCounter {
                    date: today,
                    count: 0,
                });
                0
            }
        }
    }

    /// Record one more completion for `today` and return the new count.
    pub fn increment(&mut self, today: NaiveDate) -> u32 {
        let count = match self.read() {
            Some(rec) if rec.date == today => rec.count.saturating_add(1),
            _ => 1,
        };
        self.write(DailyCounter { date: today, count });
        count
    }

    fn read(&self) -> Option<DailyCounter> {
        self.storage.load().unwrap_or_else(|e| {
            tracing::warn!("counter read failed, starting fresh: {e}");
            None
        })
    }

    fn write(&mut self, record: DailyCounter) {
        if let Err(e) = self.storage.save(&record) {
            tracing::warn!("counter write failed: {e}");
        }
    }

    #[cfg(test)]
    pub fn storage(&self) -> &S {
        &self.storage
    }
}
