//! Event journal using RocksDB
//!
//! # Column Families
//!
//! - `events` - Append-only event records (key: sequence, big-endian)
//! - `meta` - Journal metadata (key: `latest`)

use crate::{
    config::JournalConfig,
    error::{Error, Result},
    events::EventRecord,
};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};

/// Column family names
const CF_EVENTS: &str = "events";
const CF_META: &str = "meta";

const KEY_LATEST: &[u8] = b"latest";

/// Durable copy of the event log
pub struct EventJournal {
    db: DB,
}

impl std::fmt::Debug for EventJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventJournal")
            .field("path", &self.db.path())
            .finish()
    }
}

impl EventJournal {
    /// Open or create the journal
    pub fn open(config: &JournalConfig) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(config.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.max_background_jobs);

        if config.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_EVENTS, Self::cf_options_events()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened event journal");

        Ok(Self { db })
    }

    /// Open an existing journal for reading only; appends fail
    pub fn open_read_only(config: &JournalConfig) -> Result<Self> {
        let path = &config.data_dir;
        let db = DB::open_cf_for_read_only(&Options::default(), path, [CF_EVENTS, CF_META], false)?;

        tracing::info!(path = ?path, "Opened event journal read-only");

        Ok(Self { db })
    }

    fn cf_options_events() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    /// Append one record and advance the `latest` pointer atomically
    pub fn append(&self, record: &EventRecord) -> Result<()> {
        let cf_events = self.cf_handle(CF_EVENTS)?;
        let cf_meta = self.cf_handle(CF_META)?;

        let key = record.sequence.to_be_bytes();
        let value = bincode::serialize(record)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(cf_events, key, &value);
        batch.put_cf(cf_meta, KEY_LATEST, key);
        self.db.write(batch)?;

        Ok(())
    }

    /// Record by sequence number
    pub fn get(&self, sequence: u64) -> Result<EventRecord> {
        let cf = self.cf_handle(CF_EVENTS)?;

        let value = self
            .db
            .get_cf(cf, sequence.to_be_bytes())?
            .ok_or_else(|| Error::NotFound(format!("journal record {}", sequence)))?;

        Ok(bincode::deserialize(&value)?)
    }

    /// Highest record written so far
    pub fn latest(&self) -> Result<Option<EventRecord>> {
        let cf_meta = self.cf_handle(CF_META)?;

        let Some(raw) = self.db.get_cf(cf_meta, KEY_LATEST)? else {
            return Ok(None);
        };

        let bytes: [u8; 8] = raw
            .as_slice()
            .try_into()
            .map_err(|_| Error::Storage("corrupt latest pointer".to_string()))?;

        self.get(u64::from_be_bytes(bytes)).map(Some)
    }

    /// Up to `limit` records starting at `from`
    pub fn range(&self, from: u64, limit: usize) -> Result<Vec<EventRecord>> {
        let cf = self.cf_handle(CF_EVENTS)?;
        let start = from.to_be_bytes();

        let mut records = Vec::new();
        for item in self
            .db
            .iterator_cf(cf, IteratorMode::From(&start, Direction::Forward))
            .take(limit)
        {
            let (_, value) = item?;
            records.push(bincode::deserialize(&value)?);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, EventLog, EventSink};
    use crate::types::Address;
    use std::sync::Arc;

    fn journal_config(dir: &tempfile::TempDir) -> JournalConfig {
        JournalConfig {
            enabled: true,
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_journal() {
        let dir = tempfile::tempdir().unwrap();
        let journal = EventJournal::open(&journal_config(&dir)).unwrap();
        assert!(journal.latest().unwrap().is_none());
        assert!(journal.get(1).is_err());
    }

    #[test]
    fn test_write_through_and_range() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Arc::new(EventJournal::open(&journal_config(&dir)).unwrap());
        let log = EventLog::with_journal(journal.clone(), 100).unwrap();

        for ts in 0..3 {
            log.publish(ts, Event::Paused { by: Address::new("admin") });
        }

        let latest = journal.latest().unwrap().unwrap();
        assert_eq!(latest.sequence, 3);
        assert_eq!(journal.range(2, 10).unwrap().len(), 2);
        assert_eq!(journal.get(1).unwrap(), log.records()[0]);
    }

    #[test]
    fn test_log_resumes_chain_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let last_hash = {
            let journal = Arc::new(EventJournal::open(&journal_config(&dir)).unwrap());
            let log = EventLog::with_journal(journal, 100).unwrap();
            log.publish(1, Event::Paused { by: Address::new("admin") });
            log.last().unwrap().hash
        };

        let journal = Arc::new(EventJournal::open(&journal_config(&dir)).unwrap());
        let log = EventLog::with_journal(journal.clone(), 100).unwrap();
        log.publish(2, Event::Unpaused { by: Address::new("admin") });

        let record = log.last().unwrap();
        assert_eq!(record.sequence, 2);
        assert_eq!(record.previous_hash, last_hash);
        assert!(crate::crypto::verify_chain(&journal.range(1, 10).unwrap()));
    }

    #[test]
    fn test_memory_tail_served_from_journal() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Arc::new(EventJournal::open(&journal_config(&dir)).unwrap());
        let log = EventLog::with_journal(journal, 2).unwrap();

        for ts in 0..5 {
            log.publish(ts, Event::Paused { by: Address::new("admin") });
        }

        assert_eq!(log.len(), 2);
        assert_eq!(log.last_sequence(), 5);

        let all = log.since(1);
        let sequences: Vec<u64> = all.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
        assert!(crate::crypto::verify_chain(&all));
        assert_eq!(log.since(4).len(), 2);
        assert!(log.since(6).is_empty());
    }

    #[test]
    fn test_failed_append_degrades_log() {
        let dir = tempfile::tempdir().unwrap();
        {
            let journal = Arc::new(EventJournal::open(&journal_config(&dir)).unwrap());
            let log = EventLog::with_journal(journal, 100).unwrap();
            log.publish(1, Event::Paused { by: Address::new("admin") });
            assert!(!log.is_degraded());
            assert!(log.verify_chain());
        }

        let journal = Arc::new(EventJournal::open_read_only(&journal_config(&dir)).unwrap());
        let log = EventLog::with_journal(journal.clone(), 100).unwrap();
        log.publish(2, Event::Unpaused { by: Address::new("admin") });

        assert_eq!(log.journal_failures(), 1);
        assert!(log.is_degraded());
        assert!(!log.verify_chain());
        assert_eq!(journal.latest().unwrap().unwrap().sequence, 1);
    }
}
