//! Output Sink: two rolling buffers, one per record kind, merged across every
//! exchange, each rewritten in full to a fixed newline-delimited JSON file
//! (one record per line) on every append, plus one append-only BSON file per
//! (exchange, kind, UTC date). Every buffer is
//! trimmed to the retention window by received time on every append; trade
//! records additionally get a pre-buffer discard by their own embedded
//! timestamp, so a trade that arrives late (but still inside the receive
//! window) doesn't linger past the window its own timestamp belongs to.
//! Ticker records skip that extra discard — only the post-append trim below
//! applies to them, matching the behavior of the system this was distilled
//! from.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ingest_protocol::{timestamp, Record, RecordKind};
use tracing::error;

use crate::error::CollectorError;

#[derive(Debug, Clone)]
struct BufferedRecord {
    record: Record,
    received_at: DateTime<Utc>,
}

struct Buffer {
    records: Vec<BufferedRecord>,
}

struct BsonKey {
    exchange: String,
    kind: RecordKind,
}

pub struct OutputSink {
    output_dir: PathBuf,
    bson_dir: PathBuf,
    retention: Duration,
    buffers: HashMap<RecordKind, Buffer>,
}

impl OutputSink {
    pub fn new(output_dir: impl Into<PathBuf>, bson_dir: impl Into<PathBuf>, retention: Duration) -> Self {
        Self {
            output_dir: output_dir.into(),
            bson_dir: bson_dir.into(),
            retention,
            buffers: HashMap::new(),
        }
    }

    /// Appends `record` to both outputs: the kind-wide rolling JSON file
    /// (fully rewritten) and the append-only BSON file for today's UTC date,
    /// scoped to the record's own exchange.
    pub fn append(&mut self, record: Record) -> Result<(), CollectorError> {
        let now = Utc::now();
        let kind = record.kind();
        let bson_key = BsonKey { exchange: record.exchange().to_string(), kind };

        self.append_bson(&bson_key, &record, now)?;

        if !self.buffers.contains_key(&kind) {
            let loaded = self.load_existing(kind, now);
            self.buffers.insert(kind, loaded);
        }
        let cutoff = self.cutoff(now);
        let buffer = self.buffers.get_mut(&kind).expect("buffer was just inserted if missing");

        if kind == RecordKind::Trade {
            buffer.records.retain(|r| {
                timestamp::parse_canonical(r.record.timestamp()).unwrap_or(r.received_at) >= cutoff
            });
        }

        buffer.records.push(BufferedRecord { record, received_at: now });
        buffer.records.retain(|r| r.received_at >= cutoff);

        self.rewrite_json(kind)
    }

    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - chrono::Duration::from_std(self.retention).unwrap_or(chrono::Duration::zero())
    }

    /// Seeds a newly-encountered buffer from its on-disk JSON file, discarding
    /// entries already older than the retention window — the lazy-per-kind
    /// equivalent of loading every rolling buffer from disk at startup.
    fn load_existing(&self, kind: RecordKind, now: DateTime<Utc>) -> Buffer {
        let path = self.json_path(kind);
        let records: Vec<Record> = std::fs::read_to_string(&path)
            .map(|text| {
                text.lines()
                    .filter(|line| !line.trim().is_empty())
                    .filter_map(|line| serde_json::from_str(line).ok())
                    .collect()
            })
            .unwrap_or_default();

        let cutoff = self.cutoff(now);
        let records = records
            .into_iter()
            .filter_map(|record| {
                let received_at = timestamp::parse_canonical(record.timestamp()).unwrap_or(now);
                (received_at >= cutoff).then_some(BufferedRecord { record, received_at })
            })
            .collect();
        Buffer { records }
    }

    fn json_path(&self, kind: RecordKind) -> PathBuf {
        let name = match kind {
            RecordKind::Ticker => "ticker_output_data.json",
            RecordKind::Trade => "trades_output_data.json",
        };
        self.output_dir.join(name)
    }

    fn bson_path(&self, key: &BsonKey, now: DateTime<Utc>) -> PathBuf {
        self.bson_dir.join(format!(
            "{}_{}_{}.bson",
            key.exchange.to_lowercase(),
            key.kind.as_str(),
            now.format("%Y-%m-%d")
        ))
    }

    fn rewrite_json(&self, kind: RecordKind) -> Result<(), CollectorError> {
        let buffer = self.buffers.get(&kind).expect("buffer exists for kind just inserted into");
        let path = self.json_path(kind);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CollectorError::OutputIo {
                path: path.display().to_string(),
                source,
            })?;
        }
        let mut lines = Vec::with_capacity(buffer.records.len());
        for buffered in &buffer.records {
            let line = serde_json::to_string(&buffered.record).map_err(|source| CollectorError::OutputIo {
                path: path.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, source),
            })?;
            lines.push(line);
        }
        let mut ndjson = lines.join("\n");
        if !ndjson.is_empty() {
            ndjson.push('\n');
        }
        std::fs::write(&path, ndjson).map_err(|source| CollectorError::OutputIo {
            path: path.display().to_string(),
            source,
        })
    }

    fn append_bson(&self, key: &BsonKey, record: &Record, now: DateTime<Utc>) -> Result<(), CollectorError> {
        let path = self.bson_path(key, now);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CollectorError::OutputIo {
                path: path.display().to_string(),
                source,
            })?;
        }
        let doc = record.to_bson_document().map_err(|err| CollectorError::OutputIo {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, err.to_string()),
        })?;
        let mut bytes = Vec::new();
        doc.to_writer(&mut bytes).map_err(|err| CollectorError::OutputIo {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, err.to_string()),
        })?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| CollectorError::OutputIo { path: path.display().to_string(), source })?;
        file.write_all(&bytes).map_err(|source| CollectorError::OutputIo {
            path: path.display().to_string(),
            source,
        })
    }

    /// Flushes every buffer's JSON rewrite; called during orderly shutdown.
    pub fn flush_all(&self) {
        for &kind in self.buffers.keys() {
            if let Err(err) = self.rewrite_json(kind) {
                error!("failed to flush output for {}: {}", kind.as_str(), err);
            }
        }
    }
}
