//! ---
//! trk_section: "03-persistence-logging"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Persistence abstractions and storage bindings."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{snapshot::SNAPSHOT_VERSION, PersistenceError, Result};

const JOURNAL_FORMAT: &str = "r-track-journal";

/// First line of every journal file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct JournalHeader {
    format: String,
    version: u16,
    created_at: DateTime<Utc>,
}

impl JournalHeader {
    fn new() -> Self {
        Self {
            format: JOURNAL_FORMAT.to_owned(),
            version: SNAPSHOT_VERSION,
            created_at: Utc::now(),
        }
    }
}

/// One applied store action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Sequential identifier assigned when appending.
    pub sequence: u64,
    /// Timestamp when the action was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Short action name, e.g. `station.move`.
    pub kind: String,
    /// Serialized action.
    pub payload: serde_json::Value,
}

impl JournalEntry {
    /// Construct an entry; the sequence is assigned by [`JournalWriter::append`].
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            sequence: 0,
            recorded_at: Utc::now(),
            kind: kind.into(),
            payload,
        }
    }
}

/// Append-only writer for the action journal.
#[derive(Debug)]
pub struct JournalWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    next_sequence: u64,
}

impl JournalWriter {
    /// Open a journal for appending, writing a header if the file is new.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let fresh = !path.exists() || fs::metadata(path)?.len() == 0;
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);

        let last_sequence = if fresh {
            let line = serde_json::to_string(&JournalHeader::new())?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            0
        } else {
            last_sequence(path)?
        };

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            next_sequence: last_sequence + 1,
        })
    }

    /// Append an entry and return the assigned sequence number and byte count.
    pub fn append(&mut self, mut entry: JournalEntry) -> Result<(u64, usize)> {
        entry.sequence = self.next_sequence;
        let line = serde_json::to_string(&entry)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.next_sequence += 1;
        Ok((entry.sequence, line.len() + 1))
    }

    /// Path of the journal on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn last_sequence(path: &Path) -> Result<u64> {
    let mut last = 0u64;
    for entry in JournalReader::open(path)? {
        match entry {
            Ok(entry) => last = entry.sequence,
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "skipping unreadable journal line"
                );
            }
        }
    }
    Ok(last)
}

/// Replay the journal in order, invoking the callback for each entry.
pub fn replay<F>(path: &Path, mut handler: F) -> Result<usize>
where
    F: FnMut(JournalEntry) -> Result<()>,
{
    let mut count = 0usize;
    for entry in JournalReader::open(path)? {
        handler(entry?)?;
        count += 1;
    }
    Ok(count)
}

/// Streaming iterator over journal entries.
pub struct JournalReader {
    lines: std::io::Lines<BufReader<File>>,
}

impl JournalReader {
    /// Open the journal for sequential reading, skipping the header line.
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut header = String::new();
        reader.read_line(&mut header)?;
        Ok(Self {
            lines: reader.lines(),
        })
    }
}

impl Iterator for JournalReader {
    type Item = Result<JournalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => {
                    return Some(serde_json::from_str(&line).map_err(PersistenceError::from))
                }
                Err(err) => return Some(Err(err.into())),
            }
        }
    }
}
