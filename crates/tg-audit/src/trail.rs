// trail.rs — Append-only JSONL audit trail.
//
// One JSON object per line. Append-friendly, greppable, and trivially
// parsed by standard tools. Each record carries the SHA-256 of the
// previous record's JSON line, so the whole file forms a hash chain:
// inserting, deleting or editing any line breaks verification.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::AuditError;
use crate::record::AuditRecord;

/// Hex-encoded SHA-256 of a JSON line.
fn hash_line(line: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(line.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// An append-only audit trail backed by a JSONL file.
///
/// Flushes after every record: an audit entry that exists only in a buffer
/// is not an audit entry.
pub struct AuditTrail {
    writer: BufWriter<File>,
    path: PathBuf,
    /// Hash of the last line written — chained into the next record.
    last_hash: Option<String>,
}

impl AuditTrail {
    /// Open (or create) an audit trail at the given path.
    ///
    /// If the file already exists, the last line's hash is recovered so new
    /// records continue the chain instead of restarting it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();

        let last_hash = if path.exists() {
            Self::read_last_hash(&path)?
        } else {
            None
        };

        // Append mode: existing records are never overwritten.
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::OpenFailed {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            writer: BufWriter::new(file),
            path,
            last_hash,
        })
    }

    /// The file this trail writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record, linking it into the hash chain and flushing to disk.
    pub fn append(&mut self, record: &mut AuditRecord) -> Result<(), AuditError> {
        record.previous_hash = self.last_hash.clone();

        let json = serde_json::to_string(record)?;
        self.last_hash = Some(hash_line(&json));

        writeln!(self.writer, "{}", json)?;
        self.writer.flush()?;

        Ok(())
    }

    /// Read all records from a trail file, oldest first. Blank lines are skipped.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<AuditRecord>, AuditError> {
        let file = File::open(path.as_ref()).map_err(|source| AuditError::OpenFailed {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }

        Ok(records)
    }

    /// Verify a trail file's hash chain.
    ///
    /// Returns `Ok(true)` when every record's `previous_hash` matches the
    /// hash of the preceding line, or an `IntegrityViolation` naming the
    /// first broken link.
    pub fn verify_chain(path: impl AsRef<Path>) -> Result<bool, AuditError> {
        let file = File::open(path.as_ref()).map_err(|source| AuditError::OpenFailed {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);

        let mut previous_hash: Option<String> = None;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: AuditRecord = serde_json::from_str(&line)?;
            if record.previous_hash != previous_hash {
                return Err(AuditError::IntegrityViolation {
                    line: index + 1,
                    expected: previous_hash.unwrap_or_else(|| "none".to_string()),
                    actual: record.previous_hash.unwrap_or_else(|| "none".to_string()),
                });
            }
            previous_hash = Some(hash_line(&line));
        }

        Ok(true)
    }

    /// Recover the hash of the last non-empty line of an existing file.
    fn read_last_hash(path: &Path) -> Result<Option<String>, AuditError> {
        let file = File::open(path).map_err(|source| AuditError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);

        let mut last_line: Option<String> = None;
        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                last_line = Some(line);
            }
        }

        Ok(last_line.map(|line| hash_line(&line)))
    }
}
