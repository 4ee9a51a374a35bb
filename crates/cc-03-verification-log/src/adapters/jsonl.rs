//! # JSON-Lines Audit Sink
//!
//! Append-only file with one serialized `VerificationEntry` per line.
//!
//! A crash mid-write leaves at most one torn line at the end of the file.
//! `open` cuts that tail off so later appends start on a clean line; any
//! other undecodable line is reported as corruption. A failed append is
//! truncated away before the error is returned.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::warn;

use crate::domain::{LogError, VerificationEntry};
use crate::ports::AuditSink;

pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
    sync: bool,
}

impl JsonLinesSink {
    /// Open (or create) the audit file, fsyncing after every append.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LogError> {
        Self::open_with_sync(path, true)
    }

    /// Open without fsync per append. Entries still reach the OS on every write.
    pub fn open_with_sync(path: impl AsRef<Path>, sync: bool) -> Result<Self, LogError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;
        drop_torn_tail(&mut file, &path)?;

        Ok(Self {
            path,
            file: Mutex::new(file),
            sync,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn drop_torn_tail(file: &mut File, path: &Path) -> Result<(), LogError> {
    let mut contents = Vec::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut contents)?;

    if contents.is_empty() || contents.ends_with(b"\n") {
        return Ok(());
    }

    let keep = contents
        .iter()
        .rposition(|b| *b == b'\n')
        .map(|pos| pos + 1)
        .unwrap_or(0);
    warn!(
        path = %path.display(),
        dropped_bytes = contents.len() - keep,
        "Truncating torn audit log tail"
    );
    file.set_len(keep as u64)?;
    Ok(())
}

/// Run `write` against `file`, truncating back to the current length if it
/// fails.
fn append_or_rollback<F>(file: &mut File, write: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let len = file.metadata()?.len();
    if let Err(e) = write(file) {
        if let Err(rollback) = file.set_len(len) {
            warn!(error = %rollback, "Failed to roll back partial audit entry");
        }
        return Err(e);
    }
    Ok(())
}

impl AuditSink for JsonLinesSink {
    fn append(&self, entry: &VerificationEntry) -> Result<(), LogError> {
        let mut line =
            serde_json::to_vec(entry).map_err(|e| LogError::Serialization(e.to_string()))?;
        line.push(b'\n');

        let sync = self.sync;
        let mut file = self.file.lock();
        append_or_rollback(&mut file, |f| {
            f.write_all(&line)?;
            f.flush()?;
            if sync {
                f.sync_data()?;
            }
            Ok(())
        })?;
        Ok(())
    }

    fn replay(
        &self,
        visit: &mut dyn FnMut(VerificationEntry) -> Result<(), LogError>,
    ) -> Result<(), LogError> {
        let reader = BufReader::new(File::open(&self.path)?);

        // An undecodable line is only forgiven when nothing follows it.
        let mut pending: Option<(usize, serde_json::Error)> = None;
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Some((line, e)) = pending.take() {
                return Err(LogError::Corrupt {
                    line,
                    message: e.to_string(),
                });
            }
            match serde_json::from_str::<VerificationEntry>(&line) {
                Ok(entry) => visit(entry)?,
                Err(e) => pending = Some((idx + 1, e)),
            }
        }

        if let Some((line, e)) = pending {
            warn!(line, error = %e, "Skipping torn final audit entry");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{compute_entry_hash, VerificationOutcome};
    use shared_types::ZERO_HASH;

    fn collect(sink: &JsonLinesSink) -> Result<Vec<VerificationEntry>, LogError> {
        let mut out = Vec::new();
        sink.replay(&mut |entry| {
            out.push(entry);
            Ok(())
        })?;
        Ok(out)
    }

    fn entry(sequence: u64) -> VerificationEntry {
        let mut e = VerificationEntry {
            sequence,
            entry_id: format!("id-{sequence}"),
            subject: "CERT-20240101-00000001".into(),
            outcome: VerificationOutcome::Valid,
            client_ip: Some("127.0.0.1".parse().unwrap()),
            user_agent: None,
            verifier: Some("acme-hr".into()),
            verified_at: 42,
            suspicion_score: 10,
            flags: Vec::new(),
            suspicious: false,
            prev_hash: ZERO_HASH,
            entry_hash: ZERO_HASH,
        };
        e.entry_hash = compute_entry_hash(&e);
        e
    }

    #[test]
    fn test_append_and_replay() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonLinesSink::open(dir.path().join("audit/verifications.jsonl")).unwrap();
        sink.append(&entry(1)).unwrap();
        sink.append(&entry(2)).unwrap();

        let loaded = collect(&sink).unwrap();
        assert_eq!(loaded, vec![entry(1), entry(2)]);
    }

    #[test]
    fn test_torn_tail_is_dropped_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        {
            let sink = JsonLinesSink::open(&path).unwrap();
            sink.append(&entry(1)).unwrap();
        }
        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(b"{\"sequence\":2,\"entry_").unwrap();
        drop(f);

        let sink = JsonLinesSink::open(&path).unwrap();
        sink.append(&entry(2)).unwrap();
        assert_eq!(collect(&sink).unwrap().len(), 2);
    }

    #[test]
    fn test_corrupt_middle_line_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let line = serde_json::to_string(&entry(1)).unwrap();
        std::fs::write(&path, format!("{line}\nnot json\n{line}\n")).unwrap();

        let sink = JsonLinesSink::open(&path).unwrap();
        match collect(&sink) {
            Err(LogError::Corrupt { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected corruption error, got {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_final_line_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let line = serde_json::to_string(&entry(1)).unwrap();
        std::fs::write(&path, format!("{line}\n{{\"sequence\":2}}\n")).unwrap();

        let sink = JsonLinesSink::open(&path).unwrap();
        assert_eq!(collect(&sink).unwrap(), vec![entry(1)]);
    }

    #[test]
    fn test_failed_append_is_truncated_away() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let sink = JsonLinesSink::open(&path).unwrap();
        sink.append(&entry(1)).unwrap();
        let before = std::fs::metadata(&path).unwrap().len();

        {
            let mut file = sink.file.lock();
            let err = append_or_rollback(&mut file, |f| {
                f.write_all(b"{\"sequence\":2,\"entry_id\":")?;
                Err(io::Error::new(io::ErrorKind::Other, "sync failed"))
            })
            .unwrap_err();
            assert_eq!(err.to_string(), "sync failed");
        }
        assert_eq!(std::fs::metadata(&path).unwrap().len(), before);

        // The same sequence can be written again and the file stays readable.
        sink.append(&entry(2)).unwrap();
        drop(sink);
        let sink = JsonLinesSink::open(&path).unwrap();
        assert_eq!(collect(&sink).unwrap(), vec![entry(1), entry(2)]);
    }
}
