//! # Block Journal
//!
//! JSON-lines file holding one sealed `LedgerBlock` per line. The ledger
//! replays it on open and appends to it before a block becomes visible.
//!
//! A torn final line is cut off on open. A failed append truncates the file
//! back to its previous length so the next block can reuse the height.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::domain::{AnchorError, LedgerBlock};

pub(crate) struct BlockJournal {
    path: PathBuf,
    file: File,
}

fn storage(path: &Path, err: impl std::fmt::Display) -> AnchorError {
    AnchorError::Storage(format!("{}: {err}", path.display()))
}

impl BlockJournal {
    /// Open (or create) the journal and return the blocks it holds.
    pub(crate) fn open(path: &Path) -> Result<(Self, Vec<LedgerBlock>), AnchorError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| storage(path, e))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| storage(path, e))?;
        drop_torn_tail(&mut file, path)?;

        let reader = BufReader::new(File::open(path).map_err(|e| storage(path, e))?);
        let mut blocks = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| storage(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let block: LedgerBlock = serde_json::from_str(&line)
                .map_err(|e| storage(path, format!("line {}: {e}", idx + 1)))?;
            blocks.push(block);
        }

        Ok((
            Self {
                path: path.to_path_buf(),
                file,
            },
            blocks,
        ))
    }

    /// Durably append `block`. On error the file is left as it was.
    pub(crate) fn append(&mut self, block: &LedgerBlock) -> Result<(), AnchorError> {
        let mut line = serde_json::to_vec(block).map_err(|e| storage(&self.path, e))?;
        line.push(b'\n');

        let len = self
            .file
            .metadata()
            .map_err(|e| storage(&self.path, e))?
            .len();
        let written = self
            .file
            .write_all(&line)
            .and_then(|()| self.file.flush())
            .and_then(|()| self.file.sync_data());
        if let Err(e) = written {
            if let Err(rollback) = self.file.set_len(len) {
                warn!(
                    path = %self.path.display(),
                    error = %rollback,
                    "Failed to roll back partial ledger block"
                );
            }
            return Err(storage(&self.path, e));
        }
        Ok(())
    }
}

fn drop_torn_tail(file: &mut File, path: &Path) -> Result<(), AnchorError> {
    let mut contents = Vec::new();
    file.seek(SeekFrom::Start(0))
        .and_then(|_| file.read_to_end(&mut contents))
        .map_err(|e| storage(path, e))?;

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
        "Truncating torn ledger journal tail"
    );
    file.set_len(keep as u64).map_err(|e| storage(path, e))
}
