//! File-backed counter artifacts with atomic updates.
//!
//! Artifacts are named `<prefix><ordinal>` with the ordinal zero-padded to
//! five digits, so lexical order matches numeric order for monitors that pick
//! the "last" file. Allocation still parses ordinals numerically, so foreign
//! or unpadded names are handled too.
//! Allocation assumes a single writer: two supervisors racing on the same
//! directory may both pick the same ordinal.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{HelmError, Result};

/// Session ordinal embedded in a counter artifact's name.
pub type SessionId = u64;

/// Suffix for in-flight writes.
const TMP_SUFFIX: &str = ".tmp";

/// Directory of per-session failure counters.
#[derive(Debug, Clone)]
pub struct CounterStore {
    dir: PathBuf,
    prefix: String,
}

impl CounterStore {
    /// Create a store over `dir`. Nothing touches the filesystem until allocation.
    pub fn new(dir: impl AsRef<Path>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            prefix: prefix.into(),
        }
    }

    /// Storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path this store writes for `session_id`.
    pub fn artifact_path(&self, session_id: SessionId) -> PathBuf {
        self.dir.join(format!("{}{:05}", self.prefix, session_id))
    }

    fn tmp_path(&self, session_id: SessionId) -> PathBuf {
        self.dir.join(format!(".{}{:05}{}", self.prefix, session_id, TMP_SUFFIX))
    }

    /// Extract the ordinal from an artifact file name.
    ///
    /// Names without the prefix, or with a non-numeric suffix, yield `None`.
    fn parse_ordinal(&self, name: &str) -> Option<SessionId> {
        let suffix = name.strip_prefix(&self.prefix)?;
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        suffix.parse().ok()
    }

    /// Every counter artifact in the directory with its real path, ascending by ordinal.
    fn artifacts(&self) -> Result<Vec<(SessionId, PathBuf)>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(HelmError::Storage(format!("failed to list {}: {}", self.dir.display(), e)));
            }
        };

        let mut artifacts = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| HelmError::Storage(format!("failed to list {}: {}", self.dir.display(), e)))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            match self.parse_ordinal(name) {
                Some(ordinal) => artifacts.push((ordinal, entry.path())),
                None => log::trace!("Ignoring non-counter entry {}", name),
            }
        }
        artifacts.sort();
        Ok(artifacts)
    }

    /// Pick the next session ordinal: highest existing ordinal + 1, or 1.
    ///
    /// Creates the storage directory when missing.
    pub fn allocate_session(&self) -> Result<SessionId> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| HelmError::Storage(format!("failed to create {}: {}", self.dir.display(), e)))?;

        let next = match self.artifacts()?.last() {
            Some((last, _)) => last
                .checked_add(1)
                .ok_or_else(|| HelmError::Storage(format!("session ordinal overflow after {}", last)))?,
            None => 1,
        };
        log::debug!("Allocated session {} in {}", next, self.dir.display());
        Ok(next)
    }

    /// Create the artifact for a fresh session with content "0".
    pub fn initialize(&self, session_id: SessionId) -> Result<()> {
        let path = self.artifact_path(session_id);
        if path.exists() {
            log::warn!(
                "Counter artifact {} already exists; allocation is single-writer, overwriting",
                path.display()
            );
        }
        self.update(session_id, 0)
    }

    /// Atomically replace the session's artifact with `count`.
    pub fn update(&self, session_id: SessionId, count: u32) -> Result<()> {
        let tmp_path = self.tmp_path(session_id);
        let path = self.artifact_path(session_id);

        let write = || -> std::io::Result<()> {
            let mut tmp_file = File::create(&tmp_path)?;
            tmp_file.write_all(count.to_string().as_bytes())?;
            tmp_file.sync_all()?;
            fs::rename(&tmp_path, &path)
        };

        write().map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            HelmError::Storage(format!("failed to write {}: {}", path.display(), e))
        })
    }

    fn read_path(path: &Path) -> Result<u32> {
        let content = fs::read_to_string(path)
            .map_err(|e| HelmError::Storage(format!("failed to read {}: {}", path.display(), e)))?;
        content
            .trim()
            .parse()
            .map_err(|_| HelmError::Storage(format!("{} holds non-numeric content '{}'", path.display(), content.trim())))
    }

    /// Read the persisted count for `session_id`, whatever padding its name uses.
    pub fn read(&self, session_id: SessionId) -> Result<u32> {
        let path = self
            .artifacts()?
            .into_iter()
            .find(|(id, _)| *id == session_id)
            .map(|(_, path)| path)
            .unwrap_or_else(|| self.artifact_path(session_id));
        Self::read_path(&path)
    }

    /// Every session with its persisted count, ordered by ordinal.
    pub fn list_sessions(&self) -> Result<Vec<(SessionId, u32)>> {
        self.artifacts()?
            .into_iter()
            .map(|(id, path)| Self::read_path(&path).map(|count| (id, count)))
            .collect()
    }
}
