use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sweep_core::fs::atomic_write;

use crate::{FileSnapshot, HistoryError, UndoRecord};

/// On-disk layout: one directory per committed session,
/// `<seq>-<session-id>/`, holding `manifest.json` plus `before/` and
/// `after/` trees with the full content of every touched file. Either
/// direction of a session is reconstructable without re-deriving a
/// diff.
pub struct SnapshotStore {
    root: PathBuf,
    next_seq: u64,
}

#[derive(Serialize, Deserialize)]
struct Manifest {
    session_id: String,
    label: String,
    committed_at_ms: u64,
    files: Vec<ManifestFile>,
}

#[derive(Serialize, Deserialize)]
struct ManifestFile {
    /// The file's real path, used when restoring.
    path: PathBuf,
    /// Entry name inside `before/` and `after/`.
    entry: String,
}

impl SnapshotStore {
    pub fn open(root: &Path) -> Result<Self, HistoryError> {
        fs::create_dir_all(root).map_err(|source| HistoryError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        let mut next_seq = 0;
        for entry in read_dir(root)? {
            if let Some(seq) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.split('-').next())
                .and_then(|prefix| prefix.parse::<u64>().ok())
            {
                next_seq = next_seq.max(seq + 1);
            }
        }

        Ok(Self {
            root: root.to_path_buf(),
            next_seq,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist one committed session. Assigns the next sequence number
    /// so replay order matches commit order.
    pub fn persist(&mut self, record: &UndoRecord) -> Result<(), HistoryError> {
        let dir = self
            .root
            .join(format!("{:05}-{}", self.next_seq, record.session_id));

        let manifest = Manifest {
            session_id: record.session_id.clone(),
            label: record.label.clone(),
            committed_at_ms: record.committed_at_ms,
            files: record
                .files
                .iter()
                .enumerate()
                .map(|(i, file)| ManifestFile {
                    path: file.path.clone(),
                    entry: entry_name(i, &file.path),
                })
                .collect(),
        };

        for (file, entry) in record.files.iter().zip(&manifest.files) {
            write_entry(&dir.join("before").join(&entry.entry), &file.before)?;
            write_entry(&dir.join("after").join(&entry.entry), &file.after)?;
        }

        let manifest_path = dir.join("manifest.json");
        let json = serde_json::to_vec_pretty(&manifest).map_err(|source| {
            HistoryError::Manifest {
                path: manifest_path.clone(),
                source,
            }
        })?;
        atomic_write(&manifest_path, &json).map_err(|source| HistoryError::Io {
            path: manifest_path,
            source,
        })?;

        self.next_seq += 1;
        Ok(())
    }

    /// Replay all persisted sessions in sequence order.
    ///
    /// Directories without a readable manifest are skipped with a
    /// warning rather than poisoning the whole log.
    pub fn load(&self) -> Result<Vec<UndoRecord>, HistoryError> {
        let mut dirs: Vec<PathBuf> = read_dir(&self.root)?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();

        let mut records = Vec::with_capacity(dirs.len());
        for dir in dirs {
            match self.load_session(&dir) {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(
                        target: "sweep.history",
                        dir = %dir.display(),
                        error = %err,
                        "skipping unreadable history session"
                    );
                }
            }
        }
        Ok(records)
    }

    fn load_session(&self, dir: &Path) -> Result<UndoRecord, HistoryError> {
        let manifest_path = dir.join("manifest.json");
        let bytes = fs::read(&manifest_path).map_err(|source| HistoryError::Io {
            path: manifest_path.clone(),
            source,
        })?;
        let manifest: Manifest =
            serde_json::from_slice(&bytes).map_err(|source| HistoryError::Manifest {
                path: manifest_path,
                source,
            })?;

        let mut files = Vec::with_capacity(manifest.files.len());
        for file in &manifest.files {
            files.push(FileSnapshot {
                path: file.path.clone(),
                before: read_entry(&dir.join("before").join(&file.entry))?,
                after: read_entry(&dir.join("after").join(&file.entry))?,
            });
        }

        Ok(UndoRecord {
            session_id: manifest.session_id,
            label: manifest.label,
            committed_at_ms: manifest.committed_at_ms,
            files,
        })
    }
}

fn entry_name(index: usize, path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    format!("{index:03}_{file_name}")
}

fn write_entry(path: &Path, content: &str) -> Result<(), HistoryError> {
    atomic_write(path, content.as_bytes()).map_err(|source| HistoryError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_entry(path: &Path) -> Result<String, HistoryError> {
    fs::read_to_string(path).map_err(|source| HistoryError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_dir(root: &Path) -> Result<Vec<fs::DirEntry>, HistoryError> {
    let entries = fs::read_dir(root).map_err(|source| HistoryError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    let mut out = Vec::new();
    for entry in entries {
        out.push(entry.map_err(|source| HistoryError::Io {
            path: root.to_path_buf(),
            source,
        })?);
    }
    Ok(out)
}
