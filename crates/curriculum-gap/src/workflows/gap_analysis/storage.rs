use super::domain::{DocumentKind, Mapping, SessionId, StructuredTopicSet};
use super::jobs::ReportPaths;
use super::report::{mapping_csv, render_markdown, FinalReport};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Durable per-session artifacts written by the pipeline and served back to callers.
pub trait ArtifactStore: Send + Sync {
    fn save_structured(
        &self,
        session_id: &SessionId,
        kind: DocumentKind,
        topics: &StructuredTopicSet,
    ) -> Result<PathBuf, StorageError>;
    fn save_mapping(&self, session_id: &SessionId, mapping: &Mapping) -> Result<PathBuf, StorageError>;
    /// Persists the report JSON and its rendered document.
    fn save_report(
        &self,
        session_id: &SessionId,
        report: &FinalReport,
        mapping_path: PathBuf,
    ) -> Result<ReportPaths, StorageError>;
    fn load_report(&self, session_id: &SessionId) -> Result<Option<FinalReport>, StorageError>;
    fn load_mapping(&self, session_id: &SessionId) -> Result<Option<Mapping>, StorageError>;
    fn report_document(&self, session_id: &SessionId) -> Result<Option<String>, StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to export mapping CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Flat directory of `{session}_{artifact}` files.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    results_dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(results_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let results_dir = results_dir.into();
        fs::create_dir_all(&results_dir).map_err(|source| StorageError::Io {
            path: results_dir.clone(),
            source,
        })?;
        Ok(Self { results_dir })
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    fn path_for(&self, session_id: &SessionId, suffix: &str) -> PathBuf {
        self.results_dir.join(format!("{session_id}_{suffix}"))
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        write_atomically(path, &bytes)
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, StorageError> {
        let Some(bytes) = read_optional(path)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StorageError::Decode {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl ArtifactStore for FsArtifactStore {
    fn save_structured(
        &self,
        session_id: &SessionId,
        kind: DocumentKind,
        topics: &StructuredTopicSet,
    ) -> Result<PathBuf, StorageError> {
        let path = self.path_for(session_id, &format!("{}.json", kind.label()));
        self.write_json(&path, topics)?;
        Ok(path)
    }

    fn save_mapping(&self, session_id: &SessionId, mapping: &Mapping) -> Result<PathBuf, StorageError> {
        let path = self.path_for(session_id, "mapping.json");
        self.write_json(&path, mapping)?;
        write_atomically(&self.path_for(session_id, "mapping.csv"), &mapping_csv(mapping)?)?;
        Ok(path)
    }

    fn save_report(
        &self,
        session_id: &SessionId,
        report: &FinalReport,
        mapping_path: PathBuf,
    ) -> Result<ReportPaths, StorageError> {
        let document = self.path_for(session_id, "report.md");
        write_atomically(&document, render_markdown(report).as_bytes())?;

        // The JSON report is what retrieval keys on, so it lands last.
        let json = self.path_for(session_id, "report.json");
        self.write_json(&json, report)?;

        Ok(ReportPaths {
            json,
            document,
            mapping: mapping_path,
        })
    }

    fn load_report(&self, session_id: &SessionId) -> Result<Option<FinalReport>, StorageError> {
        self.read_json(&self.path_for(session_id, "report.json"))
    }

    fn load_mapping(&self, session_id: &SessionId) -> Result<Option<Mapping>, StorageError> {
        self.read_json(&self.path_for(session_id, "mapping.json"))
    }

    fn report_document(&self, session_id: &SessionId) -> Result<Option<String>, StorageError> {
        let path = self.path_for(session_id, "report.md");
        Ok(read_optional(&path)?.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes).map_err(|source| StorageError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StorageError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
