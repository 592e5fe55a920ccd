use crate::document::Document;
use crate::errors::{DocketError, DocketResult, ErrorKind};
use crate::store::backend::StorageBackend;
use crate::store::codec;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

const COLLECTION_EXT: &str = "json";

/// File-backed storage: one JSON file per collection under a base directory.
///
/// `<base_dir>/<collection>.json` holds the whole collection as a JSON array
/// of documents. A missing file is an empty collection; an unreadable or
/// unparseable file is a `StorageError`. Writes go through a temp file and
/// rename, so readers never observe a half-written collection file.
pub struct FileBackend {
    base_dir: PathBuf,
}

impl FileBackend {
    /// Opens (creating if needed) a file backend rooted at `base_dir`.
    pub fn open(base_dir: impl AsRef<Path>) -> DocketResult<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(|err| {
            log::error!("Cannot create store directory {:?}: {}", base_dir, err);
            DocketError::new(
                &format!("cannot create store directory {:?}: {}", base_dir, err),
                ErrorKind::StorageError,
            )
        })?;
        Ok(FileBackend { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn collection_path(&self, name: &str) -> DocketResult<PathBuf> {
        validate_collection_name(name)?;
        Ok(self.base_dir.join(format!("{}.{}", name, COLLECTION_EXT)))
    }
}

/// Collection names become file names, so they must be path-safe.
fn validate_collection_name(name: &str) -> DocketResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        log::error!("Invalid collection name: {:?}", name);
        return Err(DocketError::new(
            &format!("invalid collection name: {:?}", name),
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}

impl StorageBackend for FileBackend {
    fn read_collection(&self, name: &str) -> DocketResult<Option<Vec<Document>>> {
        let path = self.collection_path(name)?;
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(err) => {
                log::error!("Cannot read collection file {:?}: {}", path, err);
                return Err(DocketError::new(
                    &format!("cannot read collection {:?}: {}", name, err),
                    ErrorKind::StorageError,
                ));
            }
        };

        let docs = codec::collection_from_json(&text).map_err(|err| {
            log::error!("Collection file {:?} is corrupted: {}", path, err);
            DocketError::new_with_cause(
                &format!("collection {:?} is corrupted", name),
                ErrorKind::StorageError,
                err,
            )
        })?;
        Ok(Some(docs))
    }

    fn write_collection(&self, name: &str, docs: &[Document]) -> DocketResult<()> {
        let path = self.collection_path(name)?;
        let text = codec::collection_to_json(docs)?;

        let tmp_path = path.with_extension(format!("{}.tmp", COLLECTION_EXT));
        fs::write(&tmp_path, text.as_bytes()).map_err(|err| {
            log::error!("Cannot write collection file {:?}: {}", tmp_path, err);
            DocketError::new(
                &format!("cannot write collection {:?}: {}", name, err),
                ErrorKind::StorageError,
            )
        })?;
        fs::rename(&tmp_path, &path).map_err(|err| {
            log::error!("Cannot commit collection file {:?}: {}", path, err);
            DocketError::new(
                &format!("cannot commit collection {:?}: {}", name, err),
                ErrorKind::StorageError,
            )
        })?;
        Ok(())
    }

    fn remove_collection(&self, name: &str) -> DocketResult<()> {
        let path = self.collection_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == IoErrorKind::NotFound => Ok(()),
            Err(err) => {
                log::error!("Cannot remove collection file {:?}: {}", path, err);
                Err(DocketError::new(
                    &format!("cannot remove collection {:?}: {}", name, err),
                    ErrorKind::StorageError,
                ))
            }
        }
    }

    fn collection_names(&self) -> DocketResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(COLLECTION_EXT) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use tempfile::TempDir;

    fn backend() -> (TempDir, FileBackend) {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        (dir, backend)
    }

    #[test]
    fn test_missing_file_is_empty_collection() {
        let (_dir, backend) = backend();
        assert!(backend.read_collection("designs").unwrap().is_none());
    }

    #[test]
    fn test_write_read_round_trip() {
        let (_dir, backend) = backend();
        let docs = vec![
            doc! { name: "a", views: 10 },
            doc! { name: "b", tags: ["x", "y"] },
        ];
        backend.write_collection("designs", &docs).unwrap();
        let read = backend.read_collection("designs").unwrap().unwrap();
        assert_eq!(read, docs);
    }

    #[test]
    fn test_fresh_instance_reads_persisted_data() {
        let dir = TempDir::new().unwrap();
        let docs = vec![doc! { name: "persisted" }];
        {
            let backend = FileBackend::open(dir.path()).unwrap();
            backend.write_collection("designs", &docs).unwrap();
        }
        let backend = FileBackend::open(dir.path()).unwrap();
        let read = backend.read_collection("designs").unwrap().unwrap();
        assert_eq!(read, docs);
    }

    #[test]
    fn test_corrupted_file_is_storage_error_not_empty() {
        let (dir, backend) = backend();
        fs::write(dir.path().join("designs.json"), b"{{{ not json").unwrap();
        let result = backend.read_collection("designs");
        assert!(result.is_err());
        assert_eq!(result.err().unwrap().kind(), &ErrorKind::StorageError);
    }

    #[test]
    fn test_non_array_payload_is_storage_error() {
        let (dir, backend) = backend();
        fs::write(dir.path().join("designs.json"), b"{\"oops\": 1}").unwrap();
        let result = backend.read_collection("designs");
        assert!(result.is_err());
        assert_eq!(result.err().unwrap().kind(), &ErrorKind::StorageError);
    }

    #[test]
    fn test_invalid_collection_name_rejected() {
        let (_dir, backend) = backend();
        let result = backend.read_collection("../escape");
        assert!(result.is_err());
        assert_eq!(result.err().unwrap().kind(), &ErrorKind::ValidationError);

        let result = backend.write_collection("", &[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_remove_collection_idempotent() {
        let (_dir, backend) = backend();
        backend.write_collection("designs", &[doc! { a: 1 }]).unwrap();
        backend.remove_collection("designs").unwrap();
        backend.remove_collection("designs").unwrap();
        assert!(backend.read_collection("designs").unwrap().is_none());
    }

    #[test]
    fn test_collection_names() {
        let (_dir, backend) = backend();
        backend.write_collection("designs", &[]).unwrap();
        backend.write_collection("projects", &[]).unwrap();
        let mut names = backend.collection_names().unwrap();
        names.sort();
        assert_eq!(names, vec!["designs", "projects"]);
    }

    #[test]
    fn test_whole_collection_rewritten_each_write() {
        let (dir, backend) = backend();
        backend
            .write_collection("designs", &[doc! { a: 1 }, doc! { b: 2 }])
            .unwrap();
        backend.write_collection("designs", &[doc! { c: 3 }]).unwrap();
        let text = fs::read_to_string(dir.path().join("designs.json")).unwrap();
        assert!(text.contains("\"c\""));
        assert!(!text.contains("\"a\""));
    }
}
