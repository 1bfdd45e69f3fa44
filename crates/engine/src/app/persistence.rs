use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tracing::info;

pub const SAVE_FILE_EXTENSION: &str = "sav";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write save file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to list save directory {path}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read save file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no .{SAVE_FILE_EXTENSION} file found in {0}")]
    NoSaveFile(PathBuf),
}

/// Save files under one directory.
#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Replaces `<dir>/<file_name>` with `payload` without ever leaving a
    /// half-written file behind.
    pub fn save(&self, file_name: &str, payload: &str) -> Result<PathBuf, PersistenceError> {
        let path = self.dir.join(file_name);
        write_bytes_atomic(&path, payload.as_bytes()).map_err(|source| {
            PersistenceError::Write {
                path: path.clone(),
                source,
            }
        })?;
        info!(path = %path.display(), bytes = payload.len(), "save_written");
        Ok(path)
    }

    /// Contents of the most recently modified save file.
    pub fn load(&self) -> Result<String, PersistenceError> {
        let path = self.newest_save()?;
        let payload = fs::read_to_string(&path).map_err(|source| PersistenceError::Read {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), bytes = payload.len(), "save_read");
        Ok(payload)
    }

    fn newest_save(&self) -> Result<PathBuf, PersistenceError> {
        let list_error = |source| PersistenceError::ListDir {
            path: self.dir.clone(),
            source,
        };
        let mut newest: Option<(SystemTime, PathBuf)> = None;
        for entry in fs::read_dir(&self.dir).map_err(list_error)? {
            let entry = entry.map_err(list_error)?;
            let path = entry.path();
            if !is_save_file(&path) {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|metadata| metadata.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            let is_newer = match &newest {
                Some((best_time, best_path)) => {
                    (modified, &path) > (*best_time, best_path)
                }
                None => true,
            };
            if is_newer {
                newest = Some((modified, path));
            }
        }
        newest
            .map(|(_, path)| path)
            .ok_or_else(|| PersistenceError::NoSaveFile(self.dir.clone()))
    }
}

fn is_save_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension == SAVE_FILE_EXTENSION)
}

fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, bytes)?;
    replace_file(&tmp_path, path)
}

fn replace_file(tmp_path: &Path, final_path: &Path) -> io::Result<()> {
    match fs::remove_file(final_path) {
        Ok(_) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            let _ = fs::remove_file(tmp_path);
            return Err(error);
        }
    }

    if let Err(error) = fs::rename(tmp_path, final_path) {
        let _ = fs::remove_file(tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("save");
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::time::Duration;

    use super::*;

    fn age(path: &Path, seconds_ago: u64) {
        let when = SystemTime::now() - Duration::from_secs(seconds_ago);
        File::options()
            .write(true)
            .open(path)
            .expect("open")
            .set_modified(when)
            .expect("set mtime");
    }

    #[test]
    fn save_then_load_returns_payload() {
        let temp = tempfile::tempdir().expect("temp");
        let store = SaveStore::new(temp.path());

        let path = store.save("rpg-save-file.sav", "eyJhIjoxfQ==").expect("save");

        assert_eq!(path, temp.path().join("rpg-save-file.sav"));
        assert_eq!(store.load().expect("load"), "eyJhIjoxfQ==");
        assert!(!temp.path().join("rpg-save-file.sav.tmp").exists());
    }

    #[test]
    fn save_overwrites_existing_file() {
        let temp = tempfile::tempdir().expect("temp");
        let store = SaveStore::new(temp.path());

        store.save("slot.sav", "first").expect("first save");
        store.save("slot.sav", "second").expect("second save");

        assert_eq!(store.load().expect("load"), "second");
    }

    #[test]
    fn save_creates_missing_directory() {
        let temp = tempfile::tempdir().expect("temp");
        let store = SaveStore::new(temp.path().join("nested").join("saves"));

        store.save("slot.sav", "payload").expect("save");

        assert_eq!(store.load().expect("load"), "payload");
    }

    #[test]
    fn load_picks_most_recently_modified_save() {
        let temp = tempfile::tempdir().expect("temp");
        let store = SaveStore::new(temp.path());
        let old = store.save("a.sav", "old").expect("save a");
        let new = store.save("b.sav", "new").expect("save b");
        age(&old, 10);
        age(&new, 60);

        assert_eq!(store.load().expect("load"), "old");
    }

    #[test]
    fn load_ignores_other_extensions() {
        let temp = tempfile::tempdir().expect("temp");
        let store = SaveStore::new(temp.path());
        fs::write(temp.path().join("notes.txt"), "not a save").expect("write");

        let error = store.load().expect_err("no save present");
        assert!(matches!(error, PersistenceError::NoSaveFile(_)));

        store.save("slot.sav", "payload").expect("save");
        assert_eq!(store.load().expect("load"), "payload");
    }

    #[test]
    fn load_from_missing_directory_is_list_error() {
        let temp = tempfile::tempdir().expect("temp");
        let store = SaveStore::new(temp.path().join("absent"));

        assert!(matches!(
            store.load(),
            Err(PersistenceError::ListDir { .. })
        ));
    }
}
