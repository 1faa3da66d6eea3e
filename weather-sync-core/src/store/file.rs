use std::{
    fs, io,
    path::PathBuf,
    sync::atomic::{AtomicU64, Ordering},
};

use super::{KeyValueStore, StoreError};

/// Per-process sequence for temp file names; every write gets its own file.
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// One file per key inside a namespace directory.
///
/// Every process pointed at the same directory sees the same data. Writes go
/// to a temp file that is renamed over the target, so readers never observe a
/// partially written value.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            key: root.display().to_string(),
            source,
        })?;

        Ok(Self { root })
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(StoreError::InvalidKey(key.to_string()));
        }

        Ok(self.root.join(key))
    }
}

fn io_err(key: &str) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        key: key.to_string(),
        source,
    }
}

impl KeyValueStore for FileStore {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.entry_path(key)?;
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .root
            .join(format!(".{key}.{}.{seq}.tmp", std::process::id()));

        fs::write(&tmp, value).map_err(io_err(key))?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            io_err(key)(e)
        })
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.entry_path(key)?;

        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(key)(e)),
        }
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.entry_path(key)?;

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(key)(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WeatherSnapshot;
    use crate::store::SharedStore;
    use std::sync::Arc;

    #[test]
    fn put_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("group.test")).unwrap();

        assert!(store.get("weatherData").unwrap().is_none());

        store.put("weatherData", b"payload").unwrap();
        assert_eq!(store.get("weatherData").unwrap(), Some(b"payload".to_vec()));

        store.remove("weatherData").unwrap();
        assert!(store.get("weatherData").unwrap().is_none());
        store.remove("weatherData").unwrap();
    }

    #[test]
    fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        for key in ["", "..", "a/b", "a\\b"] {
            let err = store.put(key, b"x").unwrap_err();
            assert!(matches!(err, StoreError::InvalidKey(_)), "key {key:?}");
        }
    }

    #[test]
    fn concurrent_puts_to_one_key_never_fail_or_tear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let large = vec![b'a'; 200_000];
        let small = vec![b'b'; 50_000];

        for _ in 0..50 {
            std::thread::scope(|scope| {
                let writers = [&large, &small].map(|value| {
                    let store = &store;
                    scope.spawn(move || store.put("weatherData", value))
                });
                for writer in writers {
                    writer.join().unwrap().unwrap();
                }
            });

            let stored = store.get("weatherData").unwrap().unwrap();
            assert!(stored == large || stored == small, "torn value of {} bytes", stored.len());
        }

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name.to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
    }

    #[test]
    fn two_handles_on_one_directory_share_data() {
        let dir = tempfile::tempdir().unwrap();
        let app = SharedStore::new(Arc::new(FileStore::open(dir.path()).unwrap()));
        let widget = SharedStore::new(Arc::new(FileStore::open(dir.path()).unwrap()));

        let snapshot = WeatherSnapshot::new(vec![], "Shared City");
        app.store_weather_snapshot(&snapshot);

        assert_eq!(widget.load_weather_snapshot(), Some(snapshot));
    }
}
