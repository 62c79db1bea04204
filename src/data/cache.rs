use super::{load_dataset, DataPaths, Dataset, LoadError};
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Modification times of (districts, warnings) at load time
type Stamps = (Option<SystemTime>, Option<SystemTime>);

struct Loaded {
    dataset: Dataset,
    stamps: Stamps,
}

/// Loaded dataset plus the file state it was loaded from.
///
/// Owned by the caller, never global. [`DatasetCache::get`] re-reads the files
/// only when a modification time changed; [`DatasetCache::reload`] always does.
/// A failed load keeps the previously loaded dataset in place.
pub struct DatasetCache {
    paths: DataPaths,
    loaded: Option<Loaded>,
    /// Incremented on every successful load
    generation: u64,
}

impl DatasetCache {
    pub fn new(paths: DataPaths) -> Self {
        Self {
            paths,
            loaded: None,
            generation: 0,
        }
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    /// Number of successful loads so far; changes whenever the dataset does
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Last successfully loaded dataset, without touching the filesystem
    pub fn current(&self) -> Option<&Dataset> {
        self.loaded.as_ref().map(|l| &l.dataset)
    }

    /// Cached dataset, reloading first if either file changed on disk
    pub fn get(&mut self) -> Result<&Dataset, LoadError> {
        let stamps = self.stamps();
        let loaded = match self.loaded.take() {
            Some(loaded) if loaded.stamps == stamps => loaded,
            previous => {
                if previous.is_some() {
                    log::info!("data files changed, reloading {}", self.paths.dir.display());
                }
                self.load(previous, stamps)?
            }
        };
        Ok(&self.loaded.insert(loaded).dataset)
    }

    /// Re-read both files unconditionally
    pub fn reload(&mut self) -> Result<&Dataset, LoadError> {
        let stamps = self.stamps();
        let previous = self.loaded.take();
        let loaded = self.load(previous, stamps)?;
        Ok(&self.loaded.insert(loaded).dataset)
    }

    fn load(&mut self, previous: Option<Loaded>, stamps: Stamps) -> Result<Loaded, LoadError> {
        match load_dataset(&self.paths) {
            Ok(dataset) => {
                self.generation += 1;
                Ok(Loaded { dataset, stamps })
            }
            Err(e) => {
                self.loaded = previous;
                Err(e)
            }
        }
    }

    fn stamps(&self) -> Stamps {
        (modified(&self.paths.districts), modified(&self.paths.warnings))
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::{DISTRICTS_CSV, WARNINGS_CSV};
    use std::fs::File;
    use std::path::PathBuf;
    use std::time::Duration;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("flood-map-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_tables(dir: &Path) -> DataPaths {
        let paths = DataPaths::new(dir);
        fs::write(&paths.districts, DISTRICTS_CSV).unwrap();
        fs::write(&paths.warnings, WARNINGS_CSV).unwrap();
        paths
    }

    fn touch(path: &Path, secs_ahead: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(secs_ahead))
            .unwrap();
    }

    #[test]
    fn test_get_is_cached_without_changes() {
        let dir = scratch_dir("cached");
        let mut cache = DatasetCache::new(write_tables(&dir));

        let first = cache.get().unwrap().clone();
        let second = cache.get().unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(cache.generation(), 1);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_loading_twice_is_identical() {
        let dir = scratch_dir("twice");
        let paths = write_tables(&dir);
        assert_eq!(load_dataset(&paths).unwrap(), load_dataset(&paths).unwrap());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_get_reloads_after_modification() {
        let dir = scratch_dir("modified");
        let paths = write_tables(&dir);
        let mut cache = DatasetCache::new(paths.clone());
        assert_eq!(cache.get().unwrap().districts.len(), 4);

        fs::write(
            &paths.districts,
            "district,fatalities,no_of_camps,full_damaged_houses,actual_rainfall_in_mm\nKollam,1,1,1,1\n",
        )
        .unwrap();
        touch(&paths.districts, 60);

        assert_eq!(cache.get().unwrap().districts.len(), 1);
        assert_eq!(cache.generation(), 2);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_failed_reload_keeps_previous_dataset() {
        let dir = scratch_dir("failed");
        let paths = write_tables(&dir);
        let mut cache = DatasetCache::new(paths.clone());
        cache.get().unwrap();

        fs::write(&paths.warnings, "district,date\nIdukki,not-a-date\n").unwrap();
        touch(&paths.warnings, 60);

        assert!(matches!(cache.get(), Err(LoadError::InvalidDate { .. })));
        assert!(matches!(cache.reload(), Err(LoadError::InvalidDate { .. })));
        assert_eq!(cache.current().unwrap().warnings.rows.len(), 4);
        assert_eq!(cache.generation(), 1);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = scratch_dir("missing");
        let mut cache = DatasetCache::new(DataPaths::new(&dir));
        assert!(matches!(cache.get(), Err(LoadError::Io { .. })));
        assert!(cache.current().is_none());
        fs::remove_dir_all(&dir).unwrap();
    }
}
