//! Two-file persistence for the vector index and its entry list.

use crate::{FlatIndex, SearchHits, VectorError, VectorResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Index file layout. `stamp` must equal the entry list's stamp.
#[derive(Serialize, Deserialize)]
struct IndexFile<I> {
    stamp: u64,
    index: I,
}

/// Entry-list file layout.
#[derive(Serialize, Deserialize)]
struct EntriesFile<E> {
    stamp: u64,
    entries: E,
}

/// One row of the entry list: the entity key plus attributes kept for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl IndexEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: BTreeMap<String, serde_json::Value>) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Locations of the index file and the entry-list file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    pub index: PathBuf,
    pub entries: PathBuf,
}

impl IndexPaths {
    pub fn new(index: impl Into<PathBuf>, entries: impl Into<PathBuf>) -> Self {
        Self {
            index: index.into(),
            entries: entries.into(),
        }
    }

    /// Both files inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>, index_file: &str, entries_file: &str) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(index_file), dir.join(entries_file))
    }

    /// The index file is written last, so its presence marks a complete pair.
    pub fn exists(&self) -> bool {
        self.index.exists() && self.entries.exists()
    }
}

/// A vector index together with its positionally aligned entries.
#[derive(Debug, Clone)]
pub struct PersistedIndex {
    index: FlatIndex,
    entries: Vec<IndexEntry>,
}

impl PersistedIndex {
    /// Pair an index with its entries. Fails when the counts differ.
    pub fn new(index: FlatIndex, entries: Vec<IndexEntry>) -> VectorResult<Self> {
        if index.len() != entries.len() {
            return Err(VectorError::Corrupt(format!(
                "index holds {} vectors but entry list holds {} entries",
                index.len(),
                entries.len()
            )));
        }
        Ok(Self { index, entries })
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for a search label; `None` for the sentinel or out-of-range rows.
    pub fn entry(&self, label: i64) -> Option<&IndexEntry> {
        usize::try_from(label).ok().and_then(|row| self.entries.get(row))
    }

    pub fn search(&self, query: &[f32], k: usize) -> VectorResult<SearchHits> {
        self.index.search(query, k)
    }

    /// Write both files. Each goes to a temporary sibling and is renamed into
    /// place; entries first, index last. Both carry the same save stamp, so a
    /// save that dies between the renames leaves a pair `load` rejects.
    pub fn save(&self, paths: &IndexPaths) -> VectorResult<()> {
        for path in [&paths.index, &paths.entries] {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
        }

        let stamp = save_stamp(paths);

        let entries_json = serde_json::to_vec_pretty(&EntriesFile {
            stamp,
            entries: &self.entries,
        })
        .map_err(|e| VectorError::Serialization(e.to_string()))?;
        write_atomic(&paths.entries, &entries_json)?;

        let index_bytes = bincode::serialize(&IndexFile {
            stamp,
            index: &self.index,
        })
        .map_err(|e| VectorError::Serialization(e.to_string()))?;
        write_atomic(&paths.index, &index_bytes)?;

        info!(
            stamp,
            vectors = self.index.len(),
            dimension = self.index.dimension(),
            index = %paths.index.display(),
            "Saved vector index"
        );
        Ok(())
    }

    /// Load both files and verify that they line up.
    pub fn load(paths: &IndexPaths) -> VectorResult<Self> {
        if !paths.index.exists() {
            return Err(VectorError::NotFound(paths.index.display().to_string()));
        }
        if !paths.entries.exists() {
            return Err(VectorError::Corrupt(format!(
                "{} exists without {}",
                paths.index.display(),
                paths.entries.display()
            )));
        }

        let reader = BufReader::new(fs::File::open(&paths.index)?);
        let index: IndexFile<FlatIndex> = bincode::deserialize_from(reader)
            .map_err(|e| VectorError::Corrupt(format!("{}: {}", paths.index.display(), e)))?;

        let reader = BufReader::new(fs::File::open(&paths.entries)?);
        let entries: EntriesFile<Vec<IndexEntry>> = serde_json::from_reader(reader)
            .map_err(|e| VectorError::Corrupt(format!("{}: {}", paths.entries.display(), e)))?;

        if index.stamp != entries.stamp {
            return Err(VectorError::Corrupt(format!(
                "{} (save {}) does not belong to {} (save {})",
                paths.entries.display(),
                entries.stamp,
                paths.index.display(),
                index.stamp
            )));
        }

        debug!(
            stamp = index.stamp,
            vectors = index.index.len(),
            entries = entries.entries.len(),
            "Loaded index files"
        );
        Self::new(index.index, entries.entries)
    }
}

/// A stamp that differs from the one already on disk.
fn save_stamp(paths: &IndexPaths) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    match read_stamp(&paths.entries) {
        Some(previous) if previous >= now => previous.wrapping_add(1),
        _ => now,
    }
}

fn read_stamp(path: &Path) -> Option<u64> {
    #[derive(Deserialize)]
    struct Stamp {
        stamp: u64,
    }
    let reader = BufReader::new(fs::File::open(path).ok()?);
    serde_json::from_reader::<_, Stamp>(reader).ok().map(|s| s.stamp)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> VectorResult<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    {
        let mut writer = BufWriter::new(fs::File::create(&tmp)?);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DistanceMetric, NO_MATCH};

    fn sample() -> PersistedIndex {
        let mut index = FlatIndex::new(2, DistanceMetric::InnerProduct);
        index.add(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        PersistedIndex::new(index, vec![IndexEntry::new("m1"), IndexEntry::new("m2")]).unwrap()
    }

    #[test]
    fn test_mismatched_pair_rejected() {
        let mut index = FlatIndex::new(2, DistanceMetric::InnerProduct);
        index.add(&[vec![1.0, 0.0]]).unwrap();
        let result = PersistedIndex::new(index, vec![]);
        assert!(matches!(result, Err(VectorError::Corrupt(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::in_dir(dir.path(), "movie_index.bin", "movies_list.json");
        assert!(!paths.exists());

        sample().save(&paths).unwrap();
        assert!(paths.exists());

        let loaded = PersistedIndex::load(&paths).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.index().len(), loaded.entries().len());
        assert_eq!(loaded.entry(1).unwrap().id, "m2");
        assert!(loaded.entry(NO_MATCH).is_none());
    }

    #[test]
    fn test_load_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::in_dir(dir.path(), "i.bin", "e.json");
        assert!(matches!(
            PersistedIndex::load(&paths),
            Err(VectorError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_detects_stale_entry_list() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::in_dir(dir.path(), "i.bin", "e.json");
        sample().save(&paths).unwrap();

        std::fs::write(&paths.entries, r#"[{"id": "only-one"}]"#).unwrap();
        assert!(matches!(
            PersistedIndex::load(&paths),
            Err(VectorError::Corrupt(_))
        ));
    }

    #[test]
    fn test_interrupted_save_is_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::in_dir(dir.path(), "i.bin", "e.json");

        let mut old = FlatIndex::new(2, DistanceMetric::InnerProduct);
        old.add(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        PersistedIndex::new(old, vec![IndexEntry::new("old-a"), IndexEntry::new("old-b")])
            .unwrap()
            .save(&paths)
            .unwrap();

        // The entry list gets renamed into place, the index write fails
        std::fs::create_dir(dir.path().join("i.bin.tmp")).unwrap();
        let mut new = FlatIndex::new(2, DistanceMetric::InnerProduct);
        new.add(&[vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let saved = PersistedIndex::new(new, vec![IndexEntry::new("new-x"), IndexEntry::new("new-y")])
            .unwrap()
            .save(&paths);
        assert!(saved.is_err());
        let entries = std::fs::read_to_string(&paths.entries).unwrap();
        assert!(entries.contains("new-x"));

        assert!(matches!(
            PersistedIndex::load(&paths),
            Err(VectorError::Corrupt(_))
        ));
    }

    #[test]
    fn test_resave_changes_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::in_dir(dir.path(), "i.bin", "e.json");
        sample().save(&paths).unwrap();
        let first = read_stamp(&paths.entries).unwrap();

        sample().save(&paths).unwrap();
        let second = read_stamp(&paths.entries).unwrap();
        assert_ne!(first, second);
        assert_eq!(PersistedIndex::load(&paths).unwrap().len(), 2);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::in_dir(dir.path(), "i.bin", "e.json");
        sample().save(&paths).unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| !n.ends_with(".tmp")));
    }
}
