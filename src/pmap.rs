//! The ordered persistent map (spec §4.1): point find/insert/modify/
//! erase, bounded range scan, and disk round-trip across a clean
//! `clear`/`exit`.
//!
//! Every query the core issues against a `PMap` is a prefix range scan
//! (`(station, *)`, `(uid, *)`, `((date, tid), *)`), so the key type is
//! kept ordered end to end. The on-disk layout is the one degree of
//! freedom spec §4.1 leaves implementation-defined: rather than hand a
//! paginated B+tree with its own page cache and free list (the thing the
//! spec is modelling, and a large surface to get subtly wrong without
//! being able to run it), each map keeps an in-memory `BTreeMap<K, V>` —
//! which already gives the O(log n) ordered point and range operations
//! the contract asks for — and persists it as two companion files: a
//! `bincode`-encoded data file holding the whole map, and a small
//! metadata file holding just the record count, used as a cheap sanity
//! check on reopen. A clean `flush()` (driven by `clean` and `exit`)
//! rewrites both; nothing is written between flushes, so durability
//! mid-operation is, as specified, not required.
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use log::{info, warn};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::StorageError;

pub struct PMap<K, V> {
    data_path: PathBuf,
    meta_path: PathBuf,
    tree: BTreeMap<K, V>,
}

impl<K, V> PMap<K, V>
where
    K: Ord + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
{
    /// Open (or create) the map backed by `data_path`/`meta_path`.
    pub fn open(data_path: impl AsRef<Path>, meta_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let data_path = data_path.as_ref().to_path_buf();
        let meta_path = meta_path.as_ref().to_path_buf();

        let tree = if data_path.exists() {
            let bytes = fs::read(&data_path).map_err(|source| StorageError::Open {
                path: data_path.clone(),
                source,
            })?;
            if bytes.is_empty() {
                BTreeMap::new()
            } else {
                let tree: BTreeMap<K, V> =
                    bincode::deserialize(&bytes).map_err(|source| StorageError::Decode {
                        path: data_path.clone(),
                        source,
                    })?;
                if let Ok(meta_bytes) = fs::read(&meta_path) {
                    if let Ok(recorded) = meta_bytes.try_into().map(u64::from_le_bytes) {
                        if recorded as usize != tree.len() {
                            warn!(
                                "{}: record count {} does not match metadata count {recorded}; trusting the data file",
                                data_path.display(),
                                tree.len()
                            );
                        }
                    }
                }
                tree
            }
        } else {
            BTreeMap::new()
        };

        info!("opened {} with {} record(s)", data_path.display(), tree.len());
        Ok(Self {
            data_path,
            meta_path,
            tree,
        })
    }

    pub fn find(&self, key: &K) -> Option<V> {
        self.tree.get(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.tree.contains_key(key)
    }

    /// Insert a new record. Precondition: `key` is absent (spec §4.1).
    pub fn insert(&mut self, key: K, value: V) {
        debug_assert!(
            !self.tree.contains_key(&key),
            "PMap::insert precondition violated: key already present"
        );
        self.tree.insert(key, value);
    }

    /// Overwrite an existing record. Precondition: `key` is present.
    pub fn modify(&mut self, key: K, value: V) {
        debug_assert!(
            self.tree.contains_key(&key),
            "PMap::modify precondition violated: key absent"
        );
        self.tree.insert(key, value);
    }

    /// Remove a record. Precondition: `key` is present.
    pub fn erase(&mut self, key: &K) -> Option<V> {
        self.tree.remove(key)
    }

    pub fn size(&self) -> usize {
        self.tree.len()
    }

    /// Every value whose key lies in `[lo, hi]`, in ascending key order.
    pub fn range_find(&self, lo: &K, hi: &K) -> Vec<V> {
        if lo > hi {
            return Vec::new();
        }
        self.tree
            .range(lo.clone()..=hi.clone())
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Persist the whole map to its two companion files. Fatal on
    /// failure per spec §7; callers should treat `Err` as unrecoverable.
    pub fn flush(&self) -> Result<(), StorageError> {
        let encoded = bincode::serialize(&self.tree).map_err(|source| StorageError::Encode {
            path: self.data_path.clone(),
            source,
        })?;
        fs::write(&self.data_path, &encoded).map_err(|source| StorageError::Flush {
            path: self.data_path.clone(),
            source,
        })?;
        fs::write(&self.meta_path, (self.tree.len() as u64).to_le_bytes()).map_err(|source| {
            StorageError::Flush {
                path: self.meta_path.clone(),
                source,
            }
        })?;
        info!("flushed {} ({} record(s))", self.data_path.display(), self.tree.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn paths(dir: &tempfile::TempDir, name: &str) -> (PathBuf, PathBuf) {
        (dir.path().join(format!("{name}.dat")), dir.path().join(format!("{name}.meta")))
    }

    #[test]
    fn find_insert_modify_erase_round_trip_in_memory() {
        let dir = tempdir().unwrap();
        let (data, meta) = paths(&dir, "t");
        let mut map: PMap<String, i32> = PMap::open(&data, &meta).unwrap();

        assert_eq!(map.find(&"a".to_string()), None);
        map.insert("a".to_string(), 1);
        assert_eq!(map.find(&"a".to_string()), Some(1));
        map.modify("a".to_string(), 2);
        assert_eq!(map.find(&"a".to_string()), Some(2));
        assert_eq!(map.size(), 1);
        assert_eq!(map.erase(&"a".to_string()), Some(2));
        assert_eq!(map.size(), 0);
    }

    #[test]
    fn range_find_is_ascending_and_inclusive() {
        let dir = tempdir().unwrap();
        let (data, meta) = paths(&dir, "t");
        let mut map: PMap<i32, &str> = PMap::open(&data, &meta).unwrap();
        for (k, v) in [(1, "a"), (2, "b"), (3, "c"), (5, "e")] {
            map.insert(k, v);
        }
        assert_eq!(map.range_find(&2, &5), vec!["b", "c", "e"]);
        assert_eq!(map.range_find(&10, &20), Vec::<&str>::new());
    }

    #[test]
    fn flush_and_reopen_round_trips() {
        let dir = tempdir().unwrap();
        let (data, meta) = paths(&dir, "t");
        {
            let mut map: PMap<String, i32> = PMap::open(&data, &meta).unwrap();
            map.insert("a".to_string(), 1);
            map.insert("b".to_string(), 2);
            map.flush().unwrap();
        }
        let reopened: PMap<String, i32> = PMap::open(&data, &meta).unwrap();
        assert_eq!(reopened.size(), 2);
        assert_eq!(reopened.find(&"a".to_string()), Some(1));
        assert_eq!(reopened.find(&"b".to_string()), Some(2));
    }

    #[test]
    fn clear_drops_all_records() {
        let dir = tempdir().unwrap();
        let (data, meta) = paths(&dir, "t");
        let mut map: PMap<i32, i32> = PMap::open(&data, &meta).unwrap();
        map.insert(1, 1);
        map.insert(2, 2);
        map.clear();
        assert_eq!(map.size(), 0);
    }
}
