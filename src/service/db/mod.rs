// Copyright 2025 OpenObserve Inc.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! The partition map: `(day, bom) -> directory`, discovered from the store
//! root at startup and merged forward by the periodic rescan. A rescan
//! never removes entries.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use config::utils::time;
use hashbrown::HashMap;
use tokio::sync::RwLock;

use crate::service::errors::Result;

pub struct Partitions {
    root: PathBuf,
    inner: RwLock<PartitionMap>,
}

#[derive(Default)]
struct PartitionMap {
    dirs: HashMap<(NaiveDate, String), PathBuf>,
    latest_date: Option<NaiveDate>,
}

impl Partitions {
    /// Discover every partition under `root`. A missing root is created
    /// and yields an empty map.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Partitions> {
        let root = root.into();
        if !root.exists() {
            std::fs::create_dir_all(&root)?;
            return Ok(Partitions {
                root,
                inner: RwLock::new(PartitionMap::default()),
            });
        }
        let map = discover_tree(&root, &root);
        log::info!(
            "[DB] discovered {} partitions under {}, latest day {:?}",
            map.dirs.len(),
            root.display(),
            map.latest_date,
        );
        Ok(Partitions {
            root,
            inner: RwLock::new(map),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The directory holding `(day, bom)`, if backfilled.
    pub async fn lookup(&self, day: NaiveDate, bom: &str) -> Option<PathBuf> {
        self.inner
            .read()
            .await
            .dirs
            .get(&(day, bom.to_string()))
            .cloned()
    }

    pub async fn latest_date(&self) -> Option<NaiveDate> {
        self.inner.read().await.latest_date
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.dirs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.dirs.is_empty()
    }

    /// Walk day directories strictly after the latest known day, up to
    /// today, and merge what out-of-band backfills have written. Returns
    /// the number of partitions merged in.
    pub async fn rescan(&self) -> Result<usize> {
        let latest = self.inner.read().await.latest_date;
        let found = match latest {
            // an empty map rescans the whole tree
            None => discover_tree(&self.root, &self.root),
            Some(latest) => {
                let mut found = PartitionMap::default();
                let today = time::now().date_naive();
                let mut day = latest.succ_opt().unwrap_or(latest);
                while day <= today {
                    let day_dir = self.root.join(day.format("%Y/%m/%d").to_string());
                    if day_dir.is_dir() {
                        let map = discover_tree(&self.root, &day_dir);
                        found.dirs.extend(map.dirs);
                        found.latest_date = found.latest_date.max(Some(day));
                    }
                    day = match day.succ_opt() {
                        Some(next) => next,
                        None => break,
                    };
                }
                found
            }
        };
        if found.dirs.is_empty() {
            return Ok(0);
        }
        let mut inner = self.inner.write().await;
        let mut merged = 0;
        for (key, dir) in found.dirs {
            if inner.dirs.insert(key, dir).is_none() {
                merged += 1;
            }
        }
        inner.latest_date = inner.latest_date.max(found.latest_date);
        Ok(merged)
    }
}

/// The directory a `(day, bom)` partition lives in.
pub fn partition_dir(root: &Path, day: NaiveDate, bom: &str) -> PathBuf {
    root.join(day.format("%Y/%m/%d").to_string()).join(bom)
}

/// Collect every directory under `start` that holds segment files, keyed
/// by the `(day, bom)` parsed from its path relative to `root`.
fn discover_tree(root: &Path, start: &Path) -> PartitionMap {
    let mut map = PartitionMap::default();
    for entry in walkdir::WalkDir::new(start)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(flatfile::INDEX_EXT)
        {
            continue;
        }
        let Some(dir) = path.parent() else {
            continue;
        };
        let Some(key) = parse_partition(root, dir) else {
            log::warn!("[DB] ignoring stray segment file: {}", path.display());
            continue;
        };
        map.latest_date = map.latest_date.max(Some(key.0));
        map.dirs.entry(key).or_insert_with(|| dir.to_path_buf());
    }
    map
}

/// Parse `YYYY/MM/DD/{bom}` out of a partition directory path.
fn parse_partition(root: &Path, dir: &Path) -> Option<(NaiveDate, String)> {
    let rel = dir.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel.iter().filter_map(|p| p.to_str()).collect();
    let [year, month, day, bom] = parts.as_slice() else {
        return None;
    };
    let date = NaiveDate::from_ymd_opt(
        year.parse().ok()?,
        month.parse().ok()?,
        day.parse().ok()?,
    )?;
    Some((date, bom.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch_segment(dir: &Path) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join("0.index"), b"").unwrap();
        std::fs::write(dir.join("0.data"), b"").unwrap();
    }

    #[tokio::test]
    async fn test_open_creates_missing_root() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("db");
        let partitions = Partitions::open(&root).await.unwrap();
        assert!(root.is_dir());
        assert!(partitions.is_empty().await);
        assert_eq!(partitions.latest_date().await, None);
    }

    #[tokio::test]
    async fn test_discovery_and_lookup() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let day_a = NaiveDate::from_ymd_opt(2024, 2, 4).unwrap();
        let day_b = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();
        touch_segment(&partition_dir(root, day_a, "bomA"));
        touch_segment(&partition_dir(root, day_a, "bomB"));
        touch_segment(&partition_dir(root, day_b, "bomA"));

        let partitions = Partitions::open(root).await.unwrap();
        assert_eq!(partitions.len().await, 3);
        assert_eq!(partitions.latest_date().await, Some(day_b));
        assert!(partitions.lookup(day_a, "bomA").await.is_some());
        assert!(partitions.lookup(day_b, "bomB").await.is_none());
    }

    #[tokio::test]
    async fn test_rescan_merges_new_days() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let today = time::now().date_naive();
        let yesterday = today.pred_opt().unwrap();
        touch_segment(&partition_dir(root, yesterday.pred_opt().unwrap(), "bomA"));

        let partitions = Partitions::open(root).await.unwrap();
        assert_eq!(partitions.len().await, 1);

        // written by an out-of-band backfill after startup
        touch_segment(&partition_dir(root, yesterday, "bomA"));
        touch_segment(&partition_dir(root, today, "bomB"));

        let merged = partitions.rescan().await.unwrap();
        assert_eq!(merged, 2);
        assert!(partitions.lookup(yesterday, "bomA").await.is_some());
        assert!(partitions.lookup(today, "bomB").await.is_some());
        assert_eq!(partitions.latest_date().await, Some(today));

        // rescans never remove entries
        assert_eq!(partitions.rescan().await.unwrap(), 0);
        assert_eq!(partitions.len().await, 3);
    }
}
