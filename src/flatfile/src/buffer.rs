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

//! A bounded-growth pool of reusable byte slabs, size sorted, leased out
//! under caller-chosen keys so scans deserialise without per-hit
//! allocation.

use config::MAX_RECORD_SIZE;
use hashbrown::HashMap;
use parking_lot::Mutex;

/// A leased slab. Ownership of the bytes is the lease; hand it back with
/// [`Pool::done`] under the same key.
pub struct PoolBuf {
    data: Box<[u8]>,
}

impl std::ops::Deref for PoolBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl std::ops::DerefMut for PoolBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

struct Entry {
    id: u64,
    size: usize,
    in_use: bool,
    // empty placeholder while leased
    data: Box<[u8]>,
}

#[derive(Default)]
struct Inner {
    // sorted by size
    entries: Vec<Entry>,
    // key -> entry id
    leases: HashMap<String, u64>,
    next_id: u64,
}

/// All operations serialise on one mutex; the sorted search is
/// O(log entries) plus a short linear probe over same-size entries.
#[derive(Default)]
pub struct Pool {
    inner: Mutex<Inner>,
}

impl Pool {
    pub fn new() -> Pool {
        Pool::default()
    }

    /// The smallest free buffer with `len >= size`, allocating one when
    /// nothing fits. Returns `None` when `key` already holds a lease; the
    /// pool state is unchanged in that case.
    pub fn get(&self, size: usize, key: &str) -> Option<PoolBuf> {
        let mut inner = self.inner.lock();
        if inner.leases.contains_key(key) {
            return None;
        }
        let start = inner.entries.partition_point(|e| e.size < size);
        let idx = match inner.entries[start..].iter().position(|e| !e.in_use) {
            Some(offset) => start + offset,
            None => Pool::insert_entry(&mut inner, size),
        };
        let entry = &mut inner.entries[idx];
        entry.in_use = true;
        let data = std::mem::take(&mut entry.data);
        let id = entry.id;
        inner.leases.insert(key.to_string(), id);
        Some(PoolBuf { data })
    }

    /// Release the lease held under `key`, returning the slab for reuse.
    /// An unknown key drops the buffer.
    pub fn done(&self, key: &str, buf: PoolBuf) {
        let mut inner = self.inner.lock();
        let Some(id) = inner.leases.remove(key) else {
            log::warn!("[POOL] done for unknown key: {}", key);
            return;
        };
        if let Some(entry) = inner.entries.iter_mut().find(|e| e.id == id) {
            entry.data = buf.data;
            entry.in_use = false;
        }
    }

    /// Pre-allocate a geometric ladder of buffers sized for `num_hits`
    /// worth of records down to two records, so the first scan does not pay
    /// an allocation spike.
    pub fn warmup(&self, num_hits: usize) {
        let mut inner = self.inner.lock();
        let mut n = num_hits;
        while n >= 2 {
            Pool::insert_entry(&mut inner, n * MAX_RECORD_SIZE);
            n = n * 4 / 5;
        }
    }

    fn insert_entry(inner: &mut Inner, size: usize) -> usize {
        let idx = inner.entries.partition_point(|e| e.size <= size);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.insert(
            idx,
            Entry {
                id,
                size,
                in_use: false,
                data: vec![0u8; size].into_boxed_slice(),
            },
        );
        idx
    }

    #[cfg(test)]
    fn entry_count(&self) -> usize {
        self.inner.lock().entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_at_least_fit() {
        let pool = Pool::new();
        let buf = pool.get(100, "a").unwrap();
        assert!(buf.len() >= 100);
        pool.done("a", buf);

        let buf = pool.get(50, "a").unwrap();
        // reuses the 100-byte slab, smallest that fits
        assert_eq!(buf.len(), 100);
        assert_eq!(pool.entry_count(), 1);
        pool.done("a", buf);

        let buf = pool.get(200, "a").unwrap();
        assert_eq!(buf.len(), 200);
        assert_eq!(pool.entry_count(), 2);
        pool.done("a", buf);
    }

    #[test]
    fn test_same_key_cannot_hold_two_leases() {
        let pool = Pool::new();
        let buf = pool.get(10, "a").unwrap();
        assert!(pool.get(10, "a").is_none());
        // the refusal preserved state: a different key still gets a buffer
        let other = pool.get(10, "b").unwrap();
        pool.done("a", buf);
        pool.done("b", other);
        assert_eq!(pool.entry_count(), 2);
    }

    #[test]
    fn test_no_buffer_serves_two_live_keys() {
        let pool = Pool::new();
        let a = pool.get(64, "a").unwrap();
        let b = pool.get(64, "b").unwrap();
        assert_eq!(pool.entry_count(), 2);
        let a_ptr = a.as_ptr();
        pool.done("a", a);
        // released slab is the one handed back out
        let c = pool.get(64, "c").unwrap();
        assert_eq!(c.as_ptr(), a_ptr);
        pool.done("b", b);
        pool.done("c", c);
    }

    #[test]
    fn test_warmup_ladder() {
        let pool = Pool::new();
        pool.warmup(10);
        // 10, 8, 6, 4, 3, 2 records worth of slabs
        assert_eq!(pool.entry_count(), 6);
        let buf = pool.get(2 * MAX_RECORD_SIZE, "scan").unwrap();
        assert_eq!(buf.len(), 2 * MAX_RECORD_SIZE);
        pool.done("scan", buf);
    }
}
