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

//! Query fingerprinting and the bounded LRU of serialised responses.
//! Concurrent misses for one key may both run the querier; the duplicate
//! cost is bounded by one scan.

use bytes::Bytes;
use config::{
    meta::search::Request,
    utils::hash::{murmur3, Sum128},
};
use hashlink::lru_cache::LruCache;
use parking_lot::Mutex;

use crate::service::errors::Result;

/// Search/scroll results and username results hash into disjoint key
/// spaces.
#[derive(Clone, Copy, Debug)]
pub enum KeySpace {
    Results,
    Usernames,
}

impl KeySpace {
    fn prefix(&self) -> &'static str {
        match self {
            KeySpace::Results => "r.",
            KeySpace::Usernames => "s.",
        }
    }
}

/// Stable fingerprint of a query: canonical JSON through a 128-bit
/// non-cryptographic hash, hex encoded under the key-space prefix.
pub fn fingerprint(req: &Request, space: KeySpace) -> String {
    let sum = murmur3::new().sum128(&req.canonical_json());
    format!("{}{:032x}", space.prefix(), sum)
}

pub struct QueryCache {
    lru: Mutex<LruCache<String, Bytes>>,
}

impl QueryCache {
    pub fn new(entries: usize) -> QueryCache {
        QueryCache {
            lru: Mutex::new(LruCache::new(entries)),
        }
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.lru.lock().get(key).cloned()
    }

    pub fn put(&self, key: String, value: Bytes) {
        self.lru.lock().insert(key, value);
    }

    /// Serve `key` from the cache, or run the querier and remember its
    /// serialised response.
    pub async fn cached<F, Fut>(&self, key: String, querier: F) -> Result<Bytes>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes>>,
    {
        if let Some(hit) = self.get(&key) {
            log::debug!("[CACHE] hit {key}");
            return Ok(hit);
        }
        let value = querier().await?;
        self.put(key, value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use config::utils::json;

    use super::*;

    fn request(body: &str) -> Request {
        json::from_str(body).unwrap()
    }

    #[test]
    fn test_fingerprint_is_clause_order_insensitive() {
        let a = request(
            r#"{"query": {"bool": {"filter": [
                {"match_phrase": {"bom": "bomA"}},
                {"range": {"timestamp": {"gte": 1, "lte": 2}}}
            ]}}}"#,
        );
        let b = request(
            r#"{"query": {"bool": {"filter": [
                {"range": {"timestamp": {"lte": 2, "gte": 1}}},
                {"match_phrase": {"bom": "bomA"}}
            ]}}}"#,
        );
        assert_eq!(
            fingerprint(&a, KeySpace::Results),
            fingerprint(&b, KeySpace::Results)
        );
    }

    #[test]
    fn test_fingerprint_spaces_cannot_collide() {
        let req = request(r#"{"size": 1}"#);
        let r = fingerprint(&req, KeySpace::Results);
        let s = fingerprint(&req, KeySpace::Usernames);
        assert!(r.starts_with("r."));
        assert!(s.starts_with("s."));
        assert_ne!(r, s);
    }

    #[test]
    fn test_fingerprint_differs_by_body() {
        let a = request(r#"{"size": 1}"#);
        let b = request(r#"{"size": 2}"#);
        assert_ne!(
            fingerprint(&a, KeySpace::Results),
            fingerprint(&b, KeySpace::Results)
        );
    }

    #[tokio::test]
    async fn test_cached_serves_and_evicts_by_recency() {
        let cache = QueryCache::new(2);
        let a = cache
            .cached("r.a".to_string(), || async { Ok(Bytes::from_static(b"A")) })
            .await
            .unwrap();
        assert_eq!(a, Bytes::from_static(b"A"));
        // second call never runs the querier
        let a = cache
            .cached("r.a".to_string(), || async { panic!("queried twice") })
            .await
            .unwrap();
        assert_eq!(a, Bytes::from_static(b"A"));

        cache.put("r.b".to_string(), Bytes::from_static(b"B"));
        // touch a so b is the least recent
        cache.get("r.a");
        cache.put("r.c".to_string(), Bytes::from_static(b"C"));
        assert!(cache.get("r.b").is_none());
        assert!(cache.get("r.a").is_some());
        assert!(cache.get("r.c").is_some());
    }
}
