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

pub mod cache;
pub mod filter;
pub mod scan;

use std::{sync::Arc, time::Instant};

use config::{
    meta::{
        record::{Field, FieldSet},
        search::{Request, Response, SearchResults},
    },
    LOCAL_SCROLL_ID,
};
use flatfile::Pool;

use crate::service::{
    db::Partitions,
    errors::{Error, Result},
    search::filter::CompiledFilter,
};

/// The local store: discovered partitions plus the scan buffer pool.
pub struct LocalStore {
    partitions: Arc<Partitions>,
    pool: Arc<Pool>,
    buffer_size: usize,
}

impl LocalStore {
    pub fn new(partitions: Arc<Partitions>, pool: Arc<Pool>, buffer_size: usize) -> LocalStore {
        LocalStore {
            partitions,
            pool,
            buffer_size,
        }
    }

    /// Serve a scrollable search from the local partitions. The entire
    /// result set is returned in one response; the scroll handshake
    /// endpoints keep an unmodified client happy afterwards.
    pub async fn scroll(&self, req: &Request) -> Result<Response> {
        let filter = Arc::new(CompiledFilter::compile(req)?);
        let started = Instant::now();
        let results = self.run_scan(filter.clone()).await?;
        log::info!(
            "[SCAN] bom {} matched {} records in {} ms",
            filter.bom,
            results.total(),
            started.elapsed().as_millis(),
        );
        Ok(results.into_response(
            started.elapsed().as_millis() as u64,
            filter.desired.as_ref(),
            Some(LOCAL_SCROLL_ID.to_string()),
        ))
    }

    /// Distinct user names matching the query, via a `user_name`-only
    /// selective decode.
    pub async fn usernames(&self, req: &Request) -> Result<Vec<String>> {
        let mut filter = CompiledFilter::compile(req)?;
        let mut desired = FieldSet::new();
        desired.insert(Field::UserName);
        filter.desired = Some(desired);
        let results = self.run_scan(Arc::new(filter)).await?;
        Ok(results.usernames())
    }

    async fn run_scan(&self, filter: Arc<CompiledFilter>) -> Result<SearchResults> {
        let mut dirs = Vec::new();
        for day in filter.days() {
            if let Some(dir) = self.partitions.lookup(day, &filter.bom).await {
                dirs.push(dir);
            }
        }
        let results = Arc::new(SearchResults::new());
        scan::scan_partitions(
            dirs,
            filter,
            self.pool.clone(),
            self.buffer_size,
            results.clone(),
        )
        .await;
        let results = Arc::into_inner(results)
            .ok_or_else(|| Error::Message("scan result still shared".to_string()))?;
        // a scan error fails the whole query rather than returning a
        // silently short result
        let errors = results.errors();
        if let Some(first) = errors.into_iter().next() {
            return Err(Error::Message(first));
        }
        Ok(results)
    }
}
