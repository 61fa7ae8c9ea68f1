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

//! Parallel segment scans: one blocking task per segment, filtering index
//! entries against the compiled predicate and decoding only the blobs that
//! survive it.

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use config::{meta::search::SearchResults, IN_GPU_QUEUE, MAX_RECORD_SIZE};
use flatfile::{codec, segment_seqs, Pool, SegmentReader};

use crate::service::search::filter::CompiledFilter;

static SCAN_TOKEN: AtomicU64 = AtomicU64::new(0);

/// Scan every segment of every partition directory, fanning out one task
/// per segment and waiting for all of them. Hit order across segments is
/// unspecified.
pub async fn scan_partitions(
    dirs: Vec<PathBuf>,
    filter: Arc<CompiledFilter>,
    pool: Arc<Pool>,
    buffer_size: usize,
    results: Arc<SearchResults>,
) {
    let mut tasks = Vec::new();
    for dir in dirs {
        for seq in segment_seqs(&dir) {
            let dir = dir.clone();
            let filter = filter.clone();
            let pool = pool.clone();
            let results = results.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                scan_segment(&dir, seq, &filter, &pool, buffer_size, &results);
            }));
        }
    }
    for task in tasks {
        if let Err(e) = task.await {
            results.add_error(format!("scan task panicked: {e}"));
        }
    }
}

/// Scan one segment pair. Index entries arrive in non-decreasing timestamp
/// order, so the first entry past the upper bound terminates the segment.
/// Codec failures drop the one record and are reported on the result.
fn scan_segment(
    dir: &Path,
    seq: u32,
    filter: &CompiledFilter,
    pool: &Pool,
    buffer_size: usize,
    results: &SearchResults,
) {
    let mut reader = match SegmentReader::open(dir, seq, buffer_size) {
        Ok(reader) => reader,
        Err(e) => {
            results.add_error(e);
            return;
        }
    };
    let key = format!("scan-{}", SCAN_TOKEN.fetch_add(1, Ordering::Relaxed));
    let mut buf = pool.get(MAX_RECORD_SIZE, &key);
    let decode_fields = filter.decode_fields();

    loop {
        let entry = match reader.next_entry() {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                // abandon the segment, keep what other segments produce
                results.add_error(e);
                break;
            }
        };
        if filter.lt_unix != 0 && entry.timestamp >= filter.lt_unix {
            break;
        }
        if filter.lte_unix != 0 && entry.timestamp > filter.lte_unix {
            break;
        }
        if entry.timestamp < filter.gte_unix {
            reader.skip_data(&entry);
            continue;
        }
        if let Some(accounting) = &filter.accounting_name
            && &entry.accounting_name != accounting
        {
            reader.skip_data(&entry);
            continue;
        }
        if let Some(user) = &filter.user_name
            && &entry.user_name != user
        {
            reader.skip_data(&entry);
            continue;
        }
        if filter.require_gpu && entry.is_gpu != IN_GPU_QUEUE {
            reader.skip_data(&entry);
            continue;
        }
        let blob = match &mut buf {
            Some(buf) => reader.read_data(&entry, buf),
            // only reachable on a scan-key collision, which the token
            // counter rules out
            None => {
                results.add_error("buffer pool refused scan lease");
                break;
            }
        };
        let blob = match blob {
            Ok(blob) => blob,
            Err(e) => {
                results.add_error(e);
                break;
            }
        };
        match codec::decode(blob, decode_fields.as_ref()) {
            Ok(record) => {
                if filter.matches_residual(&record) {
                    results.add_hit_details(record);
                }
            }
            Err(e) => {
                log::error!(
                    "[SCAN] dropping bad record in {}/{}.data ({} bytes): {}",
                    dir.display(),
                    seq,
                    entry.data_length,
                    e,
                );
                results.add_error(e);
            }
        }
    }

    if let Some(buf) = buf {
        pool.done(&key, buf);
    }
}
