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

//! Day-by-day pull from the remote cluster into fresh local partitions,
//! bounded by a semaphore. Each day task owns its own writers, so no
//! writer is ever shared across tasks.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{Duration, SecondsFormat, TimeZone, Utc};
use config::{
    meta::record::JobRecord,
    utils::{json, time, time::SECONDS_PER_DAY},
    Settings, MAX_PARALLEL_BACKFILL, META_CLUSTER_NAME,
};
use hashbrown::{hash_map::Entry, HashMap};
use tokio::sync::Semaphore;

use crate::service::{
    db,
    elastic::Elastic,
    errors::{Error, Result},
};

/// Pull `period` of history ending at the most recent UTC midnight.
/// Refuses to run over an existing store root; incremental policies live
/// above this interlock.
pub async fn run(settings: &Settings, period: Duration) -> Result<u64> {
    let root = PathBuf::from(&settings.farmer.database_dir);
    if root.exists() {
        return Err(Error::BackfillExists(root.display().to_string()));
    }
    std::fs::create_dir_all(&root)?;

    let (start, end) = backfill_range(time::now().timestamp(), period);
    log::info!(
        "[BACKFILL] pulling {} to {} into {}",
        rfc3339(start),
        rfc3339(end),
        root.display(),
    );

    let elastic = Elastic::new(settings);
    let file_size = settings.farmer.file_size as u64;
    let buffer_size = settings.farmer.buffer_size;
    let semaphore = Arc::new(Semaphore::new(MAX_PARALLEL_BACKFILL));
    let mut tasks = Vec::new();
    let mut day = time::day_floor(start);
    while day < end {
        let gte = day.max(start);
        let lt = (day + SECONDS_PER_DAY).min(end);
        let elastic = elastic.clone();
        let root = root.clone();
        let semaphore = semaphore.clone();
        tasks.push(tokio::task::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| Error::Message(e.to_string()))?;
            backfill_day(&elastic, &root, gte, lt, file_size, buffer_size).await
        }));
        day += SECONDS_PER_DAY;
    }

    let mut stored = 0;
    let mut first_err = None;
    for task in tasks {
        match task.await {
            Ok(Ok(n)) => stored += n,
            Ok(Err(e)) => {
                log::error!("[BACKFILL] day task failed: {}", e);
                first_err.get_or_insert(e);
            }
            Err(e) => {
                first_err.get_or_insert(Error::Message(format!("backfill task panicked: {e}")));
            }
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => {
            log::info!("[BACKFILL] stored {} records", stored);
            Ok(stored)
        }
    }
}

/// `end` is the anchor floored to its UTC day; `start` reaches back one
/// period, itself floored to a day for periods over a day.
pub fn backfill_range(anchor_unix: i64, period: Duration) -> (i64, i64) {
    let end = time::day_floor(anchor_unix);
    let mut start = end - period.num_seconds();
    if period > Duration::days(1) {
        start = time::day_floor(start);
    }
    (start, end)
}

async fn backfill_day(
    elastic: &Elastic,
    root: &Path,
    gte: i64,
    lt: i64,
    file_size: u64,
    buffer_size: usize,
) -> Result<u64> {
    let day = time::unix_day(gte);
    let mut writers: HashMap<String, flatfile::Writer> = HashMap::new();
    let mut stored = 0u64;
    let scrolled = elastic
        .scroll(&day_query(gte, lt), |id, source| {
            let record = JobRecord::from_source(id, source);
            let writer = match writers.entry(record.bom.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let dir = db::partition_dir(root, day, &record.bom);
                    entry.insert(flatfile::Writer::new(dir, file_size, buffer_size)?)
                }
            };
            match writer.store(&record) {
                Ok(()) => {
                    stored += 1;
                    Ok(())
                }
                Err(flatfile::Error::FieldTooLong { field, len, width }) => {
                    // one wide record must not sink the day
                    log::warn!(
                        "[BACKFILL] rejecting record {}: {} is {} bytes, over its {} byte slot",
                        record.id,
                        field,
                        len,
                        width,
                    );
                    Ok(())
                }
                Err(e) => Err(e.into()),
            }
        })
        .await;

    let mut close_err = None;
    for (_, writer) in writers {
        if let Err(e) = writer.close() {
            close_err.get_or_insert(e);
        }
    }
    scrolled?;
    if let Some(e) = close_err {
        return Err(e.into());
    }
    log::info!("[BACKFILL] day {} stored {} records", day, stored);
    Ok(stored)
}

fn day_query(gte: i64, lt: i64) -> json::Value {
    json::json!({
        "query": {"bool": {"filter": [
            {"match_phrase": {"meta_cluster_name": META_CLUSTER_NAME}},
            {"range": {"timestamp": {
                "gte": rfc3339(gte),
                "lt": rfc3339(lt),
                "format": "strict_date_optional_time"
            }}}
        ]}}
    })
}

fn rfc3339(unix: i64) -> String {
    Utc.timestamp_opt(unix, 0)
        .unwrap()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use config::utils::time::parse_str_to_unix_sec;

    use super::*;

    #[test]
    fn test_backfill_range_sub_day_period() {
        let anchor = parse_str_to_unix_sec("2024-06-01T00:30:00Z").unwrap();
        let (start, end) = backfill_range(anchor, Duration::minutes(15));
        assert_eq!(start, parse_str_to_unix_sec("2024-05-31T23:45:00Z").unwrap());
        assert_eq!(end, parse_str_to_unix_sec("2024-06-01T00:00:00Z").unwrap());
    }

    #[test]
    fn test_backfill_range_multi_day_period() {
        let anchor = parse_str_to_unix_sec("2024-06-01T00:30:00Z").unwrap();
        let (start, end) = backfill_range(anchor, Duration::days(3));
        assert_eq!(start, parse_str_to_unix_sec("2024-05-29T00:00:00Z").unwrap());
        assert_eq!(end, parse_str_to_unix_sec("2024-06-01T00:00:00Z").unwrap());
    }

    #[test]
    fn test_backfill_range_month_snaps_to_day() {
        let anchor = parse_str_to_unix_sec("2024-06-01T00:30:00Z").unwrap();
        let (start, _) = backfill_range(anchor, Duration::hours(730));
        assert_eq!(start, time::day_floor(start));
    }

    #[test]
    fn test_day_query_shape() {
        let gte = parse_str_to_unix_sec("2024-05-31T00:00:00Z").unwrap();
        let body = day_query(gte, gte + SECONDS_PER_DAY);
        assert_eq!(
            body.pointer("/query/bool/filter/0/match_phrase/meta_cluster_name"),
            Some(&json::json!("farm"))
        );
        assert_eq!(
            body.pointer("/query/bool/filter/1/range/timestamp/gte"),
            Some(&json::json!("2024-05-31T00:00:00Z"))
        );
        assert_eq!(
            body.pointer("/query/bool/filter/1/range/timestamp/lt"),
            Some(&json::json!("2024-06-01T00:00:00Z"))
        );
    }
}
