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

//! Periodic partition rescan, so a long-running server observes days
//! written by out-of-band backfill jobs.

use std::sync::Arc;

use tokio::{sync::watch, time};

use crate::service::db::Partitions;

pub async fn run(
    partitions: Arc<Partitions>,
    update_frequency: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = time::interval(time::Duration::from_secs(update_frequency));
    interval.tick().await; // the bind-time tick
    loop {
        tokio::select! {
            _ = interval.tick() => {
                match partitions.rescan().await {
                    Ok(0) => {}
                    Ok(n) => log::info!("[MONITOR] merged {} new partitions", n),
                    Err(e) => log::error!("[MONITOR] partition rescan error: {}", e),
                }
            }
            _ = shutdown.changed() => {
                log::info!("[MONITOR] shutting down");
                break;
            }
        }
    }
}
