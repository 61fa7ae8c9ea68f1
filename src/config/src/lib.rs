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

pub mod meta;
pub mod settings;
pub mod utils;

pub use settings::*;

/// Free-text fields longer than this are middle-truncated before encoding.
pub const MAX_FIELD_LEN: usize = 2500;

/// Joins the head and tail of a middle-truncated field.
pub const TRUNCATION_SENTINEL: &str = " [....] ";

/// Hard upper bound on one encoded record. Dominates the three truncated
/// free-text fields plus the numeric remainder, so scan buffers can be
/// pre-sized once.
pub const MAX_RECORD_SIZE: usize = 16 * 1024;

/// Fixed widths of the index-entry string slots, space padded.
pub const ACCOUNTING_NAME_WIDTH: usize = 24;
pub const USER_NAME_WIDTH: usize = 13;

/// One index entry: timestamp(8) + accounting(24) + user(13) + gpu(1) +
/// data_offset(4) + data_length(4).
pub const INDEX_ENTRY_SIZE: usize = 50;

/// Index-entry GPU markers.
pub const NOT_IN_GPU_QUEUE: u8 = 1;
pub const IN_GPU_QUEUE: u8 = 2;

/// Queues whose name starts with this are GPU queues.
pub const GPU_QUEUE_PREFIX: &str = "gpu";

/// Page size and context TTL for scrolls against the remote cluster.
pub const MAX_SCROLL_PAGE: usize = 10_000;
pub const SCROLL_KEEPALIVE: &str = "1m";

/// Upper bound on concurrent day-sized backfill pulls.
pub const MAX_PARALLEL_BACKFILL: usize = 16;

/// The cluster every backfilled record belongs to.
pub const META_CLUSTER_NAME: &str = "farm";

/// Scroll id handed to clients so an unmodified scroll handshake succeeds
/// against a facade that never truly pages.
pub const LOCAL_SCROLL_ID: &str = "ZmFybWVyLWxvY2FsLXNjcm9sbC1pZC0wMDAwMDAwMDAwMDA=";
