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

//! The on-disk flat-file format: a fixed-width `.index` stream beside a
//! packed `.data` blob stream, one numbered pair per segment.

pub mod buffer;
pub mod codec;
pub mod errors;
pub mod index;
pub mod reader;
pub mod writer;

use std::path::{Path, PathBuf};

pub use buffer::{Pool, PoolBuf};
pub use errors::{Error, Result};
pub use index::IndexEntry;
pub use reader::{segment_seqs, SegmentReader};
pub use writer::Writer;

pub const INDEX_EXT: &str = "index";
pub const DATA_EXT: &str = "data";

pub fn build_segment_path(dir: impl AsRef<Path>, seq: u32, ext: &str) -> PathBuf {
    dir.as_ref().join(format!("{seq}.{ext}"))
}
