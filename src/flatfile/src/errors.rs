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

use std::path::PathBuf;

use snafu::Snafu;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("buffer ended mid-field while decoding {field}"))]
    ShortRead { field: &'static str },
    #[snafu(display("{left} bytes differ from the precomputed record size"))]
    TrailingBytes { left: usize },
    #[snafu(display("encoded record is {size} bytes, over the {max} byte limit"))]
    Oversize { size: usize, max: usize },
    #[snafu(display("{field} is {len} bytes, over its {width} byte slot"))]
    FieldTooLong {
        field: &'static str,
        len: usize,
        width: usize,
    },
    #[snafu(display("create dir {}: {source}", path.display()))]
    CreateDir {
        source: std::io::Error,
        path: PathBuf,
    },
    #[snafu(display("open {}: {source}", path.display()))]
    OpenFile {
        source: std::io::Error,
        path: PathBuf,
    },
    #[snafu(display("write {}: {source}", path.display()))]
    WriteData {
        source: std::io::Error,
        path: PathBuf,
    },
    #[snafu(display("read {}: {source}", path.display()))]
    ReadData {
        source: std::io::Error,
        path: PathBuf,
    },
    #[snafu(display("truncated index entry of {len} bytes in {}", path.display()))]
    TruncatedIndexEntry { len: usize, path: PathBuf },
}
