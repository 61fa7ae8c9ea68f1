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

use std::{
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use config::INDEX_ENTRY_SIZE;
use snafu::ResultExt;

use crate::{
    DATA_EXT, INDEX_EXT, build_segment_path,
    errors::{OpenFileSnafu, ReadDataSnafu, Result, TruncatedIndexEntrySnafu},
    index::IndexEntry,
};

/// Sequential reader over one segment pair. The index stream yields fixed
/// width entries in write order; the data file is consumed in lockstep,
/// seeking forward past blobs the caller filtered out.
pub struct SegmentReader {
    index: BufReader<File>,
    index_path: PathBuf,
    data: File,
    data_path: PathBuf,
    // bytes of .data consumed or skipped so far
    data_pos: u64,
}

impl SegmentReader {
    pub fn open(dir: &Path, seq: u32, buffer_size: usize) -> Result<SegmentReader> {
        let index_path = build_segment_path(dir, seq, INDEX_EXT);
        let data_path = build_segment_path(dir, seq, DATA_EXT);
        let index = File::open(&index_path).context(OpenFileSnafu {
            path: index_path.clone(),
        })?;
        let data = File::open(&data_path).context(OpenFileSnafu {
            path: data_path.clone(),
        })?;
        Ok(SegmentReader {
            index: BufReader::with_capacity(buffer_size, index),
            index_path,
            data,
            data_path,
            data_pos: 0,
        })
    }

    /// The next index entry, or `None` at a clean end of file. A partial
    /// trailing entry (a writer that died mid-record) is an error.
    pub fn next_entry(&mut self) -> Result<Option<IndexEntry>> {
        let mut buf = [0u8; INDEX_ENTRY_SIZE];
        let n = read_full(&mut self.index, &mut buf).context(ReadDataSnafu {
            path: self.index_path.clone(),
        })?;
        if n == 0 {
            return Ok(None);
        }
        if n < INDEX_ENTRY_SIZE {
            return TruncatedIndexEntrySnafu {
                len: n,
                path: self.index_path.clone(),
            }
            .fail();
        }
        Ok(Some(IndexEntry::decode(&buf)))
    }

    /// Read the blob for the entry just returned into the head of `buf`.
    pub fn read_data<'a>(&mut self, entry: &IndexEntry, buf: &'a mut [u8]) -> Result<&'a [u8]> {
        let len = entry.data_length as usize;
        self.data
            .seek(SeekFrom::Start(self.data_pos))
            .context(ReadDataSnafu {
                path: self.data_path.clone(),
            })?;
        self.data
            .read_exact(&mut buf[..len])
            .context(ReadDataSnafu {
                path: self.data_path.clone(),
            })?;
        self.data_pos += len as u64;
        Ok(&buf[..len])
    }

    /// Advance the data cursor past a filtered-out entry's blob.
    pub fn skip_data(&mut self, entry: &IndexEntry) {
        self.data_pos += entry.data_length as u64;
    }
}

fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut read = 0;
    while read < buf.len() {
        let n = reader.read(&mut buf[read..])?;
        if n == 0 {
            break;
        }
        read += n;
    }
    Ok(read)
}

/// Segment sequence numbers present in a partition directory, numerically
/// sorted. Only pairs with both files count.
pub fn segment_seqs(dir: &Path) -> Vec<u32> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut seqs: Vec<u32> = entries
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            if path.extension()?.to_str()? != INDEX_EXT {
                return None;
            }
            let seq: u32 = path.file_stem()?.to_str()?.parse().ok()?;
            build_segment_path(dir, seq, DATA_EXT)
                .exists()
                .then_some(seq)
        })
        .collect();
    seqs.sort_unstable();
    seqs
}
