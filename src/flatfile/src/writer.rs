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
    fs::{File, OpenOptions, create_dir_all},
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
};

use config::meta::record::JobRecord;
use snafu::ResultExt;

use crate::{
    DATA_EXT, INDEX_EXT, build_segment_path,
    codec,
    errors::{CreateDirSnafu, OpenFileSnafu, Result, WriteDataSnafu},
    index::IndexEntry,
};

/// Appends records to one partition as numbered `.index`/`.data` segment
/// pairs, rolling to the next pair once `.data` grows past `file_size`
/// after a complete record. There is no per-record sync: a writer that is
/// not closed cleanly leaves an unusable tail segment.
pub struct Writer {
    dir: PathBuf,
    seq: u32,
    index: BufWriter<File>,
    data: BufWriter<File>,
    data_bytes: u64,
    file_size: u64,
    buffer_size: usize,
    scratch: Vec<u8>,
}

impl Writer {
    pub fn new(dir: impl Into<PathBuf>, file_size: u64, buffer_size: usize) -> Result<Writer> {
        let dir = dir.into();
        create_dir_all(&dir).context(CreateDirSnafu { path: dir.clone() })?;
        let (index, data) = open_segment(&dir, 0, buffer_size)?;
        Ok(Writer {
            dir,
            seq: 0,
            index,
            data,
            data_bytes: 0,
            file_size,
            buffer_size,
            scratch: Vec::new(),
        })
    }

    /// Append one record: a fixed-width entry to `.index`, the encoded blob
    /// to `.data`.
    pub fn store(&mut self, record: &JobRecord) -> Result<()> {
        let mut scratch = std::mem::take(&mut self.scratch);
        let result = codec::encode(record, &mut scratch)
            .and_then(|_| IndexEntry::for_record(record, scratch.len() as u32))
            .and_then(|entry| self.append(&entry, &scratch));
        self.scratch = scratch;
        result
    }

    fn append(&mut self, entry: &IndexEntry, blob: &[u8]) -> Result<()> {
        self.index
            .write_all(&entry.encode())
            .context(WriteDataSnafu {
                path: build_segment_path(&self.dir, self.seq, INDEX_EXT),
            })?;
        self.data.write_all(blob).context(WriteDataSnafu {
            path: build_segment_path(&self.dir, self.seq, DATA_EXT),
        })?;
        self.data_bytes += blob.len() as u64;
        if self.data_bytes > self.file_size {
            self.roll()?;
        }
        Ok(())
    }

    fn roll(&mut self) -> Result<()> {
        self.flush()?;
        self.seq += 1;
        log::debug!("[FLATFILE] {} rolling to segment {}", self.dir.display(), self.seq);
        let (index, data) = open_segment(&self.dir, self.seq, self.buffer_size)?;
        self.index = index;
        self.data = data;
        self.data_bytes = 0;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.index.flush().context(WriteDataSnafu {
            path: build_segment_path(&self.dir, self.seq, INDEX_EXT),
        })?;
        self.data.flush().context(WriteDataSnafu {
            path: build_segment_path(&self.dir, self.seq, DATA_EXT),
        })
    }

    pub fn close(mut self) -> Result<()> {
        self.flush()
    }

    pub fn seq(&self) -> u32 {
        self.seq
    }
}

fn open_segment(
    dir: &Path,
    seq: u32,
    buffer_size: usize,
) -> Result<(BufWriter<File>, BufWriter<File>)> {
    let index_path = build_segment_path(dir, seq, INDEX_EXT);
    let data_path = build_segment_path(dir, seq, DATA_EXT);
    // partitions are write-once, an existing segment is a caller bug
    let index = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&index_path)
        .context(OpenFileSnafu { path: index_path })?;
    let data = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&data_path)
        .context(OpenFileSnafu { path: data_path })?;
    Ok((
        BufWriter::with_capacity(buffer_size, index),
        BufWriter::with_capacity(buffer_size, data),
    ))
}
