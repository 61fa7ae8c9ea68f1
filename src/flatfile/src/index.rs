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

use byteorder::{BigEndian, ByteOrder};
use config::{
    meta::record::JobRecord, ACCOUNTING_NAME_WIDTH, INDEX_ENTRY_SIZE, IN_GPU_QUEUE,
    NOT_IN_GPU_QUEUE, USER_NAME_WIDTH,
};
use snafu::ensure;

use crate::errors::{FieldTooLongSnafu, Result};

/// One fixed-width index entry, the scan-time hot path. 50 bytes on disk,
/// big-endian: timestamp(8), accounting_name(24), user_name(13), is_gpu(1),
/// data_length(4). Entries are written in arrival order, so the value
/// blob's offset in the sibling `.data` file is the running sum of the
/// lengths before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    pub timestamp: i64,
    pub accounting_name: [u8; ACCOUNTING_NAME_WIDTH],
    pub user_name: [u8; USER_NAME_WIDTH],
    pub is_gpu: u8,
    pub data_length: u32,
}

/// Space-pad a string into a fixed-width slot. Overflow is a write error;
/// callers reject the record or reroute it above this layer.
pub fn pad_fixed<const N: usize>(s: &str, field: &'static str) -> Result<[u8; N]> {
    let bytes = s.as_bytes();
    ensure!(
        bytes.len() <= N,
        FieldTooLongSnafu {
            field,
            len: bytes.len(),
            width: N,
        }
    );
    let mut out = [b' '; N];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

impl IndexEntry {
    pub fn for_record(record: &JobRecord, data_length: u32) -> Result<IndexEntry> {
        Ok(IndexEntry {
            timestamp: record.timestamp,
            accounting_name: pad_fixed(&record.accounting_name, "accounting_name")?,
            user_name: pad_fixed(&record.user_name, "user_name")?,
            is_gpu: if record.is_gpu() {
                IN_GPU_QUEUE
            } else {
                NOT_IN_GPU_QUEUE
            },
            data_length,
        })
    }

    pub fn encode(&self) -> [u8; INDEX_ENTRY_SIZE] {
        let mut out = [0u8; INDEX_ENTRY_SIZE];
        BigEndian::write_i64(&mut out[..8], self.timestamp);
        out[8..32].copy_from_slice(&self.accounting_name);
        out[32..45].copy_from_slice(&self.user_name);
        out[45] = self.is_gpu;
        BigEndian::write_u32(&mut out[46..50], self.data_length);
        out
    }

    pub fn decode(buf: &[u8; INDEX_ENTRY_SIZE]) -> IndexEntry {
        let mut accounting_name = [0u8; ACCOUNTING_NAME_WIDTH];
        accounting_name.copy_from_slice(&buf[8..32]);
        let mut user_name = [0u8; USER_NAME_WIDTH];
        user_name.copy_from_slice(&buf[32..45]);
        IndexEntry {
            timestamp: BigEndian::read_i64(&buf[..8]),
            accounting_name,
            user_name,
            is_gpu: buf[45],
            data_length: BigEndian::read_u32(&buf[46..50]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width_padding() {
        let accounting: [u8; ACCOUNTING_NAME_WIDTH] =
            pad_fixed("groupA", "accounting_name").unwrap();
        assert_eq!(&accounting[..6], b"groupA");
        assert_eq!(&accounting[6..], b" ".repeat(18).as_slice());

        let user: [u8; USER_NAME_WIDTH] = pad_fixed("userA", "user_name").unwrap();
        assert_eq!(&user[..5], b"userA");
        assert_eq!(&user[5..], b" ".repeat(8).as_slice());
    }

    #[test]
    fn test_overflowing_slot_is_rejected() {
        let err =
            pad_fixed::<USER_NAME_WIDTH>("a-very-long-user-name", "user_name").unwrap_err();
        assert!(matches!(
            err,
            crate::errors::Error::FieldTooLong {
                field: "user_name",
                len: 21,
                width: USER_NAME_WIDTH,
            }
        ));
    }

    #[test]
    fn test_entry_layout() {
        let record = JobRecord {
            timestamp: 1707004801,
            accounting_name: "groupA".to_string(),
            user_name: "userA".to_string(),
            queue_name: "normal".to_string(),
            ..Default::default()
        };
        let entry = IndexEntry::for_record(&record, 143).unwrap();
        let encoded = entry.encode();
        assert_eq!(encoded.len(), 50);
        assert_eq!(&encoded[..8], &[0x00, 0x00, 0x00, 0x00, 0x65, 0xBE, 0xD3, 0x81]);
        assert_eq!(&encoded[8..14], b"groupA");
        assert_eq!(&encoded[14..32], b" ".repeat(18).as_slice());
        assert_eq!(&encoded[32..37], b"userA");
        assert_eq!(&encoded[37..45], b" ".repeat(8).as_slice());
        assert_eq!(encoded[45], NOT_IN_GPU_QUEUE);
        assert_eq!(&encoded[46..50], &[0x00, 0x00, 0x00, 0x8F]);

        assert_eq!(IndexEntry::decode(&encoded), entry);
    }

    #[test]
    fn test_gpu_queue_marker() {
        let record = JobRecord {
            queue_name: "gpu-huge".to_string(),
            ..Default::default()
        };
        let entry = IndexEntry::for_record(&record, 1).unwrap();
        assert_eq!(entry.is_gpu, IN_GPU_QUEUE);
    }
}
