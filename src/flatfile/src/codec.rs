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

//! Record wire format: `id` first, then every field of [`Field::ALL`] in
//! order. Strings are u32 big-endian length prefixed, numbers are 8 raw
//! big-endian bytes. The order is part of the contract between writer and
//! reader.

use std::borrow::Cow;

use byteorder::{BigEndian, ByteOrder};
use config::{
    meta::record::{Field, FieldSet, JobRecord},
    MAX_FIELD_LEN, MAX_RECORD_SIZE, TRUNCATION_SENTINEL,
};
use snafu::ensure;

use crate::errors::{OversizeSnafu, Result, ShortReadSnafu, TrailingBytesSnafu};

/// Middle-truncate a free-text field so the encoded record stays under
/// [`MAX_RECORD_SIZE`]. Keeps the head and tail halves joined by the
/// sentinel. Applying it twice yields the same bytes as applying it once.
pub fn truncate_field(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    if bytes.len() <= MAX_FIELD_LEN {
        return Cow::Borrowed(s);
    }
    let head = (MAX_FIELD_LEN - TRUNCATION_SENTINEL.len()) / 2;
    let mut out = Vec::with_capacity(head * 2 + TRUNCATION_SENTINEL.len());
    out.extend_from_slice(&bytes[..head]);
    out.extend_from_slice(TRUNCATION_SENTINEL.as_bytes());
    out.extend_from_slice(&bytes[bytes.len() - head..]);
    Cow::Owned(String::from_utf8_lossy(&out).into_owned())
}

/// Encoded size of a record, with truncation applied.
pub fn encoded_size(record: &JobRecord) -> usize {
    4 + record.id.len()
        + 4
        + record.accounting_name.len()
        + 4
        + record.user_name.len()
        + 4
        + record.bom.len()
        + 4
        + record.queue_name.len()
        + 4
        + truncate_field(&record.command).len()
        + 4
        + truncate_field(&record.job_name).len()
        + 4
        + truncate_field(&record.job).len()
        + 9 * 8
}

/// Encode a record into `buf` (cleared first). The marshal verifier checks
/// the bytes written against the precomputed size.
pub fn encode(record: &JobRecord, buf: &mut Vec<u8>) -> Result<()> {
    let size = encoded_size(record);
    ensure!(
        size <= MAX_RECORD_SIZE,
        OversizeSnafu {
            size,
            max: MAX_RECORD_SIZE,
        }
    );
    buf.clear();
    buf.reserve(size);
    put_string(buf, &record.id);
    put_string(buf, &record.accounting_name);
    put_string(buf, &record.user_name);
    put_string(buf, &record.bom);
    put_string(buf, &record.queue_name);
    put_string(buf, &truncate_field(&record.command));
    put_string(buf, &truncate_field(&record.job_name));
    put_string(buf, &truncate_field(&record.job));
    put_i64(buf, record.avail_cpu_time_sec);
    put_i64(buf, record.mem_requested_mb);
    put_i64(buf, record.mem_requested_mb_sec);
    put_i64(buf, record.num_exec_procs);
    put_i64(buf, record.pending_time_sec);
    put_i64(buf, record.run_time_sec);
    put_i64(buf, record.timestamp);
    put_f64(buf, record.wasted_cpu_seconds);
    put_f64(buf, record.wasted_mb_seconds);
    ensure!(
        buf.len() == size,
        TrailingBytesSnafu {
            left: buf.len().abs_diff(size),
        }
    );
    Ok(())
}

/// Decode a record, reading only the desired fields and skipping the rest
/// in place. `None` reads everything. The id is always read; the buffer
/// must end exactly after the last field.
pub fn decode(buf: &[u8], desired: Option<&FieldSet>) -> Result<JobRecord> {
    let mut d = Decoder { buf, pos: 0 };
    let mut record = JobRecord {
        id: d.read_string("id")?,
        ..Default::default()
    };
    for field in Field::ALL.iter() {
        let wanted = desired.is_none_or(|set| set.contains(field));
        let name = field.name();
        match field {
            Field::AccountingName => d.string_into(&mut record.accounting_name, wanted, name)?,
            Field::UserName => d.string_into(&mut record.user_name, wanted, name)?,
            Field::Bom => d.string_into(&mut record.bom, wanted, name)?,
            Field::QueueName => d.string_into(&mut record.queue_name, wanted, name)?,
            Field::Command => d.string_into(&mut record.command, wanted, name)?,
            Field::JobName => d.string_into(&mut record.job_name, wanted, name)?,
            Field::Job => d.string_into(&mut record.job, wanted, name)?,
            Field::AvailCpuTimeSec => d.i64_into(&mut record.avail_cpu_time_sec, wanted, name)?,
            Field::MemRequestedMb => d.i64_into(&mut record.mem_requested_mb, wanted, name)?,
            Field::MemRequestedMbSec => {
                d.i64_into(&mut record.mem_requested_mb_sec, wanted, name)?
            }
            Field::NumExecProcs => d.i64_into(&mut record.num_exec_procs, wanted, name)?,
            Field::PendingTimeSec => d.i64_into(&mut record.pending_time_sec, wanted, name)?,
            Field::RunTimeSec => d.i64_into(&mut record.run_time_sec, wanted, name)?,
            Field::Timestamp => d.i64_into(&mut record.timestamp, wanted, name)?,
            Field::WastedCpuSeconds => {
                d.f64_into(&mut record.wasted_cpu_seconds, wanted, name)?
            }
            Field::WastedMbSeconds => d.f64_into(&mut record.wasted_mb_seconds, wanted, name)?,
        }
    }
    ensure!(
        d.pos == buf.len(),
        TrailingBytesSnafu {
            left: buf.len() - d.pos,
        }
    );
    Ok(record)
}

fn put_string(buf: &mut Vec<u8>, s: &str) {
    let mut len = [0u8; 4];
    BigEndian::write_u32(&mut len, s.len() as u32);
    buf.extend_from_slice(&len);
    buf.extend_from_slice(s.as_bytes());
}

fn put_i64(buf: &mut Vec<u8>, v: i64) {
    let mut bytes = [0u8; 8];
    BigEndian::write_i64(&mut bytes, v);
    buf.extend_from_slice(&bytes);
}

fn put_f64(buf: &mut Vec<u8>, v: f64) {
    let mut bytes = [0u8; 8];
    BigEndian::write_f64(&mut bytes, v);
    buf.extend_from_slice(&bytes);
}

struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl Decoder<'_> {
    fn take(&mut self, n: usize, field: &'static str) -> Result<&[u8]> {
        ensure!(self.pos + n <= self.buf.len(), ShortReadSnafu { field });
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn read_string(&mut self, field: &'static str) -> Result<String> {
        let len = BigEndian::read_u32(self.take(4, field)?) as usize;
        let bytes = self.take(len, field)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn string_into(&mut self, out: &mut String, wanted: bool, field: &'static str) -> Result<()> {
        if wanted {
            *out = self.read_string(field)?;
        } else {
            let len = BigEndian::read_u32(self.take(4, field)?) as usize;
            self.take(len, field)?;
        }
        Ok(())
    }

    fn i64_into(&mut self, out: &mut i64, wanted: bool, field: &'static str) -> Result<()> {
        let bytes = self.take(8, field)?;
        if wanted {
            *out = BigEndian::read_i64(bytes);
        }
        Ok(())
    }

    fn f64_into(&mut self, out: &mut f64, wanted: bool, field: &'static str) -> Result<()> {
        let bytes = self.take(8, field)?;
        if wanted {
            *out = BigEndian::read_f64(bytes);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    fn sample_record() -> JobRecord {
        JobRecord {
            id: "doc-0001".to_string(),
            accounting_name: "groupA".to_string(),
            user_name: "userA".to_string(),
            bom: "bomA".to_string(),
            queue_name: "normal".to_string(),
            command: "bsub sleep 60".to_string(),
            job_name: "nightly".to_string(),
            job: "1234[7]".to_string(),
            avail_cpu_time_sec: 3600,
            mem_requested_mb: 1024,
            mem_requested_mb_sec: 3_686_400,
            num_exec_procs: 8,
            pending_time_sec: 12,
            run_time_sec: 450,
            timestamp: 1707004801,
            wasted_cpu_seconds: 12.5,
            wasted_mb_seconds: 204.8,
        }
    }

    #[test]
    fn test_round_trip_all_fields() {
        let record = sample_record();
        let mut buf = Vec::new();
        encode(&record, &mut buf).unwrap();
        assert_eq!(buf.len(), encoded_size(&record));
        let decoded = decode(&buf, None).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_selective_decode_matches_projection() {
        let record = sample_record();
        let mut buf = Vec::new();
        encode(&record, &mut buf).unwrap();
        for field in Field::ALL.iter() {
            let mut desired = FieldSet::new();
            desired.insert(*field);
            let decoded = decode(&buf, Some(&desired)).unwrap();
            // id is always read; everything outside the set stays default
            assert_eq!(decoded.id, record.id);
            let mut expected = JobRecord {
                id: record.id.clone(),
                ..Default::default()
            };
            match field {
                Field::AccountingName => {
                    expected.accounting_name = record.accounting_name.clone()
                }
                Field::UserName => expected.user_name = record.user_name.clone(),
                Field::Bom => expected.bom = record.bom.clone(),
                Field::QueueName => expected.queue_name = record.queue_name.clone(),
                Field::Command => expected.command = record.command.clone(),
                Field::JobName => expected.job_name = record.job_name.clone(),
                Field::Job => expected.job = record.job.clone(),
                Field::AvailCpuTimeSec => {
                    expected.avail_cpu_time_sec = record.avail_cpu_time_sec
                }
                Field::MemRequestedMb => expected.mem_requested_mb = record.mem_requested_mb,
                Field::MemRequestedMbSec => {
                    expected.mem_requested_mb_sec = record.mem_requested_mb_sec
                }
                Field::NumExecProcs => expected.num_exec_procs = record.num_exec_procs,
                Field::PendingTimeSec => expected.pending_time_sec = record.pending_time_sec,
                Field::RunTimeSec => expected.run_time_sec = record.run_time_sec,
                Field::Timestamp => expected.timestamp = record.timestamp,
                Field::WastedCpuSeconds => {
                    expected.wasted_cpu_seconds = record.wasted_cpu_seconds
                }
                Field::WastedMbSeconds => {
                    expected.wasted_mb_seconds = record.wasted_mb_seconds
                }
            }
            assert_eq!(decoded, expected, "field {:?}", field);
        }
    }

    #[test]
    fn test_truncation_is_idempotent_and_bounded() {
        let long = "x".repeat(MAX_FIELD_LEN * 3);
        let once = truncate_field(&long).into_owned();
        assert!(once.len() <= MAX_FIELD_LEN);
        assert!(once.contains(TRUNCATION_SENTINEL));
        let twice = truncate_field(&once).into_owned();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_truncation_keeps_head_and_tail() {
        let head = "a".repeat(2000);
        let tail = "z".repeat(2000);
        let truncated = truncate_field(&format!("{head}{tail}")).into_owned();
        assert!(truncated.starts_with('a'));
        assert!(truncated.ends_with('z'));
    }

    #[test]
    fn test_short_read() {
        let record = sample_record();
        let mut buf = Vec::new();
        encode(&record, &mut buf).unwrap();
        let err = decode(&buf[..buf.len() - 4], None).unwrap_err();
        assert!(matches!(err, Error::ShortRead { .. }));
    }

    #[test]
    fn test_trailing_bytes() {
        let record = sample_record();
        let mut buf = Vec::new();
        encode(&record, &mut buf).unwrap();
        buf.extend_from_slice(b"junk");
        let err = decode(&buf, None).unwrap_err();
        assert!(matches!(err, Error::TrailingBytes { left: 4 }));
    }

    #[test]
    fn test_oversize_record_rejected() {
        let record = JobRecord {
            // id is not truncated, so a huge id trips the size bound
            id: "i".repeat(MAX_RECORD_SIZE),
            ..Default::default()
        };
        let mut buf = Vec::new();
        let err = encode(&record, &mut buf).unwrap_err();
        assert!(matches!(err, Error::Oversize { .. }));
    }

    #[test]
    fn test_truncated_fields_round_trip() {
        let record = JobRecord {
            command: "c".repeat(10_000),
            job_name: "n".repeat(MAX_FIELD_LEN + 1),
            job: "j".repeat(MAX_FIELD_LEN),
            ..sample_record()
        };
        let mut buf = Vec::new();
        encode(&record, &mut buf).unwrap();
        let decoded = decode(&buf, None).unwrap();
        assert_eq!(decoded.command, truncate_field(&record.command).into_owned());
        assert_eq!(
            decoded.job_name,
            truncate_field(&record.job_name).into_owned()
        );
        // at exactly the bound nothing changes
        assert_eq!(decoded.job, record.job);
    }
}
