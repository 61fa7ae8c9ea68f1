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

use config::meta::record::JobRecord;
use flatfile::{SegmentReader, Writer, codec, segment_seqs};
use tempfile::tempdir;

fn record(i: i64) -> JobRecord {
    JobRecord {
        id: format!("doc-{i:06}"),
        accounting_name: "groupA".to_string(),
        user_name: "userA".to_string(),
        bom: "bomA".to_string(),
        queue_name: if i % 2 == 0 { "normal" } else { "gpu-normal" }.to_string(),
        command: format!("bsub step-{i}"),
        job_name: "nightly".to_string(),
        job: format!("{i}[0]"),
        avail_cpu_time_sec: i * 10,
        mem_requested_mb: 100,
        mem_requested_mb_sec: 1000,
        num_exec_procs: 4,
        pending_time_sec: 1,
        run_time_sec: 60,
        timestamp: 1_707_004_800 + i,
        wasted_cpu_seconds: i as f64 * 0.5,
        wasted_mb_seconds: i as f64 * 1.5,
    }
}

#[test]
fn flatfile_round_trip() {
    let entry_num = 100;
    let dir = tempdir().unwrap();
    let dir = dir.path();
    let mut writer = Writer::new(dir, 1024 * 1024, 8192).unwrap();
    for i in 0..entry_num {
        writer.store(&record(i)).unwrap();
    }
    writer.close().unwrap();

    assert_eq!(segment_seqs(dir), vec![0]);
    let mut reader = SegmentReader::open(dir, 0, 8192).unwrap();
    let mut buf = vec![0u8; config::MAX_RECORD_SIZE];
    for i in 0..entry_num {
        let entry = reader.next_entry().unwrap().unwrap();
        assert_eq!(entry.timestamp, 1_707_004_800 + i);
        let blob = reader.read_data(&entry, &mut buf).unwrap();
        let decoded = codec::decode(blob, None).unwrap();
        assert_eq!(decoded, record(i));
    }
    assert!(reader.next_entry().unwrap().is_none());
}

#[test]
fn flatfile_rolls_over_at_file_size() {
    let dir = tempdir().unwrap();
    let dir = dir.path();
    // tiny threshold so every few records roll a segment
    let mut writer = Writer::new(dir, 256, 8192).unwrap();
    for i in 0..20 {
        writer.store(&record(i)).unwrap();
    }
    let last_seq = writer.seq();
    writer.close().unwrap();
    assert!(last_seq > 0);

    let seqs = segment_seqs(dir);
    assert_eq!(seqs, (0..=last_seq).collect::<Vec<_>>());

    // every record is still readable, in order, across the segment chain
    let mut buf = vec![0u8; config::MAX_RECORD_SIZE];
    let mut seen = 0i64;
    for seq in seqs {
        let mut reader = SegmentReader::open(dir, seq, 8192).unwrap();
        while let Some(entry) = reader.next_entry().unwrap() {
            let blob = reader.read_data(&entry, &mut buf).unwrap();
            let decoded = codec::decode(blob, None).unwrap();
            assert_eq!(decoded, record(seen));
            seen += 1;
        }
    }
    assert_eq!(seen, 20);
}

#[test]
fn flatfile_skip_data_keeps_the_cursor_in_step() {
    let dir = tempdir().unwrap();
    let dir = dir.path();
    let mut writer = Writer::new(dir, 1024 * 1024, 8192).unwrap();
    for i in 0..10 {
        writer.store(&record(i)).unwrap();
    }
    writer.close().unwrap();

    let mut reader = SegmentReader::open(dir, 0, 8192).unwrap();
    let mut buf = vec![0u8; config::MAX_RECORD_SIZE];
    for i in 0..10 {
        let entry = reader.next_entry().unwrap().unwrap();
        if i % 3 != 0 {
            reader.skip_data(&entry);
            continue;
        }
        let blob = reader.read_data(&entry, &mut buf).unwrap();
        let decoded = codec::decode(blob, None).unwrap();
        assert_eq!(decoded, record(i));
    }
}

#[test]
fn flatfile_wide_user_name_is_a_write_error() {
    let dir = tempdir().unwrap();
    let mut writer = Writer::new(dir.path(), 1024 * 1024, 8192).unwrap();
    let mut bad = record(0);
    bad.user_name = "a-user-name-wider-than-the-slot".to_string();
    let err = writer.store(&bad).unwrap_err();
    assert!(matches!(err, flatfile::Error::FieldTooLong { .. }));
    // the failed record left nothing behind
    writer.store(&record(1)).unwrap();
    writer.close().unwrap();

    let mut reader = SegmentReader::open(dir.path(), 0, 8192).unwrap();
    let mut buf = vec![0u8; config::MAX_RECORD_SIZE];
    let entry = reader.next_entry().unwrap().unwrap();
    let decoded = codec::decode(reader.read_data(&entry, &mut buf).unwrap(), None).unwrap();
    assert_eq!(decoded, record(1));
    assert!(reader.next_entry().unwrap().is_none());
}
