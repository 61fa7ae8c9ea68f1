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

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::{utils::json, GPU_QUEUE_PREFIX};

/// One job-accounting event. Immutable once written to a partition.
///
/// The document id lives outside the `_source` body on the wire, so it is
/// excluded from serde and carried explicitly.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub accounting_name: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub bom: String,
    #[serde(default)]
    pub queue_name: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub job_name: String,
    #[serde(default)]
    pub job: String,
    #[serde(default)]
    pub avail_cpu_time_sec: i64,
    #[serde(default)]
    pub mem_requested_mb: i64,
    #[serde(default)]
    pub mem_requested_mb_sec: i64,
    #[serde(default)]
    pub num_exec_procs: i64,
    #[serde(default)]
    pub pending_time_sec: i64,
    #[serde(default)]
    pub run_time_sec: i64,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub wasted_cpu_seconds: f64,
    #[serde(default)]
    pub wasted_mb_seconds: f64,
}

/// Record fields addressable by a `_source` projection or a selective
/// decode. Listed in wire order; the codec walks `Field::ALL` as written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    AccountingName,
    UserName,
    Bom,
    QueueName,
    Command,
    JobName,
    Job,
    AvailCpuTimeSec,
    MemRequestedMb,
    MemRequestedMbSec,
    NumExecProcs,
    PendingTimeSec,
    RunTimeSec,
    Timestamp,
    WastedCpuSeconds,
    WastedMbSeconds,
}

pub type FieldSet = HashSet<Field>;

impl Field {
    pub const ALL: [Field; 16] = [
        Field::AccountingName,
        Field::UserName,
        Field::Bom,
        Field::QueueName,
        Field::Command,
        Field::JobName,
        Field::Job,
        Field::AvailCpuTimeSec,
        Field::MemRequestedMb,
        Field::MemRequestedMbSec,
        Field::NumExecProcs,
        Field::PendingTimeSec,
        Field::RunTimeSec,
        Field::Timestamp,
        Field::WastedCpuSeconds,
        Field::WastedMbSeconds,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::AccountingName => "accounting_name",
            Field::UserName => "user_name",
            Field::Bom => "bom",
            Field::QueueName => "queue_name",
            Field::Command => "command",
            Field::JobName => "job_name",
            Field::Job => "job",
            Field::AvailCpuTimeSec => "avail_cpu_time_sec",
            Field::MemRequestedMb => "mem_requested_mb",
            Field::MemRequestedMbSec => "mem_requested_mb_sec",
            Field::NumExecProcs => "num_exec_procs",
            Field::PendingTimeSec => "pending_time_sec",
            Field::RunTimeSec => "run_time_sec",
            Field::Timestamp => "timestamp",
            Field::WastedCpuSeconds => "wasted_cpu_seconds",
            Field::WastedMbSeconds => "wasted_mb_seconds",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.iter().find(|f| f.name() == name).copied()
    }
}

impl JobRecord {
    /// Whether the record ran in a GPU queue, as encoded in the index entry.
    pub fn is_gpu(&self) -> bool {
        self.queue_name.starts_with(GPU_QUEUE_PREFIX)
    }

    /// Build a record from a search hit's `_id` and `_source` body.
    pub fn from_source(id: &str, source: &json::Value) -> JobRecord {
        let mut record: JobRecord = json::from_value(source.clone()).unwrap_or_default();
        record.id = id.to_string();
        record
    }

    /// The `_source` body of a hit. With a non-empty projection only those
    /// fields are emitted, under their canonical names.
    pub fn to_source(&self, desired: Option<&FieldSet>) -> json::Value {
        let mut map = json::Map::new();
        for field in Field::ALL.iter() {
            if let Some(desired) = desired
                && !desired.contains(field)
            {
                continue;
            }
            let value = match field {
                Field::AccountingName => json::Value::from(self.accounting_name.clone()),
                Field::UserName => json::Value::from(self.user_name.clone()),
                Field::Bom => json::Value::from(self.bom.clone()),
                Field::QueueName => json::Value::from(self.queue_name.clone()),
                Field::Command => json::Value::from(self.command.clone()),
                Field::JobName => json::Value::from(self.job_name.clone()),
                Field::Job => json::Value::from(self.job.clone()),
                Field::AvailCpuTimeSec => json::Value::from(self.avail_cpu_time_sec),
                Field::MemRequestedMb => json::Value::from(self.mem_requested_mb),
                Field::MemRequestedMbSec => json::Value::from(self.mem_requested_mb_sec),
                Field::NumExecProcs => json::Value::from(self.num_exec_procs),
                Field::PendingTimeSec => json::Value::from(self.pending_time_sec),
                Field::RunTimeSec => json::Value::from(self.run_time_sec),
                Field::Timestamp => json::Value::from(self.timestamp),
                Field::WastedCpuSeconds => json::Value::from(self.wasted_cpu_seconds),
                Field::WastedMbSeconds => json::Value::from(self.wasted_mb_seconds),
            };
            map.insert(field.name().to_string(), value);
        }
        json::Value::Object(map)
    }
}
