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

//! Translates the client query grammar into an index-prefix predicate plus
//! residual predicates. Anything outside the closed grammar compiles to
//! [`Error::Unsupported`], which the facade turns into a proxy pass.

use chrono::NaiveDate;
use config::{
    meta::{
        record::{Field, FieldSet, JobRecord},
        search::{FilterClause, Request},
    },
    utils::time,
    ACCOUNTING_NAME_WIDTH, GPU_QUEUE_PREFIX, META_CLUSTER_NAME, USER_NAME_WIDTH,
};

use crate::service::errors::{Error, Result};

/// A query compiled against the index layout. The padded string filters
/// compare bytewise against index entries in the scan hot loop; residual
/// predicates run after decode.
#[derive(Clone, Debug, Default)]
pub struct CompiledFilter {
    pub gte_unix: i64,
    /// Exactly one of `lt_unix`/`lte_unix` is non-zero.
    pub lt_unix: i64,
    pub lte_unix: i64,
    pub bom: String,
    pub accounting_name: Option<[u8; ACCOUNTING_NAME_WIDTH]>,
    pub user_name: Option<[u8; USER_NAME_WIDTH]>,
    pub require_gpu: bool,
    /// `_source` projection for the response; `None` means all fields.
    pub desired: Option<FieldSet>,
    /// Prefix predicates on decoded fields.
    pub residual: Vec<(Field, String)>,
}

impl CompiledFilter {
    pub fn compile(req: &Request) -> Result<CompiledFilter> {
        let range = req
            .date_range()
            .map_err(|e| Error::BadRange(e.to_string()))?;
        let mut filter = CompiledFilter {
            gte_unix: range.gte,
            lt_unix: range.lt,
            lte_unix: range.lte,
            desired: req.desired_fields(),
            ..Default::default()
        };
        for clause in req.filter_clauses() {
            match clause {
                FilterClause::Range(_) => {}
                FilterClause::MatchPhrase(_) => {
                    let (field, value) = clause
                        .field_value()
                        .ok_or_else(|| Error::Unsupported("empty match_phrase".to_string()))?;
                    match field {
                        "meta_cluster_name" => {
                            // routing-only field; every local record is from
                            // the one cluster
                            if value != META_CLUSTER_NAME {
                                return Err(Error::Unsupported(format!(
                                    "meta_cluster_name {value}"
                                )));
                            }
                        }
                        "bom" => filter.bom = value,
                        "accounting_name" => {
                            filter.accounting_name = Some(pad_filter(&value, "accounting_name")?)
                        }
                        "user_name" => filter.user_name = Some(pad_filter(&value, "user_name")?),
                        _ => {
                            return Err(Error::Unsupported(format!("match_phrase on {field}")));
                        }
                    }
                }
                FilterClause::Prefix(_) => {
                    let (field, value) = clause
                        .field_value()
                        .ok_or_else(|| Error::Unsupported("empty prefix".to_string()))?;
                    match field {
                        "queue_name" => {
                            if value.starts_with(GPU_QUEUE_PREFIX) {
                                filter.require_gpu = true;
                            }
                            if value != GPU_QUEUE_PREFIX {
                                filter.residual.push((Field::QueueName, value));
                            }
                        }
                        "job_name" => filter.residual.push((Field::JobName, value)),
                        _ => return Err(Error::Unsupported(format!("prefix on {field}"))),
                    }
                }
                FilterClause::Other(value) => {
                    return Err(Error::Unsupported(value.to_string()));
                }
            }
        }
        if filter.bom.is_empty() {
            return Err(Error::NoBom);
        }
        Ok(filter)
    }

    /// The UTC days whose partitions can hold matching records.
    pub fn days(&self) -> Vec<NaiveDate> {
        let upper_unix = if self.lte_unix != 0 {
            self.lte_unix
        } else {
            self.lt_unix - 1
        };
        if upper_unix < self.gte_unix {
            return Vec::new();
        }
        let mut days = Vec::new();
        let mut day = time::unix_day(self.gte_unix);
        let upper = time::unix_day(upper_unix);
        while day <= upper {
            days.push(day);
            day = match day.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }
        days
    }

    /// Fields the codec must actually read: the projection plus whatever
    /// the residual predicates inspect.
    pub fn decode_fields(&self) -> Option<FieldSet> {
        let mut desired = self.desired.clone()?;
        for (field, _) in &self.residual {
            desired.insert(*field);
        }
        Some(desired)
    }

    pub fn matches_residual(&self, record: &JobRecord) -> bool {
        self.residual.iter().all(|(field, prefix)| {
            let value = match field {
                Field::QueueName => &record.queue_name,
                Field::JobName => &record.job_name,
                Field::AccountingName => &record.accounting_name,
                Field::UserName => &record.user_name,
                Field::Bom => &record.bom,
                Field::Command => &record.command,
                Field::Job => &record.job,
                _ => return false,
            };
            value.starts_with(prefix)
        })
    }
}

fn pad_filter<const N: usize>(value: &str, field: &'static str) -> Result<[u8; N]> {
    // a value wider than the slot can never match locally, but the remote
    // cluster can still answer it
    flatfile::index::pad_fixed(value, field)
        .map_err(|_| Error::Unsupported(format!("{field} wider than its index slot")))
}
