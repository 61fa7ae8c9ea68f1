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

use hashbrown::HashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{
    meta::record::{Field, FieldSet, JobRecord},
    utils::{json, time},
};

/// A client-visible search request. The grammar is the closed subset the
/// local store understands; anything else still parses (the fallback clause
/// variant) so the facade can decide to proxy it instead of rejecting it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Request {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryContainer>,
    #[serde(rename = "_source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggs: Option<json::Value>,
    /// Set from the `scroll=` URL parameter, never from the body. Included
    /// when serialising so scroll and single-page fingerprints differ.
    #[serde(default, skip_deserializing, skip_serializing_if = "is_false")]
    pub scroll: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryContainer {
    #[serde(rename = "bool", default, skip_serializing_if = "Option::is_none")]
    pub bool_query: Option<BoolQuery>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolQuery {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<FilterClause>,
}

/// One clause inside the filter block. Externally tagged, matching the wire
/// shape `{"match_phrase": {"bom": "bomA"}}`. Clauses outside the closed
/// grammar land in `Other` and mark the query as not locally servable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FilterClause {
    #[serde(rename = "match_phrase")]
    MatchPhrase(json::Map<String, json::Value>),
    #[serde(rename = "prefix")]
    Prefix(json::Map<String, json::Value>),
    #[serde(rename = "range")]
    Range(json::Map<String, json::Value>),
    #[serde(untagged)]
    Other(json::Value),
}

impl FilterClause {
    /// The single `{field: value}` pair of a match_phrase or prefix clause.
    pub fn field_value(&self) -> Option<(&str, String)> {
        let map = match self {
            FilterClause::MatchPhrase(map) | FilterClause::Prefix(map) => map,
            _ => return None,
        };
        let (field, value) = map.iter().next()?;
        Some((field.as_str(), json::get_string_value(value)))
    }
}

/// Time bounds of a query, unix seconds. Exactly one of `lt`/`lte` is
/// non-zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    pub gte: i64,
    pub lt: i64,
    pub lte: i64,
}

impl Request {
    /// Extract the timestamp range clause. Errors when the query has no
    /// range, no `gte`, or both/neither of `lt`/`lte`.
    pub fn date_range(&self) -> Result<DateRange, anyhow::Error> {
        let clauses = self.filter_clauses();
        let range = clauses
            .iter()
            .find_map(|c| match c {
                FilterClause::Range(map) => map.get("timestamp"),
                _ => None,
            })
            .ok_or_else(|| anyhow::anyhow!("query has no timestamp range"))?;
        let bounds = range
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("timestamp range is not an object"))?;
        let gte = match bounds.get("gte") {
            Some(v) => time::parse_unix_sec(v)?,
            None => return Err(anyhow::anyhow!("timestamp range has no gte")),
        };
        let lt = bounds.get("lt").map(time::parse_unix_sec).transpose()?;
        let lte = bounds.get("lte").map(time::parse_unix_sec).transpose()?;
        match (lt, lte) {
            (Some(lt), None) => Ok(DateRange { gte, lt, lte: 0 }),
            (None, Some(lte)) => Ok(DateRange { gte, lt: 0, lte }),
            _ => Err(anyhow::anyhow!(
                "timestamp range needs exactly one of lt and lte"
            )),
        }
    }

    /// Flat `{field: value}` view of the match_phrase and prefix clauses.
    pub fn filters(&self) -> HashMap<String, String> {
        self.filter_clauses()
            .iter()
            .filter_map(|c| c.field_value())
            .map(|(field, value)| (field.to_string(), value))
            .collect()
    }

    /// The `_source` projection as field tags. `None` means all fields.
    /// Names that are not record fields are ignored.
    pub fn desired_fields(&self) -> Option<FieldSet> {
        let source = self.source.as_ref()?;
        let set: FieldSet = source
            .iter()
            .filter_map(|name| Field::from_name(name))
            .collect();
        if set.is_empty() { None } else { Some(set) }
    }

    pub fn is_scroll(&self) -> bool {
        self.scroll
    }

    pub fn filter_clauses(&self) -> &[FilterClause] {
        self.query
            .as_ref()
            .and_then(|q| q.bool_query.as_ref())
            .map(|b| b.filter.as_slice())
            .unwrap_or(&[])
    }

    /// Canonical JSON used for fingerprinting: unset fields elided by serde,
    /// object keys sorted by the serialiser, and the filter clause list
    /// sorted by each clause's serialised form so insertion order does not
    /// matter.
    pub fn canonical_json(&self) -> String {
        let mut canonical = self.clone();
        if let Some(query) = canonical.query.as_mut()
            && let Some(bool_query) = query.bool_query.as_mut()
        {
            bool_query
                .filter
                .sort_by_key(|c| json::to_string(c).unwrap_or_default());
        }
        json::to_string(&canonical).unwrap_or_default()
    }
}

fn eq_relation() -> String {
    "eq".to_string()
}

/// The search response envelope the analytics client expects.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Response {
    pub took: u64,
    pub timed_out: bool,
    #[serde(rename = "_scroll_id", default, skip_serializing_if = "Option::is_none")]
    pub scroll_id: Option<String>,
    pub hits: Hits,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<json::Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Hits {
    pub total: Total,
    pub hits: Vec<json::Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Total {
    pub value: u64,
    #[serde(default = "eq_relation")]
    pub relation: String,
}

impl Default for Total {
    fn default() -> Self {
        Total {
            value: 0,
            relation: eq_relation(),
        }
    }
}

pub struct Hit {
    pub id: String,
    pub record: JobRecord,
}

#[derive(Default)]
struct HitSet {
    total: u64,
    hits: Vec<Hit>,
}

/// Accumulates hits and errors across parallel segment scans. Hit order is
/// unspecified; callers that need a sort must sort themselves.
#[derive(Default)]
pub struct SearchResults {
    hits: Mutex<HitSet>,
    errors: Mutex<Vec<String>>,
}

impl SearchResults {
    pub fn new() -> SearchResults {
        SearchResults::default()
    }

    pub fn add_hit(&self, id: String, record: JobRecord) {
        let mut hits = self.hits.lock();
        hits.total += 1;
        hits.hits.push(Hit { id, record });
    }

    /// Moves the record's own id into the hit envelope.
    pub fn add_hit_details(&self, mut record: JobRecord) {
        let id = std::mem::take(&mut record.id);
        self.add_hit(id, record);
    }

    pub fn add_error(&self, err: impl ToString) {
        self.errors.lock().push(err.to_string());
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }

    pub fn total(&self) -> u64 {
        self.hits.lock().total
    }

    /// Distinct `user_name` values across all hits, sorted.
    pub fn usernames(&self) -> Vec<String> {
        let hits = self.hits.lock();
        let mut names: Vec<String> = hits
            .hits
            .iter()
            .map(|h| h.record.user_name.clone())
            .collect::<hashbrown::HashSet<_>>()
            .into_iter()
            .collect();
        names.sort_unstable();
        names
    }

    pub fn into_response(
        self,
        took: u64,
        desired: Option<&FieldSet>,
        scroll_id: Option<String>,
    ) -> Response {
        let hit_set = self.hits.into_inner();
        let hits = hit_set
            .hits
            .into_iter()
            .map(|hit| {
                let mut envelope = json::Map::new();
                envelope.insert("_id".to_string(), json::Value::from(hit.id));
                envelope.insert("_source".to_string(), hit.record.to_source(desired));
                json::Value::Object(envelope)
            })
            .collect();
        Response {
            took,
            timed_out: false,
            scroll_id,
            hits: Hits {
                total: Total {
                    value: hit_set.total,
                    relation: eq_relation(),
                },
                hits,
            },
            aggregations: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_from_json(body: &str) -> Request {
        json::from_str(body).unwrap()
    }

    #[test]
    fn test_parse_filter_clauses() {
        let req = request_from_json(
            r#"{
                "size": 10000,
                "query": {"bool": {"filter": [
                    {"match_phrase": {"bom": "bomA"}},
                    {"prefix": {"queue_name": "gpu"}},
                    {"range": {"timestamp": {
                        "gte": "2024-02-04T00:00:00Z",
                        "lte": "2024-02-06T00:00:00Z",
                        "format": "strict_date_optional_time"
                    }}}
                ]}},
                "_source": ["user_name", "timestamp"]
            }"#,
        );
        let filters = req.filters();
        assert_eq!(filters["bom"], "bomA");
        assert_eq!(filters["queue_name"], "gpu");
        let range = req.date_range().unwrap();
        assert_eq!(range.gte, 1707004800);
        assert_eq!(range.lte, 1707177600);
        assert_eq!(range.lt, 0);
        let desired = req.desired_fields().unwrap();
        assert!(desired.contains(&Field::UserName));
        assert!(desired.contains(&Field::Timestamp));
        assert_eq!(desired.len(), 2);
    }

    #[test]
    fn test_date_range_requires_exactly_one_upper_bound() {
        let req = request_from_json(
            r#"{"query": {"bool": {"filter": [
                {"range": {"timestamp": {"gte": "2024-02-04T00:00:00Z"}}}
            ]}}}"#,
        );
        assert!(req.date_range().is_err());

        let req = request_from_json(
            r#"{"query": {"bool": {"filter": [
                {"range": {"timestamp": {
                    "gte": "2024-02-04T00:00:00Z",
                    "lt": "2024-02-05T00:00:00Z",
                    "lte": "2024-02-06T00:00:00Z"
                }}}
            ]}}}"#,
        );
        assert!(req.date_range().is_err());
    }

    #[test]
    fn test_missing_range_is_an_error() {
        let req = request_from_json(r#"{"query": {"bool": {"filter": []}}}"#);
        assert!(req.date_range().is_err());
    }

    #[test]
    fn test_unknown_clause_parses_as_other() {
        let req = request_from_json(
            r#"{"query": {"bool": {"filter": [
                {"wildcard": {"job_name": "ba*"}}
            ]}}}"#,
        );
        assert!(matches!(
            req.filter_clauses()[0],
            FilterClause::Other(_)
        ));
    }

    #[test]
    fn test_canonical_json_is_order_insensitive() {
        let a = request_from_json(
            r#"{"query": {"bool": {"filter": [
                {"match_phrase": {"bom": "bomA"}},
                {"range": {"timestamp": {"gte": 1, "lte": 2}}}
            ]}}}"#,
        );
        let b = request_from_json(
            r#"{"query": {"bool": {"filter": [
                {"range": {"timestamp": {"lte": 2, "gte": 1}}},
                {"match_phrase": {"bom": "bomA"}}
            ]}}}"#,
        );
        assert_eq!(a.canonical_json(), b.canonical_json());
    }

    #[test]
    fn test_canonical_json_distinguishes_scroll() {
        let mut a = request_from_json(r#"{"size": 1}"#);
        let b = request_from_json(r#"{"size": 1}"#);
        a.scroll = true;
        assert_ne!(a.canonical_json(), b.canonical_json());
    }

    #[test]
    fn test_results_accumulate_and_project() {
        let results = SearchResults::new();
        let record = JobRecord {
            id: "doc1".to_string(),
            user_name: "userA".to_string(),
            timestamp: 7,
            ..Default::default()
        };
        results.add_hit_details(record);
        results.add_hit_details(JobRecord {
            id: "doc2".to_string(),
            user_name: "userB".to_string(),
            ..Default::default()
        });
        assert_eq!(results.total(), 2);
        assert_eq!(results.usernames(), vec!["userA", "userB"]);

        let mut desired = FieldSet::new();
        desired.insert(Field::UserName);
        let response = results.into_response(3, Some(&desired), None);
        assert_eq!(response.hits.total.value, 2);
        let hit = response.hits.hits[0].as_object().unwrap();
        assert!(hit.contains_key("_id"));
        let source = hit["_source"].as_object().unwrap();
        assert_eq!(source.len(), 1);
        assert!(source.contains_key("user_name"));
    }
}
