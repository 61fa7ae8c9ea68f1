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

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::utils::json;

pub const SECONDS_PER_DAY: i64 = 24 * 3600;

// period format: an integer followed by one unit, e.g. 2h, 3d, 1w, 1m, 2y.
// Weeks are 7 days, months 730 hours, years 8760 hours.
static PERIOD_UNITS: [(char, i64); 5] = [
    ('h', 1),
    ('d', 24),
    ('w', 168),
    ('m', 730),
    ('y', 8760),
];

#[inline(always)]
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse a backfill period like `2d` into a duration.
pub fn parse_period(s: &str) -> Result<Duration, anyhow::Error> {
    let s = s.trim();
    if s.len() < 2 {
        return Err(anyhow::anyhow!("invalid period format: {}", s));
    }
    let (digits, unit) = s.split_at(s.len() - 1);
    let n: i64 = digits
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid period number: {}", s))?;
    if n <= 0 {
        return Err(anyhow::anyhow!("period must be positive: {}", s));
    }
    let unit = unit.chars().next().unwrap();
    let hours = PERIOD_UNITS
        .iter()
        .find(|(u, _)| *u == unit)
        .map(|(_, hours)| hours)
        .ok_or_else(|| anyhow::anyhow!("invalid period unit: {}", s))?;
    Ok(Duration::hours(n * hours))
}

/// Unix seconds from a JSON range bound: epoch seconds as a number, or an
/// RFC3339 / `strict_date_optional_time` string.
pub fn parse_unix_sec(value: &json::Value) -> Result<i64, anyhow::Error> {
    match value {
        json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("timestamp out of range: {}", n)),
        json::Value::String(s) => parse_str_to_unix_sec(s),
        _ => Err(anyhow::anyhow!("invalid timestamp value: {}", value)),
    }
}

pub fn parse_str_to_unix_sec(s: &str) -> Result<i64, anyhow::Error> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.timestamp());
    }
    // date-optional-time without an offset is taken as UTC
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(t.and_utc().timestamp());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp());
    }
    Err(anyhow::anyhow!("invalid time format: {}", s))
}

/// Floor a unix timestamp to the start of its UTC day.
#[inline(always)]
pub fn day_floor(unix_sec: i64) -> i64 {
    unix_sec.div_euclid(SECONDS_PER_DAY) * SECONDS_PER_DAY
}

/// The UTC day a unix timestamp falls in.
pub fn unix_day(unix_sec: i64) -> NaiveDate {
    Utc.timestamp_opt(unix_sec, 0).unwrap().date_naive()
}

pub fn day_start_unix(day: NaiveDate) -> i64 {
    day.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp()
}
