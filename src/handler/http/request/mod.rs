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

pub mod scroll;
pub mod search;
pub mod usernames;

use config::meta::search::Request as SearchRequest;

/// `size`, `_source` and `scroll` from the URL query string override or
/// augment the body. `_source` accepts comma-separated lists and multiple
/// listings combine.
pub(crate) fn apply_params(req: &mut SearchRequest, params: &[(String, String)]) {
    for (key, value) in params {
        match key.as_str() {
            "scroll" => req.scroll = true,
            "size" => {
                if let Ok(size) = value.parse() {
                    req.size = Some(size);
                }
            }
            "_source" => {
                let mut fields = req.source.take().unwrap_or_default();
                fields.extend(
                    value
                        .split(',')
                        .filter(|s| !s.is_empty())
                        .map(|s| s.to_string()),
                );
                req.source = Some(fields);
            }
            _ => {}
        }
    }
}
