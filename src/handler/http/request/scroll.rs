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

//! The scroll-handshake illusion. A local search returns its whole result
//! set in one response; these canned bodies let an unmodified client's
//! follow-up scroll calls succeed and terminate.

use axum::response::Response;
use bytes::Bytes;
use config::{utils::json, LOCAL_SCROLL_ID};

use crate::handler::http::json_response;

/// `POST /_search/scroll`, a continuation request. No hits: the client
/// treats the empty page as the end of the scroll.
pub async fn keep_alive() -> Response {
    json_response(Bytes::from(
        json::json!({ "_scroll_id": LOCAL_SCROLL_ID }).to_string(),
    ))
}

/// `DELETE /_search/scroll`, clearing the (imaginary) context.
pub async fn clear() -> Response {
    json_response(Bytes::from(
        json::json!({ "succeeded": true, "num_freed": 0 }).to_string(),
    ))
}
