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

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
};
use bytes::Bytes;
use config::{meta::search::Request as SearchRequest, utils::json};

use crate::{
    handler::http::{error_response, json_response, request::apply_params, AppState},
    service::{
        errors::Error,
        search::cache::{fingerprint, KeySpace},
    },
};

/// `POST /get_usernames`: the distinct `user_name` values matching the
/// query, as a JSON array. Always served from the local store; there is no
/// upstream equivalent to proxy to.
pub async fn get_usernames(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Response {
    if body.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "missing query body".to_string());
    }
    let mut req: SearchRequest = match json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, format!("malformed query body: {e}"));
        }
    };
    apply_params(&mut req, &params);

    let key = fingerprint(&req, KeySpace::Usernames);
    let store = &state.store;
    let result = state
        .cache
        .cached(key, || async {
            let names = store.usernames(&req).await?;
            Ok(Bytes::from(json::to_vec(&names)?))
        })
        .await;
    match result {
        Ok(bytes) => json_response(bytes),
        // there is nowhere to proxy this route, so an unsupported shape is
        // a caller mistake here
        Err(e) if e.is_validation() || matches!(e, Error::Unsupported(_)) => {
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
