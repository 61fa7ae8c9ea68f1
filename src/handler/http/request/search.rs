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
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::Response,
};
use bytes::Bytes;
use config::{meta::search::Request as SearchRequest, utils::json};

use crate::{
    handler::http::{
        error_response, json_response, proxy,
        request::apply_params,
        AppState,
    },
    service::{
        errors::Error,
        search::{
            cache::{fingerprint, KeySpace},
            filter::CompiledFilter,
        },
    },
};

/// `POST /{index}/_search`. Scrollable queries against the configured
/// index are served from the local store through the result cache;
/// single-page queries go to the remote cluster through the same cache;
/// anything else is proxied untouched.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Path(index): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if index != state.settings.elastic.index {
        return proxy::forward_raw(&state, Method::POST, &uri, &headers, body).await;
    }
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

    if !req.is_scroll() {
        return remote_search(&state, &req).await;
    }

    // classify before caching so unsupported shapes fall through to the
    // proxy rather than 400
    match CompiledFilter::compile(&req) {
        Ok(_) => {}
        Err(Error::Unsupported(reason)) => {
            log::debug!("[HTTP] proxying locally unservable query: {}", reason);
            return proxy::forward_raw(&state, Method::POST, &uri, &headers, body).await;
        }
        Err(e) if e.is_validation() => {
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }

    let key = fingerprint(&req, KeySpace::Results);
    let store = &state.store;
    let result = state
        .cache
        .cached(key, || async {
            let response = store.scroll(&req).await?;
            Ok(Bytes::from(json::to_vec(&response)?))
        })
        .await;
    match result {
        Ok(bytes) => json_response(bytes),
        Err(e) if e.is_validation() => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn remote_search(state: &AppState, req: &SearchRequest) -> Response {
    let key = fingerprint(req, KeySpace::Results);
    let body = match json::to_value(req) {
        Ok(body) => body,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    let elastic = &state.elastic;
    let result = state
        .cache
        .cached(key, || async move {
            let response = elastic.search(&body).await?;
            Ok(Bytes::from(json::to_vec(&response)?))
        })
        .await;
    match result {
        Ok(bytes) => json_response(bytes),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
