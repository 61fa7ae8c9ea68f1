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

//! The facade: the four local routes, everything else reverse-proxied to
//! the remote cluster unchanged.

pub mod proxy;
pub mod request;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
    routing::post,
    Router,
};
use bytes::Bytes;
use config::Settings;

use crate::service::{elastic::Elastic, search::cache::QueryCache, search::LocalStore};

pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: LocalStore,
    pub cache: QueryCache,
    pub elastic: Elastic,
    pub proxy_client: reqwest::Client,
}

impl AppState {
    pub fn new(settings: Arc<Settings>, store: LocalStore) -> AppState {
        AppState {
            cache: QueryCache::new(settings.farmer.cache_entries),
            elastic: Elastic::new(&settings),
            proxy_client: reqwest::Client::new(),
            settings,
            store,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/_search/scroll",
            post(request::scroll::keep_alive).delete(request::scroll::clear),
        )
        .route("/get_usernames", post(request::usernames::get_usernames))
        .route("/{index}/_search", post(request::search::search))
        // an unmatched path or an unexpected method on a local path both
        // belong to the upstream
        .fallback(proxy::forward)
        .method_not_allowed_fallback(proxy::forward)
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>) -> Result<(), anyhow::Error> {
    let addr = state.settings.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("[HTTP] listening on {}", addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    log::info!("[HTTP] interrupt received, shutting down");
}

pub(crate) fn json_response(bytes: Bytes) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(bytes))
        .unwrap_or_default()
}

pub(crate) fn error_response(status: StatusCode, message: String) -> Response {
    Response::builder()
        .status(status)
        .body(Body::from(message))
        .unwrap_or_default()
}
