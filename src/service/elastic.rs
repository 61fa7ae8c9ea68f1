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

//! Thin adapter over the remote cluster's search API: version probe,
//! single-page search, and an auto-paginating scroll that always clears
//! its context on exit.

use config::{utils::json, Settings, MAX_SCROLL_PAGE, SCROLL_KEEPALIVE};
use reqwest::StatusCode;

use crate::service::errors::{Error, Result};

#[derive(Clone)]
pub struct Elastic {
    client: reqwest::Client,
    base: String,
    index: String,
    username: String,
    password: String,
}

impl Elastic {
    pub fn new(settings: &Settings) -> Elastic {
        Elastic {
            client: reqwest::Client::new(),
            base: settings.elastic_url(),
            index: settings.elastic.index.clone(),
            username: settings.elastic.username.clone(),
            password: settings.elastic.password.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, format!("{}{}", self.base, path));
        if self.username.is_empty() {
            builder
        } else {
            builder.basic_auth(&self.username, Some(&self.password))
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<json::Value> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::RemoteQuery { body });
        }
        Ok(json::from_str(&body)?)
    }

    /// Version probe against the cluster root.
    pub async fn info(&self) -> Result<json::Value> {
        self.send(self.request(reqwest::Method::GET, "/")).await
    }

    /// Single-page search against the configured index.
    pub async fn search(&self, body: &json::Value) -> Result<json::Value> {
        self.send(
            self.request(reqwest::Method::POST, &format!("/{}/_search", self.index))
                .json(body),
        )
        .await
    }

    /// Scroll the full result set for `body`, feeding every hit's id and
    /// `_source` to `sink`. Pages of [`MAX_SCROLL_PAGE`] under a short
    /// context TTL; the context is cleared however the scroll ends.
    pub async fn scroll<F>(&self, body: &json::Value, mut sink: F) -> Result<u64>
    where
        F: FnMut(&str, &json::Value) -> Result<()>,
    {
        let mut body = body.clone();
        if let Some(map) = body.as_object_mut() {
            map.insert("size".to_string(), json::Value::from(MAX_SCROLL_PAGE));
        }
        let page = self
            .send(
                self.request(
                    reqwest::Method::POST,
                    &format!("/{}/_search?scroll={}", self.index, SCROLL_KEEPALIVE),
                )
                .json(&body),
            )
            .await?;

        let mut scroll_id = page
            .get("_scroll_id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let total = page
            .pointer("/hits/total/value")
            .and_then(|v| v.as_u64())
            .unwrap_or_default();

        let result = self.drain_pages(page, total, &mut scroll_id, &mut sink).await;
        if !scroll_id.is_empty() {
            self.clear_scroll(&scroll_id).await;
        }
        result
    }

    async fn drain_pages<F>(
        &self,
        first: json::Value,
        total: u64,
        scroll_id: &mut String,
        sink: &mut F,
    ) -> Result<u64>
    where
        F: FnMut(&str, &json::Value) -> Result<()>,
    {
        let mut fetched = feed_hits(&first, sink)?;
        while fetched < total {
            let page = self
                .send(
                    self.request(reqwest::Method::POST, "/_search/scroll").json(&json::json!({
                        "scroll": SCROLL_KEEPALIVE,
                        "scroll_id": scroll_id,
                    })),
                )
                .await?;
            if let Some(id) = page.get("_scroll_id").and_then(|v| v.as_str()) {
                *scroll_id = id.to_string();
            }
            let got = feed_hits(&page, sink)?;
            if got == 0 {
                break;
            }
            fetched += got;
        }
        Ok(fetched)
    }

    async fn clear_scroll(&self, scroll_id: &str) {
        let result = self
            .request(reqwest::Method::DELETE, "/_search/scroll")
            .json(&json::json!({ "scroll_id": [scroll_id] }))
            .send()
            .await;
        match result {
            Ok(response) if response.status() == StatusCode::OK => {}
            Ok(response) => {
                log::warn!("[ELASTIC] clear scroll returned {}", response.status())
            }
            Err(e) => log::warn!("[ELASTIC] clear scroll failed: {}", e),
        }
    }
}

fn feed_hits<F>(page: &json::Value, sink: &mut F) -> Result<u64>
where
    F: FnMut(&str, &json::Value) -> Result<()>,
{
    let Some(hits) = page.pointer("/hits/hits").and_then(|v| v.as_array()) else {
        return Ok(0);
    };
    for hit in hits {
        let id = hit.get("_id").and_then(|v| v.as_str()).unwrap_or_default();
        if let Some(source) = hit.get("_source") {
            sink(id, source)?;
        }
    }
    Ok(hits.len() as u64)
}
