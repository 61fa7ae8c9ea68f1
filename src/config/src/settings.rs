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

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level YAML settings file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    pub elastic: Elastic,
    pub farmer: Farmer,
}

/// Connection details for the remote search cluster, plus the index name
/// used to decide whether an incoming search can be served locally.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Elastic {
    pub host: String,
    #[serde(default = "default_elastic_port")]
    pub port: u16,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub index: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Farmer {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    pub database_dir: String,
    #[serde(default = "default_file_size")]
    pub file_size: usize,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "default_cache_entries")]
    pub cache_entries: usize,
    /// Partition rescan interval in seconds.
    #[serde(default = "default_update_frequency")]
    pub update_frequency: u64,
}

impl Default for Elastic {
    fn default() -> Self {
        Elastic {
            host: "localhost".to_string(),
            port: default_elastic_port(),
            scheme: default_scheme(),
            username: String::new(),
            password: String::new(),
            index: String::new(),
        }
    }
}

impl Default for Farmer {
    fn default() -> Self {
        Farmer {
            host: default_host(),
            port: 0,
            database_dir: String::new(),
            file_size: default_file_size(),
            buffer_size: default_buffer_size(),
            cache_entries: default_cache_entries(),
            update_frequency: default_update_frequency(),
        }
    }
}

fn default_elastic_port() -> u16 {
    9200
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_file_size() -> usize {
    32 * 1024 * 1024
}

fn default_buffer_size() -> usize {
    4 * 1024 * 1024
}

fn default_cache_entries() -> usize {
    128
}

fn default_update_frequency() -> u64 {
    3600
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Settings, anyhow::Error> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("read config {}: {}", path.display(), e))?;
        let settings: Settings = serde_yaml::from_str(&data)
            .map_err(|e| anyhow::anyhow!("parse config {}: {}", path.display(), e))?;
        if settings.farmer.database_dir.is_empty() {
            return Err(anyhow::anyhow!("farmer.database_dir is required"));
        }
        if settings.elastic.index.is_empty() {
            return Err(anyhow::anyhow!("elastic.index is required"));
        }
        Ok(settings)
    }

    /// Base URL of the remote cluster, e.g. `http://es.example.com:9200`.
    pub fn elastic_url(&self) -> String {
        format!(
            "{}://{}:{}",
            self.elastic.scheme, self.elastic.host, self.elastic.port
        )
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.farmer.host, self.farmer.port)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"
elastic:
  host: es.example.com
  port: 9200
  scheme: https
  username: guest
  password: guest
  index: farm-jobs-*
farmer:
  host: 127.0.0.1
  port: 8080
  database_dir: /tmp/farmer-db
"#,
        )
        .unwrap();
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.elastic_url(), "https://es.example.com:9200");
        assert_eq!(settings.listen_addr(), "127.0.0.1:8080");
        assert_eq!(settings.farmer.file_size, 32 * 1024 * 1024);
        assert_eq!(settings.farmer.buffer_size, 4 * 1024 * 1024);
        assert_eq!(settings.farmer.cache_entries, 128);
        assert_eq!(settings.farmer.update_frequency, 3600);
    }

    #[test]
    fn test_load_settings_missing_database_dir() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"
elastic:
  host: es.example.com
  index: farm-jobs-*
farmer:
  port: 8080
  database_dir: ""
"#,
        )
        .unwrap();
        assert!(Settings::load(file.path()).is_err());
    }
}
