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

use config::utils::json;
use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("scroll query has no bom filter")]
    NoBom,
    #[error("BadRange# {0}")]
    BadRange(String),
    #[error("Unsupported# query not servable locally: {0}")]
    Unsupported(String),
    #[error("database dir {0} is not empty, refusing to backfill")]
    BackfillExists(String),
    #[error("RemoteQuery# {body}")]
    RemoteQuery { body: String },
    #[error("FlatFileError# {0}")]
    FlatFileError(#[from] flatfile::Error),
    #[error("IoError# {0}")]
    IoError(#[from] std::io::Error),
    #[error("HttpError# {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("SerdeJsonError# {0}")]
    SerdeJsonError(#[from] json::Error),
    #[error("Error# {0}")]
    Message(String),
}

impl Error {
    /// Caller mistakes become 400s at the HTTP layer; everything else is a
    /// backend failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::NoBom | Error::BadRange(_))
    }
}
