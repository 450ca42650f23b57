use std::io;

use thiserror::Error;

/// Failures surfaced by the daily view pipeline.
///
/// Only some of these abort a run: page fetch, parse, credential and
/// filesystem errors propagate, while per-field translation and per-asset
/// failures are caught where they happen and logged.
#[derive(Debug, Error)]
pub enum Error {
    #[error("page could not be parsed: {0}")]
    Malformed(String),
    #[error("{0} must be set for this step")]
    MissingCredential(&'static str),
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("unexpected response from {service}: {details}")]
    Response {
        service: &'static str,
        details: String,
    },
    #[error("mandala payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn http(url: &str, source: reqwest::Error) -> Self {
        Error::Http {
            url: url.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
