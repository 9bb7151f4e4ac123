// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Error conditions which may occur when fetching or reading road data.
///
/// A failure always discards the whole response; partial graphs are never built.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request to the road data provider failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("road data provider responded with {0}")]
    Status(reqwest::StatusCode),

    #[error("road data provider reported an error: {0}")]
    Remark(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid or missing {attribute:?} attribute of an XML <{element}>")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unrecognized road data format")]
    UnknownFormat,
}
