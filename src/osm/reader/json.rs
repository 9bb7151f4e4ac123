// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::io;

use serde::Deserialize;

use super::{Element, Error};

/// Top-level object of an [Overpass JSON](https://wiki.openstreetmap.org/wiki/OSM_JSON) response.
#[derive(Debug, Deserialize)]
struct Response {
    elements: Vec<Element>,

    /// Overpass reports problems with the query (like timeouts or exceeded
    /// memory limits) in this field, while still responding with HTTP 200.
    #[serde(default)]
    remark: Option<String>,
}

impl Response {
    fn into_elements(self) -> Result<Vec<Element>, Error> {
        super::check_remark(self.elements, self.remark)
    }
}

pub(super) fn elements_from_io<R: io::BufRead>(reader: R) -> Result<Vec<Element>, Error> {
    let response: Response = serde_json::from_reader(reader)?;
    response.into_elements()
}

pub(super) fn elements_from_buffer(data: &[u8]) -> Result<Vec<Element>, Error> {
    let response: Response = serde_json::from_slice(data)?;
    response.into_elements()
}
