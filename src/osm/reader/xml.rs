// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::io;
use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};

use super::{Element, Error};

/// Reads all nodes and ways from an [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML) stream,
/// as returned by Overpass with `[out:xml]`.
///
/// Records are held to the same rules as in the JSON format: nodes need an id and a position,
/// and a `<remark>` reporting an error rejects the whole document.
pub(super) fn elements_from_io<R: io::BufRead>(reader: R) -> Result<Vec<Element>, Error> {
    let mut r = Reader::new(reader);
    let elements = r.by_ref().collect::<Result<Vec<_>, _>>()?;
    super::check_remark(elements, r.remark)
}

/// Reader streams [Elements](Element) from an XML document.
struct Reader<R: io::BufRead> {
    xml: quick_xml::Reader<R>,
    buf: Vec<u8>,
    eof: bool,
    in_remark: bool,
    remark: Option<String>,
}

impl<R: io::BufRead> Reader<R> {
    fn new(reader: R) -> Self {
        Self {
            xml: quick_xml::Reader::from_reader(reader),
            buf: Vec::default(),
            eof: false,
            in_remark: false,
            remark: None,
        }
    }

    fn next_element(&mut self) -> Result<Option<Element>, Error> {
        let mut current: Option<Element> = None;

        while !self.eof {
            self.buf.clear();
            match self.xml.read_event_into(&mut self.buf)? {
                Event::Empty(start) => match start.local_name().as_ref() {
                    b"node" => return parse_node(&start).map(Some),
                    b"way" => return parse_way(&start).map(Some),
                    b"nd" => {
                        if let Some(Element::Way { nodes, .. }) = current.as_mut() {
                            nodes.push(required(&start, "nd", "ref")?);
                        }
                    }
                    b"tag" => {
                        if let Some(Element::Way { tags, .. }) = current.as_mut() {
                            let (k, v) = parse_tag(&start)?;
                            tags.insert(k, v);
                        }
                    }
                    _ => {}
                },

                Event::Start(start) => match start.local_name().as_ref() {
                    b"node" => current = Some(parse_node(&start)?),
                    b"way" => current = Some(parse_way(&start)?),
                    b"remark" => {
                        self.in_remark = true;
                        self.remark.get_or_insert_with(String::new);
                    }
                    _ => {}
                },

                Event::Text(text) if self.in_remark => {
                    if let Some(remark) = self.remark.as_mut() {
                        remark.push_str(text.unescape()?.trim());
                    }
                }

                Event::End(end) => match end.local_name().as_ref() {
                    b"node" | b"way" => {
                        if current.is_some() {
                            return Ok(current);
                        }
                    }
                    b"remark" => self.in_remark = false,
                    _ => {}
                },

                Event::Eof => self.eof = true,

                _ => {}
            }
        }

        Ok(current)
    }
}

impl<R: io::BufRead> Iterator for Reader<R> {
    type Item = Result<Element, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_element().transpose()
    }
}

/// Parses the value of the attribute with a given key. A missing attribute gives `Ok(None)`,
/// while a malformed attribute list or an unparsable value is an error.
fn optional<T: FromStr>(
    start: &BytesStart<'_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<Option<T>, Error> {
    for a in start.attributes() {
        let a = a.map_err(quick_xml::Error::from)?;
        if a.key.as_ref() == attribute.as_bytes() {
            return a
                .unescape_value()?
                .parse()
                .map(Some)
                .map_err(|_| Error::InvalidAttribute { element, attribute });
        }
    }
    Ok(None)
}

fn required<T: FromStr>(
    start: &BytesStart<'_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<T, Error> {
    optional(start, element, attribute)?.ok_or(Error::InvalidAttribute { element, attribute })
}

fn parse_node(start: &BytesStart<'_>) -> Result<Element, Error> {
    let id = required(start, "node", "id")?;
    let lat: f64 = required(start, "node", "lat")?;
    let lon: f64 = required(start, "node", "lon")?;

    if !lat.is_finite() {
        Err(Error::InvalidAttribute {
            element: "node",
            attribute: "lat",
        })
    } else if !lon.is_finite() {
        Err(Error::InvalidAttribute {
            element: "node",
            attribute: "lon",
        })
    } else {
        Ok(Element::node(id, lat, lon))
    }
}

fn parse_way(start: &BytesStart<'_>) -> Result<Element, Error> {
    Ok(Element::Way {
        id: optional(start, "way", "id")?.unwrap_or_default(),
        nodes: Vec::default(),
        tags: HashMap::default(),
    })
}

fn parse_tag(start: &BytesStart<'_>) -> Result<(String, String), Error> {
    let k = required(start, "tag", "k")?;
    let v = optional(start, "tag", "v")?.unwrap_or_default();
    Ok((k, v))
}
