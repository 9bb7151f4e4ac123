// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::{Element, Error, OutputFormat};

mod json;
mod xml;

/// Format of saved road data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the content
    #[default]
    Unknown,

    /// Force uncompressed [Overpass JSON](https://wiki.openstreetmap.org/wiki/OSM_JSON)
    Json,

    /// Force [Overpass JSON](https://wiki.openstreetmap.org/wiki/OSM_JSON)
    /// with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    JsonGz,

    /// Force [Overpass JSON](https://wiki.openstreetmap.org/wiki/OSM_JSON)
    /// with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    JsonBz2,

    /// Force uncompressed [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    Xml,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    XmlGz,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    XmlBz2,
}

impl From<OutputFormat> for FileFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Json => Self::Json,
            OutputFormat::Xml => Self::Xml,
        }
    }
}

/// What the first bytes of some data look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Magic {
    Gzip,
    Bzip2,
    Json,
    Xml,
}

impl Magic {
    fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x1F, 0x8B]) {
            return Some(Self::Gzip);
        } else if data.starts_with(b"BZh") {
            return Some(Self::Bzip2);
        }

        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        match data.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(&b'{') => Some(Self::Json),
            Some(&b'<') => Some(Self::Xml),
            _ => None,
        }
    }
}

/// Applies an Overpass `remark` to a parsed response. Overpass reports runtime errors
/// (like timeouts or exceeded memory limits) in a remark, while still responding with
/// HTTP 200 and a truncated set of records. Such responses are rejected as a whole.
fn check_remark(elements: Vec<Element>, remark: Option<String>) -> Result<Vec<Element>, Error> {
    match remark {
        Some(remark) if remark.contains("error") => Err(Error::Remark(remark)),
        Some(remark) => {
            log::warn!("road data provider remark: {remark}");
            Ok(elements)
        }
        None => Ok(elements),
    }
}

/// Parse road-data records from a reader, as per the provided [FileFormat].
///
/// Records are returned in the order they appear in the input.
/// The provided stream will be automatically wrapped in a buffered reader when needed.
pub fn elements_from_io<R: io::Read>(format: FileFormat, mut reader: R) -> Result<Vec<Element>, Error> {
    match format {
        FileFormat::Unknown => {
            let mut data = Vec::default();
            reader.read_to_end(&mut data)?;
            elements_from_buffer(FileFormat::Unknown, &data)
        }

        FileFormat::Json => json::elements_from_io(io::BufReader::new(reader)),

        FileFormat::JsonGz => {
            let d = flate2::read::MultiGzDecoder::new(reader);
            json::elements_from_io(io::BufReader::new(d))
        }

        FileFormat::JsonBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(reader);
            json::elements_from_io(io::BufReader::new(d))
        }

        FileFormat::Xml => xml::elements_from_io(io::BufReader::new(reader)),

        FileFormat::XmlGz => {
            let d = flate2::read::MultiGzDecoder::new(reader);
            xml::elements_from_io(io::BufReader::new(d))
        }

        FileFormat::XmlBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(reader);
            xml::elements_from_io(io::BufReader::new(d))
        }
    }
}

/// Parse road-data records from a file at the provided path, as per the provided [FileFormat].
pub fn elements_from_file<P: AsRef<Path>>(format: FileFormat, path: P) -> Result<Vec<Element>, Error> {
    let f = File::open(path)?;
    elements_from_io(format, f)
}

/// Parse road-data records from an in-memory buffer, as per the provided [FileFormat].
pub fn elements_from_buffer(format: FileFormat, data: &[u8]) -> Result<Vec<Element>, Error> {
    match format {
        FileFormat::Unknown => match Magic::sniff(data) {
            Some(Magic::Json) => json::elements_from_buffer(data),
            Some(Magic::Xml) => xml::elements_from_io(data),
            Some(Magic::Gzip) => {
                let mut decompressed = Vec::default();
                flate2::read::MultiGzDecoder::new(data).read_to_end(&mut decompressed)?;
                elements_from_buffer(FileFormat::Unknown, &decompressed)
            }
            Some(Magic::Bzip2) => {
                let mut decompressed = Vec::default();
                bzip2::read::MultiBzDecoder::new(data).read_to_end(&mut decompressed)?;
                elements_from_buffer(FileFormat::Unknown, &decompressed)
            }
            None => Err(Error::UnknownFormat),
        },

        // Fast paths are available for in-memory uncompressed data
        FileFormat::Json => json::elements_from_buffer(data),
        FileFormat::Xml => xml::elements_from_io(data),

        _ => elements_from_io(format, data),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SIMPLE_JSON: &[u8] = include_bytes!("test_fixtures/simple.json");
    const SIMPLE_JSON_GZ: &[u8] = include_bytes!("test_fixtures/simple.json.gz");
    const SIMPLE_XML: &[u8] = include_bytes!("test_fixtures/simple.osm");
    const SIMPLE_XML_BZ2: &[u8] = include_bytes!("test_fixtures/simple.osm.bz2");

    macro_rules! tags {
        {$( $k:literal : $v:literal ),+} => {
            HashMap::from_iter([ $( ($k.to_string(), $v.to_string()) ),+ ])
        };
    }

    fn expected_elements() -> Vec<Element> {
        vec![
            Element::Way {
                id: 10,
                nodes: vec![1, 2, 3],
                tags: tags! {"highway": "residential", "name": "Lake Road"},
            },
            Element::Way {
                id: 11,
                nodes: vec![2, 4, 5],
                tags: tags! {"highway": "service"},
            },
            Element::Way {
                id: 12,
                nodes: vec![4, 6],
                tags: tags! {"highway": "footway"},
            },
            Element::Way {
                id: 13,
                nodes: vec![3, 5],
                tags: tags! {"highway": "tertiary", "footway": "sidewalk"},
            },
            Element::Way {
                id: 14,
                nodes: vec![5, 99],
                tags: tags! {"highway": "residential"},
            },
            Element::node(1, 22.5726, 88.4344),
            Element::node(2, 22.5726, 88.4354),
            Element::node(3, 22.5726, 88.4364),
            Element::node(4, 22.5736, 88.4354),
            Element::node(5, 22.5736, 88.4364),
            Element::node(6, 22.5746, 88.4354),
        ]
    }

    #[test]
    fn json() {
        let elements = elements_from_buffer(FileFormat::Json, SIMPLE_JSON).unwrap();
        assert_eq!(elements, expected_elements());
    }

    #[test]
    fn json_from_io() {
        let elements = elements_from_io(FileFormat::Json, io::Cursor::new(SIMPLE_JSON)).unwrap();
        assert_eq!(elements, expected_elements());
    }

    #[test]
    fn json_gz() {
        let elements = elements_from_buffer(FileFormat::JsonGz, SIMPLE_JSON_GZ).unwrap();
        assert_eq!(elements, expected_elements());
    }

    #[test]
    fn xml() {
        let elements = elements_from_buffer(FileFormat::Xml, SIMPLE_XML).unwrap();
        assert_eq!(elements, expected_elements());
    }

    #[test]
    fn xml_bz2_from_io() {
        let elements =
            elements_from_io(FileFormat::XmlBz2, io::Cursor::new(SIMPLE_XML_BZ2)).unwrap();
        assert_eq!(elements, expected_elements());
    }

    #[test]
    fn unknown_format_is_detected() {
        for data in [SIMPLE_JSON, SIMPLE_JSON_GZ, SIMPLE_XML, SIMPLE_XML_BZ2] {
            let elements = elements_from_buffer(FileFormat::Unknown, data).unwrap();
            assert_eq!(elements, expected_elements());

            let elements = elements_from_io(FileFormat::Unknown, io::Cursor::new(data)).unwrap();
            assert_eq!(elements, expected_elements());
        }
    }

    #[test]
    fn unrecognized_data() {
        assert!(matches!(
            elements_from_buffer(FileFormat::Unknown, b"node,1,2,3"),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(
            elements_from_buffer(FileFormat::Json, br#"{"elements": [{"type": "node", "id": 1}]}"#),
            Err(Error::Json(_))
        ));
    }
}
