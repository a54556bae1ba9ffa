//! ZIP package access

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;
use zip::result::ZipError;
use zip::ZipArchive;

use super::props::parse_properties;
use super::xml::attr_value;
use crate::document::{DocumentError, DocumentMetadata, DocumentResult};

/// An opened OOXML package held in memory
pub(crate) struct OoxmlPackage {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl OoxmlPackage {
    pub fn open(data: Vec<u8>) -> DocumentResult<Self> {
        let archive = ZipArchive::new(Cursor::new(data))?;
        Ok(Self { archive })
    }

    /// Read a required part as UTF-8 text
    pub fn read_part(&mut self, name: &str) -> DocumentResult<String> {
        self.read_optional_part(name)?
            .ok_or_else(|| DocumentError::ParseFailure(format!("missing package part {}", name)))
    }

    /// Read a part that may legitimately be absent
    pub fn read_optional_part(&mut self, name: &str) -> DocumentResult<Option<String>> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut text = String::new();
        file.read_to_string(&mut text).map_err(|e| {
            DocumentError::ParseFailure(format!("failed to read part {}: {}", name, e))
        })?;
        Ok(Some(text))
    }

    pub fn part_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// Relationship id -> absolute part name for the given source part
    ///
    /// External targets (hyperlinks) are skipped.
    pub fn relationships(&mut self, part: &str) -> DocumentResult<HashMap<String, String>> {
        let (dir, file) = match part.rsplit_once('/') {
            Some((dir, file)) => (dir, file),
            None => ("", part),
        };
        let rels_name = if dir.is_empty() {
            format!("_rels/{}.rels", file)
        } else {
            format!("{}/_rels/{}.rels", dir, file)
        };

        let Some(xml) = self.read_optional_part(&rels_name)? else {
            return Ok(HashMap::new());
        };

        let mut rels = HashMap::new();
        let mut reader = Reader::from_str(&xml);
        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                    if attr_value(&e, b"TargetMode").as_deref() == Some("External") {
                        continue;
                    }
                    if let (Some(id), Some(target)) = (attr_value(&e, b"Id"), attr_value(&e, b"Target")) {
                        rels.insert(id, resolve_target(dir, &target));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(rels)
    }

    /// Core and extended document properties
    ///
    /// Properties are optional in a package; malformed ones are logged and
    /// treated as absent.
    pub fn metadata(&mut self) -> DocumentMetadata {
        let core = self.read_optional_part("docProps/core.xml").ok().flatten();
        let app = self.read_optional_part("docProps/app.xml").ok().flatten();

        parse_properties(core.as_deref(), app.as_deref()).unwrap_or_else(|e| {
            warn!("Ignoring unreadable document properties: {}", e);
            DocumentMetadata::default()
        })
    }
}

/// Resolve a relationship target against the source part's directory
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
