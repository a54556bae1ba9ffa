//! docProps/core.xml and docProps/app.xml

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::document::{DocumentMetadata, DocumentResult};

/// (local name, text) for every leaf element carrying text
fn leaf_values(xml: &str) -> DocumentResult<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    let mut values = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                current = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::Text(t) => {
                if let Some(name) = &current {
                    let text = t.unescape()?.trim().to_string();
                    if !text.is_empty() {
                        values.push((name.clone(), text));
                    }
                }
            }
            Event::End(_) => current = None,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(values)
}

pub(crate) fn parse_properties(
    core: Option<&str>,
    app: Option<&str>,
) -> DocumentResult<DocumentMetadata> {
    let mut metadata = DocumentMetadata::default();

    if let Some(core) = core {
        for (name, value) in leaf_values(core)? {
            let slot = match name.as_str() {
                "title" => &mut metadata.title,
                "creator" => &mut metadata.author,
                "subject" => &mut metadata.subject,
                "keywords" => &mut metadata.keywords,
                "description" => &mut metadata.description,
                "lastModifiedBy" => &mut metadata.last_modified_by,
                "created" => &mut metadata.created,
                "modified" => &mut metadata.modified,
                _ => continue,
            };
            *slot = Some(value);
        }
    }

    if let Some(app) = app {
        for (name, value) in leaf_values(app)? {
            match name.as_str() {
                "Application" => metadata.application = Some(value),
                "Pages" => metadata.page_count = value.parse().ok(),
                _ => {}
            }
        }
    }

    Ok(metadata)
}
