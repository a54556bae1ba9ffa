//! Event-level helpers over quick-xml

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::document::DocumentResult;

/// Value of the attribute with the given local name
pub(crate) fn attr_value(element: &BytesStart, local_name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == local_name)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// The namespaced `r:id` attribute linking an element to a relationship
///
/// Matched on prefix presence since the same element may also carry an
/// unprefixed numeric `id`.
pub(crate) fn relationship_id(element: &BytesStart) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.prefix().is_some() && attr.key.local_name().as_ref() == b"id")
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// Collect the text of every `p` paragraph whose runs hold `t` elements
///
/// Works for both WordprocessingML (`w:p`/`w:t`) and DrawingML (`a:p`/`a:t`).
/// Nested paragraphs (text boxes) are emitted on their own, before the
/// paragraph containing them. Blank paragraphs are dropped.
pub(crate) fn collect_paragraphs(xml: &str) -> DocumentResult<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<String> = Vec::new();
    let mut paragraphs = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => stack.push(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => {
                if let Some(current) = stack.last_mut() {
                    match e.local_name().as_ref() {
                        b"tab" => current.push('\t'),
                        b"br" | b"cr" => current.push('\n'),
                        _ => {}
                    }
                }
            }
            Event::Text(t) if in_text => {
                if let Some(current) = stack.last_mut() {
                    current.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) if in_text => {
                if let Some(current) = stack.last_mut() {
                    current.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if let Some(paragraph) = stack.pop() {
                        let trimmed = paragraph.trim();
                        if !trimmed.is_empty() {
                            paragraphs.push(trimmed.to_string());
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}
