//! PowerPoint (PresentationML) parsing

use quick_xml::events::Event;
use quick_xml::Reader;

use super::ooxml::{collect_paragraphs, relationship_id, OoxmlPackage};
use crate::document::{DocumentResult, PresentationContent, Slide};

const PRESENTATION_PART: &str = "ppt/presentation.xml";

pub(crate) fn parse(data: Vec<u8>) -> DocumentResult<PresentationContent> {
    let mut package = OoxmlPackage::open(data)?;

    let mut slides = Vec::new();
    for (index, part) in slide_parts(&mut package)?.into_iter().enumerate() {
        let xml = package.read_part(&part)?;
        slides.push(Slide {
            number: index + 1,
            paragraphs: collect_paragraphs(&xml)?,
        });
    }

    let mut metadata = package.metadata();
    // app.xml counts slides, not pages
    metadata.page_count = None;

    Ok(PresentationContent { slides, metadata })
}

/// Slide part names in presentation order
///
/// Follows `sldIdLst` when present, otherwise falls back to the numeric
/// order of `ppt/slides/slideN.xml` parts.
fn slide_parts(package: &mut OoxmlPackage) -> DocumentResult<Vec<String>> {
    if let Some(xml) = package.read_optional_part(PRESENTATION_PART)? {
        let rels = package.relationships(PRESENTATION_PART)?;
        let mut reader = Reader::from_str(&xml);
        let mut ordered = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sldId" => {
                    if let Some(part) = relationship_id(&e).and_then(|id| rels.get(&id).cloned()) {
                        ordered.push(part);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !ordered.is_empty() {
            return Ok(ordered);
        }
    }

    let mut numbered: Vec<(u32, String)> = package
        .part_names()
        .into_iter()
        .filter_map(|name| {
            let number = name
                .strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse()
                .ok()?;
            Some((number, name))
        })
        .collect();
    numbered.sort();
    Ok(numbered.into_iter().map(|(_, name)| name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::ooxml::fixtures::{build_package, pptx};

    #[test]
    fn test_slides_follow_presentation_order() {
        let content = parse(pptx()).unwrap();

        assert_eq!(content.slides.len(), 2);
        assert_eq!(content.slides[0].number, 1);
        assert_eq!(content.slides[0].paragraphs, vec!["Welcome", "Agenda for today"]);
        assert_eq!(content.slides[1].paragraphs[0], "Roadmap");
        assert_eq!(content.metadata.author.as_deref(), Some("Tester"));
    }

    #[test]
    fn test_fallback_to_part_numbering() {
        let slide = |text: &str| {
            format!(r#"<p:sld xmlns:p="p" xmlns:a="a"><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:sld>"#, text)
        };
        let (s2, s10) = (slide("two"), slide("ten"));
        let data = build_package(&[
            ("ppt/slides/slide10.xml", s10.as_str()),
            ("ppt/slides/slide2.xml", s2.as_str()),
            ("ppt/slides/_rels/slide2.xml.rels", "<Relationships/>"),
        ]);

        let content = parse(data).unwrap();
        let firsts: Vec<&str> = content.slides.iter().map(|s| s.paragraphs[0].as_str()).collect();
        assert_eq!(firsts, vec!["two", "ten"]);
    }
}
