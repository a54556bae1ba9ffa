//! Word (WordprocessingML) parsing

use super::ooxml::{collect_paragraphs, OoxmlPackage};
use crate::document::{DocumentResult, WordContent};

const MAIN_PART: &str = "word/document.xml";

pub(crate) fn parse(data: Vec<u8>) -> DocumentResult<WordContent> {
    let mut package = OoxmlPackage::open(data)?;
    let xml = package.read_part(MAIN_PART)?;
    let paragraphs = collect_paragraphs(&xml)?;

    Ok(WordContent {
        paragraphs,
        metadata: package.metadata(),
    })
}
