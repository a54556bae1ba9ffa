//! PDF text and metadata extraction via MuPDF

use mupdf::{Document, MetadataName};

use crate::crypto::PdfGateway;
use crate::document::{DocumentMetadata, DocumentResult, PdfContent};

pub(crate) fn parse(data: &[u8], password: Option<&str>) -> DocumentResult<PdfContent> {
    let doc = PdfGateway::open_authenticated(data, password)?;
    extract(&doc)
}

/// Open once, pick a password knowing whether one is needed, then extract
///
/// Returns the content and whether the document was encrypted.
pub(crate) fn load<F>(data: &[u8], choose_password: F) -> DocumentResult<(PdfContent, bool)>
where
    F: FnOnce(bool) -> DocumentResult<Option<String>>,
{
    let mut doc = PdfGateway::open(data)?;
    let encrypted = doc.needs_password()?;
    let password = choose_password(encrypted)?;
    PdfGateway::authenticate(&mut doc, password.as_deref())?;
    Ok((extract(&doc)?, encrypted))
}

fn extract(doc: &Document) -> DocumentResult<PdfContent> {
    let page_count = doc.page_count()?;
    let mut pages = Vec::with_capacity(page_count.max(0) as usize);
    for index in 0..page_count {
        let page = doc.load_page(index)?;
        pages.push(page.to_text()?);
    }

    let get_meta = |name: MetadataName| -> Option<String> {
        doc.metadata(name).ok().filter(|s| !s.trim().is_empty())
    };

    let metadata = DocumentMetadata {
        title: get_meta(MetadataName::Title),
        author: get_meta(MetadataName::Author),
        subject: get_meta(MetadataName::Subject),
        keywords: get_meta(MetadataName::Keywords),
        application: get_meta(MetadataName::Creator).or_else(|| get_meta(MetadataName::Producer)),
        created: get_meta(MetadataName::CreationDate),
        modified: get_meta(MetadataName::ModDate),
        page_count: Some(pages.len()),
        ..Default::default()
    };

    Ok(PdfContent { pages, metadata })
}
