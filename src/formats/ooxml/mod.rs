//! Shared OOXML plumbing
//!
//! Word, Excel and PowerPoint files are ZIP packages of XML parts linked by
//! relationship files. The format parsers only differ in which parts they
//! read and how they walk them.

mod package;
mod props;
mod xml;

pub(crate) use package::OoxmlPackage;
pub(crate) use xml::{attr_value, collect_paragraphs, relationship_id};

#[cfg(test)]
pub(crate) mod fixtures;
