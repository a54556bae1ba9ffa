//! Search and text statistics over parsed content
//!
//! Both work on located segments: one per PDF page, Word paragraph,
//! worksheet cell or slide paragraph, so every match can say where it was
//! found.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::types::{DocumentContent, DocumentType};

/// Characters of context kept on each side of a match
const CONTEXT_CHARS: usize = 40;
/// Results returned when the caller does not ask for a limit
pub const DEFAULT_MAX_RESULTS: usize = 50;
const TOP_WORDS: usize = 10;

/// A piece of text and where it lives in the document
#[derive(Debug, Clone)]
pub struct Segment<'a> {
    pub location: String,
    pub text: &'a str,
}

/// Located text units of a document
pub fn segments(content: &DocumentContent) -> Vec<Segment<'_>> {
    match content {
        DocumentContent::Pdf(c) => c
            .pages
            .iter()
            .enumerate()
            .map(|(i, text)| Segment {
                location: format!("page {}", i + 1),
                text,
            })
            .collect(),
        DocumentContent::Word(c) => c
            .paragraphs
            .iter()
            .enumerate()
            .map(|(i, text)| Segment {
                location: format!("paragraph {}", i + 1),
                text,
            })
            .collect(),
        DocumentContent::Excel(c) => c
            .sheets
            .iter()
            .flat_map(|sheet| {
                sheet.rows.iter().flat_map(move |row| {
                    row.cells.iter().map(move |cell| Segment {
                        location: format!("{}!{}", sheet.name, cell.reference),
                        text: &cell.value,
                    })
                })
            })
            .collect(),
        DocumentContent::PowerPoint(c) => c
            .slides
            .iter()
            .flat_map(|slide| {
                slide.paragraphs.iter().map(move |text| Segment {
                    location: format!("slide {}", slide.number),
                    text,
                })
            })
            .collect(),
    }
}

/// One search hit
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    pub location: String,
    /// Text as it appears in the document
    pub matched_text: String,
    pub context: String,
    /// Edit distance for fuzzy matches, 0 for exact ones
    pub distance: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub term: String,
    pub fuzzy: bool,
    /// Matches found before truncation
    pub total_matches: usize,
    pub truncated: bool,
    pub matches: Vec<SearchMatch>,
}

/// Search for a term
///
/// Exact search is a case-insensitive substring match. Fuzzy search
/// compares the term against every run of as many words as the term has,
/// allowing an edit distance of 1 for terms up to 5 characters and 2 beyond.
pub fn search(content: &DocumentContent, term: &str, fuzzy: bool, max_results: usize) -> SearchResults {
    let term = term.trim();
    let mut matches = Vec::new();

    if !term.is_empty() {
        for segment in segments(content) {
            if fuzzy {
                fuzzy_matches(&segment, term, &mut matches);
            } else {
                substring_matches(&segment, term, &mut matches);
            }
        }
    }

    let total_matches = matches.len();
    matches.truncate(max_results);

    SearchResults {
        term: term.to_string(),
        fuzzy,
        total_matches,
        truncated: total_matches > max_results,
        matches,
    }
}

fn substring_matches(segment: &Segment<'_>, term: &str, out: &mut Vec<SearchMatch>) {
    let needle = term.to_lowercase();
    let folded = FoldedText::new(segment.text);

    let mut from = 0;
    while let Some(offset) = folded.lower[from..].find(&needle) {
        let start = from + offset;
        let end = start + needle.len();
        let (orig_start, orig_end) = folded.original_span(start, end);
        out.push(SearchMatch {
            location: segment.location.clone(),
            matched_text: segment.text[orig_start..orig_end].to_string(),
            context: context(segment.text, orig_start, orig_end),
            distance: 0,
        });
        from = end;
    }
}

/// Lowercased text with a map back to the original byte offsets
///
/// Case folding changes byte lengths per char (and can expand one char into
/// several), so offsets found in `lower` are translated char by char.
struct FoldedText {
    lower: String,
    /// `(lower_start, original_start, original_end)` per lowercased char
    spans: Vec<(usize, usize, usize)>,
}

impl FoldedText {
    fn new(text: &str) -> Self {
        let mut lower = String::with_capacity(text.len());
        let mut spans = Vec::with_capacity(text.len());
        for (index, c) in text.char_indices() {
            let original_end = index + c.len_utf8();
            for folded in c.to_lowercase() {
                spans.push((lower.len(), index, original_end));
                lower.push(folded);
            }
        }
        Self { lower, spans }
    }

    /// Original span covering every char touched by `lower[start..end]`
    fn original_span(&self, start: usize, end: usize) -> (usize, usize) {
        let first = self.span_at(start);
        let last = self.span_at(end.saturating_sub(1).max(start));
        (first.1, last.2)
    }

    fn span_at(&self, lower_offset: usize) -> (usize, usize, usize) {
        let index = self
            .spans
            .partition_point(|span| span.0 <= lower_offset)
            .saturating_sub(1);
        self.spans.get(index).copied().unwrap_or((0, 0, 0))
    }
}

fn fuzzy_matches(segment: &Segment<'_>, term: &str, out: &mut Vec<SearchMatch>) {
    let term_lower = term.to_lowercase();
    let term_words = term_lower.split_whitespace().count().max(1);
    let max_distance = if term_lower.chars().count() <= 5 { 1 } else { 2 };

    let words = word_spans(segment.text);
    if words.len() < term_words {
        return;
    }

    for window in words.windows(term_words) {
        let start = window[0].0;
        let end = window[term_words - 1].1;
        let candidate = window
            .iter()
            .map(|&(s, e)| segment.text[s..e].to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");

        let distance = levenshtein(&candidate, &term_lower);
        if distance <= max_distance {
            out.push(SearchMatch {
                location: segment.location.clone(),
                matched_text: segment.text[start..end].to_string(),
                context: context(segment.text, start, end),
                distance,
            });
        }
    }
}

/// Byte spans of alphanumeric words
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        let is_word = c.is_alphanumeric() || c == '\'';
        match (is_word, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

/// Surrounding text on char boundaries, whitespace collapsed
fn context(text: &str, start: usize, end: usize) -> String {
    let before = text[..start]
        .char_indices()
        .rev()
        .nth(CONTEXT_CHARS - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let after = text[end..]
        .char_indices()
        .nth(CONTEXT_CHARS)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());

    let mut snippet = text[before..after].split_whitespace().collect::<Vec<_>>().join(" ");
    if before > 0 {
        snippet.insert_str(0, "...");
    }
    if after < text.len() {
        snippet.push_str("...");
    }
    snippet
}

/// Edit distance over chars (two-row dynamic programming)
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[derive(Debug, Clone, Serialize)]
pub struct WordFrequency {
    pub word: String,
    pub count: usize,
}

/// Text statistics for a document
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnalysis {
    pub document_type: DocumentType,
    pub word_count: usize,
    pub character_count: usize,
    pub line_count: usize,
    pub unique_word_count: usize,
    pub average_word_length: f64,
    pub top_words: Vec<WordFrequency>,
    /// Type-specific structure counts (pages, sheets, cells, ...)
    pub structure: BTreeMap<String, usize>,
}

pub fn analyze(content: &DocumentContent) -> DocumentAnalysis {
    let text = content.plain_text();

    let mut frequencies: HashMap<String, usize> = HashMap::new();
    let mut word_count = 0;
    let mut word_chars = 0;
    for (start, end) in word_spans(&text) {
        let word = text[start..end].to_lowercase();
        word_count += 1;
        word_chars += word.chars().count();
        *frequencies.entry(word).or_default() += 1;
    }

    let mut top_words: Vec<WordFrequency> = frequencies
        .iter()
        .map(|(word, &count)| WordFrequency {
            word: word.clone(),
            count,
        })
        .collect();
    top_words.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    top_words.truncate(TOP_WORDS);

    let average_word_length = if word_count == 0 {
        0.0
    } else {
        ((word_chars as f64 / word_count as f64) * 100.0).round() / 100.0
    };

    DocumentAnalysis {
        document_type: content.document_type(),
        word_count,
        character_count: text.chars().count(),
        line_count: text.lines().filter(|line| !line.trim().is_empty()).count(),
        unique_word_count: frequencies.len(),
        average_word_length,
        top_words,
        structure: structure(content),
    }
}

fn structure(content: &DocumentContent) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    match content {
        DocumentContent::Pdf(c) => {
            counts.insert("pages".into(), c.pages.len());
            counts.insert(
                "emptyPages".into(),
                c.pages.iter().filter(|p| p.trim().is_empty()).count(),
            );
        }
        DocumentContent::Word(c) => {
            counts.insert("paragraphs".into(), c.paragraphs.len());
        }
        DocumentContent::Excel(c) => {
            counts.insert("sheets".into(), c.sheets.len());
            counts.insert("rows".into(), c.sheets.iter().map(|s| s.rows.len()).sum());
            counts.insert("cells".into(), c.cell_count());
        }
        DocumentContent::PowerPoint(c) => {
            counts.insert("slides".into(), c.slides.len());
            counts.insert(
                "paragraphs".into(),
                c.slides.iter().map(|s| s.paragraphs.len()).sum(),
            );
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::types::{
        Cell, PdfContent, PresentationContent, Row, Sheet, Slide, WordContent, WorkbookContent,
    };

    fn word(paragraphs: &[&str]) -> DocumentContent {
        DocumentContent::Word(WordContent {
            paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        })
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("budget", "budget"), 0);
        assert_eq!(levenshtein("budget", "budgte"), 2);
    }

    #[test]
    fn test_substring_search_with_length_changing_case_folds() {
        // Kelvin sign folds 3 -> 1 bytes, U+023A folds 2 -> 3 bytes
        let content = word(&["\u{212A}\u{023A}\u{023A} abc", "\u{0130}stanbul office"]);

        let results = search(&content, "\u{2C65}", false, 10);
        assert_eq!(results.total_matches, 2);
        assert_eq!(results.matches[0].matched_text, "\u{023A}");
        assert_eq!(results.matches[1].matched_text, "\u{023A}");
        assert_eq!(results.matches[0].context, "\u{212A}\u{023A}\u{023A} abc");

        let results = search(&content, "abc", false, 10);
        assert_eq!(results.matches[0].matched_text, "abc");

        let results = search(&content, "kⱥ", false, 10);
        assert_eq!(results.matches[0].matched_text, "\u{212A}\u{023A}");

        // U+0130 expands to two chars when lowercased
        let results = search(&content, "istanbul", false, 10);
        assert_eq!(results.total_matches, 0);
        let results = search(&content, "stanbul", false, 10);
        assert_eq!(results.matches[0].matched_text, "stanbul");
        assert_eq!(results.matches[0].location, "paragraph 2");
        let results = search(&content, "i", false, 10);
        assert_eq!(results.matches[0].matched_text, "\u{0130}");
    }

    #[test]
    fn test_substring_search_is_case_insensitive() {
        let content = word(&["Annual Budget review", "nothing here", "budget BUDGET"]);
        let results = search(&content, "budget", false, 10);

        assert_eq!(results.total_matches, 3);
        assert_eq!(results.matches[0].location, "paragraph 1");
        assert_eq!(results.matches[0].matched_text, "Budget");
        assert_eq!(results.matches[2].matched_text, "BUDGET");
        assert!(!results.truncated);
    }

    #[test]
    fn test_search_truncates_to_max_results() {
        let content = word(&["a a a a a"]);
        let results = search(&content, "a", false, 2);

        assert_eq!(results.total_matches, 5);
        assert_eq!(results.matches.len(), 2);
        assert!(results.truncated);
    }

    #[test]
    fn test_empty_term_matches_nothing() {
        let results = search(&word(&["text"]), "  ", false, 10);
        assert_eq!(results.total_matches, 0);
    }

    #[test]
    fn test_fuzzy_search_thresholds() {
        let content = word(&["The invoice was recieved on Monday"]);

        let long = search(&content, "received", true, 10);
        assert_eq!(long.total_matches, 1);
        assert_eq!(long.matches[0].matched_text, "recieved");
        assert_eq!(long.matches[0].distance, 2);

        // Short terms only tolerate one edit
        assert_eq!(search(&content, "mondy", true, 10).total_matches, 1);
        assert_eq!(search(&content, "wsa", true, 10).total_matches, 0);
    }

    #[test]
    fn test_fuzzy_multi_word_term() {
        let content = word(&["please review the anual report today"]);
        let results = search(&content, "annual report", true, 10);

        assert_eq!(results.total_matches, 1);
        assert_eq!(results.matches[0].matched_text, "anual report");
    }

    #[test]
    fn test_locations_per_format() {
        let pdf = DocumentContent::Pdf(PdfContent {
            pages: vec!["intro".into(), "the target".into()],
            ..Default::default()
        });
        assert_eq!(search(&pdf, "target", false, 10).matches[0].location, "page 2");

        let workbook = DocumentContent::Excel(WorkbookContent {
            sheets: vec![Sheet {
                name: "Q1".into(),
                rows: vec![Row {
                    number: 3,
                    cells: vec![Cell { reference: "C3".into(), value: "target".into() }],
                }],
            }],
            ..Default::default()
        });
        assert_eq!(search(&workbook, "target", false, 10).matches[0].location, "Q1!C3");

        let deck = DocumentContent::PowerPoint(PresentationContent {
            slides: vec![Slide { number: 4, paragraphs: vec!["a target".into()] }],
            ..Default::default()
        });
        assert_eq!(search(&deck, "target", false, 10).matches[0].location, "slide 4");
    }

    #[test]
    fn test_context_is_bounded() {
        let long = format!("{} needle {}", "x".repeat(100), "y".repeat(100));
        let results = search(&word(&[&long]), "needle", false, 10);
        let context = &results.matches[0].context;

        assert!(context.starts_with("..."));
        assert!(context.ends_with("..."));
        assert!(context.contains("needle"));
        assert!(context.chars().count() <= 6 + 6 + 2 * CONTEXT_CHARS + 2);
    }

    #[test]
    fn test_analyze_word_document() {
        let content = word(&["The cat and the hat", "The end"]);
        let analysis = analyze(&content);

        assert_eq!(analysis.word_count, 7);
        assert_eq!(analysis.unique_word_count, 5);
        assert_eq!(analysis.line_count, 2);
        assert_eq!(analysis.top_words[0].word, "the");
        assert_eq!(analysis.top_words[0].count, 3);
        assert_eq!(analysis.structure["paragraphs"], 2);
        assert_eq!(analysis.average_word_length, 3.0);
    }

    #[test]
    fn test_analyze_empty_document() {
        let analysis = analyze(&word(&[]));
        assert_eq!(analysis.word_count, 0);
        assert_eq!(analysis.average_word_length, 0.0);
        assert!(analysis.top_words.is_empty());
    }
}
