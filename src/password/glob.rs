//! Glob patterns for password registrations
//!
//! Compiles shell-style globs to anchored, case-insensitive regexes over
//! normalized path keys:
//!
//! - `*` matches any run of characters except `/`
//! - `**` matches across separators (`**/` also matches zero directories)
//! - `?` matches exactly one character except `/`
//! - `[abc]`, `[a-z]`, `[!abc]` match one character from / outside a set
//!
//! A pattern that is not absolute may match starting at any directory
//! boundary, so `*.secret.docx` matches `/any/dir/report.secret.docx`.

use regex::Regex;
use thiserror::Error;

/// Pattern compilation failure
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,

    #[error("unclosed character class in pattern '{0}'")]
    UnclosedClass(String),

    #[error("pattern '{pattern}' does not compile: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled glob pattern
#[derive(Debug, Clone)]
pub struct GlobPattern {
    glob: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compile a glob
    pub fn compile(glob: &str) -> Result<Self, PatternError> {
        let text = glob.trim().replace('\\', "/").to_lowercase();
        if text.is_empty() {
            return Err(PatternError::Empty);
        }

        let mut re = String::with_capacity(text.len() * 2 + 16);
        re.push_str("(?i)^");
        if !is_absolute(&text) {
            re.push_str("(?:.*/)?");
        }

        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            match chars[i] {
                '*' if chars.get(i + 1) == Some(&'*') => {
                    if chars.get(i + 2) == Some(&'/') {
                        re.push_str("(?:.*/)?");
                        i += 3;
                    } else {
                        re.push_str(".*");
                        i += 2;
                    }
                    continue;
                }
                '*' => re.push_str("[^/]*"),
                '?' => re.push_str("[^/]"),
                '[' => {
                    let close = chars[i + 1..]
                        .iter()
                        .position(|&c| c == ']')
                        .filter(|&len| len > 0)
                        .ok_or_else(|| PatternError::UnclosedClass(glob.to_string()))?;
                    push_class(&mut re, &chars[i + 1..i + 1 + close]);
                    i += close + 2;
                    continue;
                }
                c => {
                    let mut buf = [0u8; 4];
                    re.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                }
            }
            i += 1;
        }
        re.push('$');

        let regex = Regex::new(&re).map_err(|source| PatternError::Regex {
            pattern: glob.to_string(),
            source,
        })?;

        Ok(Self {
            glob: glob.to_string(),
            regex,
        })
    }

    /// The glob text as registered
    pub fn as_str(&self) -> &str {
        &self.glob
    }

    /// Test a normalized path key
    pub fn is_match(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}

/// Whether text contains glob metacharacters
pub fn is_glob(text: &str) -> bool {
    text.contains(['*', '?', '['])
}

/// Escape literal text (e.g. a directory path) for use inside a glob
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '*' | '?' | '[' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            c => out.push(c),
        }
    }
    out
}

fn is_absolute(text: &str) -> bool {
    let bytes = text.as_bytes();
    text.starts_with('/') || (bytes.len() >= 2 && bytes[1] == b':')
}

fn push_class(re: &mut String, body: &[char]) {
    let (negated, body) = match body.first() {
        Some('!') | Some('^') if body.len() > 1 => (true, &body[1..]),
        _ => (false, body),
    };

    re.push('[');
    if negated {
        re.push_str("^/");
    }
    for &c in body {
        if matches!(c, '\\' | '[' | ']' | '^' | '&' | '~') {
            re.push('\\');
        }
        re.push(c);
    }
    re.push(']');
}
