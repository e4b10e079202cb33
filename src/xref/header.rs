//! Document header detection and `:docid:` extraction.
//!
//! The header is found with a three-state scan:
//!
//! ```text
//! BeforeHeader ──(title or attribute line)──► InHeader ──(blank or `=` line)──► Done
//! ```
//!
//! The line that enters the header belongs to it; the line that ends it does
//! not. A document starting with an attribute line followed by a blank line
//! therefore ends its header before the title, and any `:docid:` after that
//! title is not seen.

use regex::Regex;
use std::sync::LazyLock;

/// `= Title` style document or section title.
static TITLE_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^=+\s+\S").unwrap());

/// `:name: value` attribute entry.
static ATTRIBUTE_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^:[\w-]+!?:").unwrap());

static DOCID_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^:docid:\s*(.*?)\s*$").unwrap());

/// Shortest and longest accepted docid, in characters.
pub const DOCID_MIN_LEN: usize = 2;
pub const DOCID_MAX_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    BeforeHeader,
    InHeader,
    Done,
}

/// Iterator over the header lines of a document.
pub struct HeaderLines<'a> {
    lines: std::str::Lines<'a>,
    state: State,
}

impl<'a> Iterator for HeaderLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.state == State::Done {
                return None;
            }
            let line = self.lines.next()?;
            match self.state {
                State::BeforeHeader => {
                    if TITLE_LINE.is_match(line) || ATTRIBUTE_LINE.is_match(line) {
                        self.state = State::InHeader;
                        return Some(line);
                    }
                }
                State::InHeader => {
                    if line.trim().is_empty() || line.starts_with('=') {
                        self.state = State::Done;
                        return None;
                    }
                    return Some(line);
                }
                State::Done => return None,
            }
        }
    }
}

pub fn header_lines(text: &str) -> HeaderLines<'_> {
    HeaderLines {
        lines: text.lines(),
        state: State::BeforeHeader,
    }
}

/// Value of the first `:docid:` entry in the header, unvalidated.
pub fn find_docid(text: &str) -> Option<&str> {
    header_lines(text).find_map(|line| {
        DOCID_LINE
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    })
}

/// Why a docid was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidDocId {
    Length(usize),
    ContainsHash,
}

impl std::fmt::Display for InvalidDocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Length(len) => write!(
                f,
                "length {len} outside {DOCID_MIN_LEN}..={DOCID_MAX_LEN} characters"
            ),
            Self::ContainsHash => f.write_str("contains `#`"),
        }
    }
}

pub fn validate_docid(id: &str) -> Result<(), InvalidDocId> {
    let len = id.chars().count();
    if !(DOCID_MIN_LEN..=DOCID_MAX_LEN).contains(&len) {
        return Err(InvalidDocId::Length(len));
    }
    if id.contains('#') {
        return Err(InvalidDocId::ContainsHash);
    }
    Ok(())
}
