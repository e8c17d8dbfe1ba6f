//! Lexical block scanner
//!
//! Finds keyword-introduced, brace-delimited blocks (`function foo(..) { .. }`,
//! `rule bar { .. }`, `methods { .. }`) in Solidity and CVL text without a grammar.
//! Keywords and delimiters are matched on a copy of the text with comments and
//! string contents masked, so neither ever opens a block. Spans and block
//! text always refer to the original.

use regex::Regex;

/// How a block's extent is decided once its keyword has been found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEnd {
    /// From the first `{`, until nesting depth returns to zero
    Balanced,
    /// Until the first `;` at depth zero, or the last of a run of top-level brace groups
    Statement,
}

/// A block located in a text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Identifier after the keyword (empty for `methods {`)
    pub name: String,
    /// Byte offset of the keyword
    pub start: usize,
    /// Byte offset one past the last byte of the block
    pub end: usize,
    /// 1-based line of the keyword
    pub start_line: usize,
    /// 1-based line of the last byte
    pub end_line: usize,
    /// Original text of the block
    pub text: String,
    /// False when delimiters never balanced and the span ran to end-of-text
    pub terminated: bool,
}

impl Block {
    pub fn lines(&self) -> Vec<String> {
        self.text.lines().map(String::from).collect()
    }
}

/// Scanner for one keyword
#[derive(Debug, Clone)]
pub struct BlockScanner {
    keyword: String,
    pattern: Regex,
    mode: BlockEnd,
}

impl BlockScanner {
    pub fn new(keyword: &str, mode: BlockEnd) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"\b{}\b\s*([A-Za-z0-9_]*)",
            regex::escape(keyword)
        ))?;
        Ok(BlockScanner {
            keyword: keyword.to_string(),
            pattern,
            mode,
        })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Scan `text` for every block introduced by this scanner's keyword
    pub fn scan(&self, text: &str) -> Vec<Block> {
        let masked = mask_non_code(text);
        let bytes = masked.as_bytes();
        let mut blocks = Vec::new();

        for caps in self.pattern.captures_iter(&masked) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();

            let found = match self.mode {
                BlockEnd::Balanced => balanced_end(bytes, whole.end()),
                BlockEnd::Statement => statement_end(bytes, whole.end()),
            };
            let Some((end, terminated)) = found else {
                continue;
            };
            if !terminated {
                log::debug!(
                    "unbalanced delimiters after `{} {}` (line {}), span runs to end of text",
                    self.keyword,
                    name,
                    line_of(bytes, whole.start())
                );
            }

            let start = whole.start();
            blocks.push(Block {
                name: name.to_string(),
                start,
                end,
                start_line: line_of(bytes, start),
                end_line: line_of(bytes, end.saturating_sub(1).max(start)),
                text: text.get(start..end).unwrap_or_default().to_string(),
                terminated,
            });
        }

        blocks
    }
}

/// Scan `text` for balanced `<keyword> <identifier> ... { ... }` blocks
pub fn scan_blocks(text: &str, keyword: &str) -> Result<Vec<Block>, regex::Error> {
    Ok(BlockScanner::new(keyword, BlockEnd::Balanced)?.scan(text))
}

/// 1-based line number of a byte offset
pub fn line_of(bytes: &[u8], offset: usize) -> usize {
    let offset = offset.min(bytes.len());
    bytes[..offset].iter().filter(|&&b| b == b'\n').count() + 1
}

/// Locate the end of a balanced block whose header starts at `from`.
///
/// Returns `None` for bodiless declarations (a `;` before any `{`) and when no
/// `{` follows at all.
fn balanced_end(bytes: &[u8], from: usize) -> Option<(usize, bool)> {
    let open = body_open(bytes, from)?;
    Some(match matching_close(bytes, open) {
        Some(close) => (close + 1, true),
        None => (bytes.len(), false),
    })
}

/// Position of the `{` that opens the body. A `filtered { .. }` clause is part
/// of the header, so its group is skipped.
fn body_open(bytes: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b';' => return None,
            b'{' => {
                if header_ends_with(&bytes[from..i], b"filtered") {
                    match matching_close(bytes, i) {
                        Some(close) => {
                            i = close + 1;
                            continue;
                        }
                        None => return Some(i),
                    }
                }
                return Some(i);
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn header_ends_with(header: &[u8], word: &[u8]) -> bool {
    let trimmed = header.trim_ascii_end();
    if !trimmed.ends_with(word) {
        return false;
    }
    let before = trimmed.len() - word.len();
    before == 0 || !is_ident_byte(trimmed[before - 1])
}

/// Index of the `}` closing the `{` at `open`, if the text balances
fn matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extent of a CVL invariant: `invariant name(args) expr;` or
/// `invariant name(args) expr filtered { .. } { preserved { .. } }`.
fn statement_end(bytes: &[u8], from: usize) -> Option<(usize, bool)> {
    let mut depth = 0usize;
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'{' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && !continues_with_group(bytes, i + 1) {
                    return Some((i + 1, true));
                }
            }
            b';' if depth == 0 => return Some((i + 1, true)),
            _ => {}
        }
        i += 1;
    }
    Some((bytes.len(), false))
}

fn continues_with_group(bytes: &[u8], at: usize) -> bool {
    let rest = bytes.get(at..).unwrap_or_default().trim_ascii_start();
    rest.starts_with(b"{")
        || (rest.starts_with(b"filtered")
            && !rest.get(b"filtered".len()).copied().is_some_and(is_ident_byte))
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Blank out comments and string-literal contents with spaces, keeping byte
/// offsets and newlines intact. Quote characters stay so `"http://..."` is not
/// read as a comment and `"rule x {"` never opens a block.
pub fn mask_non_code(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = bytes.to_vec();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'"' | b'\'') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote && bytes[i] != b'\n' {
                    let len = if bytes[i] == b'\\' { 2 } else { 1 };
                    for byte in out.iter_mut().skip(i).take(len) {
                        if *byte != b'\n' {
                            *byte = b' ';
                        }
                    }
                    i += len;
                }
                i += 1;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    out[i] = b' ';
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let close = text[i + 2..].find("*/").map(|p| i + 2 + p + 2);
                let stop = close.unwrap_or(bytes.len());
                for (j, byte) in out.iter_mut().enumerate().take(stop).skip(i) {
                    if bytes[j] != b'\n' {
                        *byte = b' ';
                    }
                }
                i = stop;
            }
            _ => i += 1,
        }
    }

    String::from_utf8(out).unwrap_or_else(|_| text.to_string())
}

/// Whole-identifier occurrence of `word` in `text`
pub fn contains_word(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let is_ident = |c: char| c.is_alphanumeric() || c == '_';
    text.match_indices(word).any(|(pos, _)| {
        let before_ok = text[..pos].chars().next_back().map_or(true, |c| !is_ident(c));
        let after_ok = text[pos + word.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_ident(c));
        before_ok && after_ok
    })
}
