//! Text normalization
//!
//! Canonicalizes raw input into a clean, punctuation-terminated string:
//! - Unicode NFKD decomposition
//! - Emoji and denylisted-symbol removal
//! - Typographic dash/quote/bracket replacement
//! - Combining-diacritic removal
//! - Fixed expression expansion (`@`, `e.g.,`, `i.e.,`)
//! - Punctuation spacing and quote-run cleanup
//! - Whitespace collapse (paragraph breaks survive as one blank line)
//!
//! Normalization is pure, idempotent, and never fails on well-formed
//! Unicode input.

use unicode_normalization::UnicodeNormalization;

/// Symbols removed outright.
const SYMBOL_DENYLIST: &[char] = &['♥', '☆', '♡', '©', '\\'];

/// Punctuation that must not be preceded by a space.
const TIGHT_PUNCTUATION: &[char] = &[',', '.', '!', '?', ';', ':', '\''];

/// Characters accepted as a terminal for the whole text.
const TERMINAL_CHARS: &[char] = &[
    '.', '!', '?', ';', ':', ',', '\'', '"', ')', ']', '}', '…', '。', '」', '』', '】', '〉',
    '》', '›', '»',
];

/// Text normalizer producing chunker-ready input
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    /// Create a new TextNormalizer
    pub fn new() -> Self {
        Self
    }

    /// Normalize input text
    pub fn normalize(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        for c in text.nfkd() {
            if is_emoji(c) || is_stripped_diacritic(c) || SYMBOL_DENYLIST.contains(&c) {
                continue;
            }
            match c {
                '–' | '‑' | '—' => result.push('-'),
                '¯' | '_' | '[' | ']' | '|' | '/' | '#' | '→' | '←' => result.push(' '),
                '“' | '”' => result.push('"'),
                '‘' | '’' | '´' | '`' => result.push('\''),
                _ => result.push(c),
            }
        }

        let result = expand_expressions(&result);
        let result = fix_punctuation_spacing(&result);
        let result = collapse_quote_runs(&result);
        let mut result = collapse_whitespace(&result);

        if !result.chars().last().is_some_and(|c| TERMINAL_CHARS.contains(&c)) {
            result.push('.');
        }
        result
    }
}

/// Expand the small fixed set of spoken expressions.
fn expand_expressions(text: &str) -> String {
    text.replace('@', " at ")
        .replace("e.g.,", "for example, ")
        .replace("i.e.,", "that is, ")
}

/// Drop a single space before tight punctuation (` ,` -> `,` etc.).
fn fix_punctuation_spacing(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if TIGHT_PUNCTUATION.contains(&c) && result.ends_with(' ') {
            result.pop();
        }
        result.push(c);
    }
    result
}

/// Collapse repeated quote runs (`""` -> `"`, `''` -> `'`).
fn collapse_quote_runs(text: &str) -> String {
    let mut result = text.to_string();
    for pair in ["\"\"", "''"] {
        while result.contains(pair) {
            result = result.replace(pair, &pair[..1]);
        }
    }
    result
}

/// Collapse whitespace runs to a single space, preserving blank-line
/// paragraph boundaries as exactly one `\n\n`.
fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut run_newlines = 0usize;
    let mut in_run = false;

    for c in text.chars() {
        if c.is_whitespace() {
            in_run = true;
            if c == '\n' {
                run_newlines += 1;
            }
        } else {
            if in_run && !result.is_empty() {
                if run_newlines >= 2 {
                    result.push_str("\n\n");
                } else {
                    result.push(' ');
                }
            }
            in_run = false;
            run_newlines = 0;
            result.push(c);
        }
    }
    result
}

fn is_emoji(c: char) -> bool {
    let cp = c as u32;
    (0x1F600..=0x1F64F).contains(&cp)
        || (0x1F300..=0x1F5FF).contains(&cp)
        || (0x1F680..=0x1F6FF).contains(&cp)
        || (0x1F700..=0x1F77F).contains(&cp)
        || (0x1F780..=0x1F8FF).contains(&cp)
        || (0x1F900..=0x1F9FF).contains(&cp)
        || (0x1FA00..=0x1FA6F).contains(&cp)
        || (0x1FA70..=0x1FAFF).contains(&cp)
        || (0x2600..=0x26FF).contains(&cp)
        || (0x2700..=0x27BF).contains(&cp)
        || (0x1F1E6..=0x1F1FF).contains(&cp)
}

/// Combining diacritics stripped after decomposition.
fn is_stripped_diacritic(c: char) -> bool {
    let cp = c as u32;
    (0x0302..=0x0308).contains(&cp)
        || (0x030A..=0x030C).contains(&cp)
        || (0x0327..=0x032F).contains(&cp)
}
