//! Sentence-aware text chunking
//!
//! Splits normalized text into bounded-length synthesis chunks:
//! - Paragraphs split on blank lines
//! - Sentences split after `.`/`!`/`?` followed by whitespace, unless the
//!   terminator belongs to a known abbreviation or a lone initial ("F.")
//! - Sentences packed greedily up to `max_len` characters
//!
//! A single sentence longer than `max_len` is emitted as its own oversized
//! chunk rather than truncated; downstream stages must tolerate it.

/// Default maximum chunk length in characters.
pub const DEFAULT_MAX_CHUNK_LEN: usize = 300;

/// Trailing tokens that suppress a sentence split after their period.
const NON_BREAKING_SUFFIXES: &[&str] = &[
    "Mr.", "Mrs.", "Ms.", "Dr.", "Prof.", "Sr.", "Jr.", "Ph.D.", "etc.", "e.g.", "i.e.", "vs.",
    "Inc.", "Ltd.", "Co.", "Corp.", "St.", "Ave.", "Blvd.",
];

/// Split text into chunks of at most `max_len` characters along paragraph
/// and sentence boundaries, preserving sentence order.
pub fn chunk_text(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();

    for paragraph in split_paragraphs(text) {
        let mut current = String::new();

        for sentence in split_sentences(&paragraph) {
            if current.chars().count() + sentence.chars().count() + 1 <= max_len {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(sentence);
            } else {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                }
                current = sentence.to_string();
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }
    }

    chunks
}

/// Split on blank-line boundaries; inner line breaks become spaces.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut lines: Vec<&str> = Vec::new();

    let mut flush = |lines: &mut Vec<&str>, out: &mut Vec<String>| {
        if !lines.is_empty() {
            out.push(lines.join(" "));
            lines.clear();
        }
    };

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            flush(&mut lines, &mut paragraphs);
        } else {
            lines.push(line);
        }
    }
    flush(&mut lines, &mut paragraphs);
    paragraphs
}

/// Split a paragraph into sentences, keeping terminal punctuation.
fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let chars: Vec<(usize, char)> = paragraph.char_indices().collect();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let (offset, c) = chars[i];
        let next_is_space = chars
            .get(i + 1)
            .is_some_and(|&(_, next)| next.is_whitespace());

        if matches!(c, '.' | '!' | '?') && next_is_space {
            let end = offset + c.len_utf8();
            if breaks_sentence(&paragraph[start..end], c) {
                sentences.push(paragraph[start..end].trim());
                // Skip the whitespace run after the terminator.
                i += 1;
                while i < chars.len() && chars[i].1.is_whitespace() {
                    i += 1;
                }
                start = chars.get(i).map_or(paragraph.len(), |&(o, _)| o);
                continue;
            }
        }
        i += 1;
    }

    if start < paragraph.len() {
        let rest = paragraph[start..].trim();
        if !rest.is_empty() {
            sentences.push(rest);
        }
    }
    sentences
}

/// Whether a terminator at the end of `prefix` is a real sentence boundary.
fn breaks_sentence(prefix: &str, terminator: char) -> bool {
    if terminator != '.' {
        return true;
    }
    if NON_BREAKING_SUFFIXES
        .iter()
        .any(|abbr| prefix.ends_with(abbr))
    {
        return false;
    }
    !ends_with_initial(prefix)
}

/// Detects a lone capital letter followed by the period, as in "F.";
/// the letter must itself start a word.
fn ends_with_initial(prefix: &str) -> bool {
    let mut rev = prefix.chars().rev();
    match (rev.next(), rev.next(), rev.next()) {
        (Some('.'), Some(letter), before) => {
            letter.is_ascii_uppercase() && before.map_or(true, |c| !c.is_alphanumeric())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("Hello. World.", DEFAULT_MAX_CHUNK_LEN);
        assert_eq!(chunks, vec!["Hello. World."]);
    }

    #[test]
    fn test_overflow_starts_new_chunk() {
        let chunks = chunk_text("One two three. Four five six.", 15);
        assert_eq!(chunks, vec!["One two three.", "Four five six."]);
    }

    #[test]
    fn test_oversized_sentence_passes_through() {
        let long = "This single sentence just keeps going without a break.";
        let chunks = chunk_text(long, 20);
        assert_eq!(chunks, vec![long]);
    }

    #[test]
    fn test_abbreviations_do_not_split() {
        let chunks = chunk_text("Dr. Smith met Mrs. Jones. They talked.", 26);
        assert_eq!(chunks, vec!["Dr. Smith met Mrs. Jones.", "They talked."]);
    }

    #[test]
    fn test_initials_do_not_split() {
        let chunks = chunk_text("F. Scott wrote it. It sold well.", 19);
        assert_eq!(chunks, vec!["F. Scott wrote it.", "It sold well."]);
    }

    #[test]
    fn test_paragraphs_never_merge_across_blank_lines() {
        let chunks = chunk_text("First paragraph.\n\nSecond paragraph.", 100);
        assert_eq!(chunks, vec!["First paragraph.", "Second paragraph."]);
    }

    #[test]
    fn test_question_and_exclamation_split() {
        let chunks = chunk_text("Really? Yes! Good.", 7);
        assert_eq!(chunks, vec!["Really?", "Yes!", "Good."]);
    }

    #[test]
    fn test_order_preserved() {
        let text = "Alpha one. Beta two. Gamma three. Delta four.";
        let chunks = chunk_text(text, 22);
        let rejoined: String = chunks
            .join(" ")
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        let original: String = text.chars().filter(|c| c.is_alphanumeric()).collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn test_length_bound_holds() {
        let text = "One. Two. Three. Four. Five. Six. Seven. Eight. Nine. Ten.";
        for chunk in chunk_text(text, 20) {
            assert!(chunk.chars().count() <= 20, "chunk too long: {chunk:?}");
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk_text("", 300).is_empty());
        assert!(chunk_text("\n\n  \n", 300).is_empty());
    }
}
