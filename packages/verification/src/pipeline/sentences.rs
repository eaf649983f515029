//! Sentence segmentation.
//!
//! Pattern rules and claim identification both work one sentence at a time.
//! Offsets are byte offsets into the original content.

/// Abbreviations whose trailing period does not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "e.g", "i.e", "etc", "vs", "dr", "mr", "mrs", "ms", "prof", "inc", "ltd", "co", "corp",
    "jr", "sr", "st", "al", "fig", "approx", "u.s", "u.k", "jan", "feb", "mar",
    "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
];

/// A sentence and its position in the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Sentence {
    pub fn new(text: impl Into<String>, start: usize) -> Self {
        let text = text.into();
        let end = start + text.len();
        Self { text, start, end }
    }

    /// Translate a byte range local to this sentence into content offsets.
    pub fn absolute(&self, local_start: usize, local_end: usize) -> (usize, usize) {
        (self.start + local_start, self.start + local_end)
    }
}

/// Split content into trimmed, non-empty sentences.
///
/// Boundaries are `.`, `!` or `?` followed by whitespace (or the end of the
/// content), blank lines, and list items. Decimal points, initials and common
/// abbreviations do not split.
pub fn split_sentences(content: &str) -> Vec<Sentence> {
    let chars: Vec<(usize, char)> = content.char_indices().collect();
    let mut sentences = Vec::new();
    let mut segment_start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (idx, c) = chars[i];
        match c {
            '.' | '!' | '?' => {
                let mut j = i + 1;
                while j < chars.len() && is_trailer(chars[j].1) {
                    j += 1;
                }

                let at_end = j >= chars.len();
                let followed_by_space = at_end || chars[j].1.is_whitespace();
                let abbreviated = c == '.' && is_abbreviation(&content[segment_start..idx]);

                if followed_by_space && !abbreviated {
                    let end = if at_end { content.len() } else { chars[j].0 };
                    push_trimmed(content, segment_start, end, &mut sentences);
                    segment_start = end;
                }
                i = j;
                continue;
            }
            '\n' if starts_new_block(&chars, i + 1) => {
                push_trimmed(content, segment_start, idx, &mut sentences);
                segment_start = idx;
            }
            _ => {}
        }
        i += 1;
    }

    push_trimmed(content, segment_start, content.len(), &mut sentences);
    sentences
}

/// Characters that may follow terminal punctuation inside the same sentence.
fn is_trailer(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '"' | '\'' | ')' | ']' | '\u{201D}' | '\u{2019}')
}

/// Whether the word just before a period is an abbreviation or an initial.
fn is_abbreviation(prefix: &str) -> bool {
    let word = prefix
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches(|c: char| !c.is_alphanumeric());

    if word.is_empty() {
        return false;
    }

    let mut letters = word.chars();
    if let (Some(first), None) = (letters.next(), letters.next()) {
        if first.is_uppercase() {
            return true;
        }
    }

    let lower = word.to_lowercase();
    ABBREVIATIONS.contains(&lower.as_str())
}

/// A newline starts a new block when followed by a blank line or a list item.
fn starts_new_block(chars: &[(usize, char)], from: usize) -> bool {
    let mut k = from;
    while k < chars.len() && matches!(chars[k].1, ' ' | '\t' | '\r') {
        k += 1;
    }
    if k >= chars.len() {
        return false;
    }

    let next_is_space = |at: usize| at >= chars.len() || chars[at].1.is_whitespace();

    match chars[k].1 {
        '\n' => true,
        '-' | '*' | '\u{2022}' => next_is_space(k + 1),
        c if c.is_ascii_digit() => {
            let mut m = k;
            while m < chars.len() && chars[m].1.is_ascii_digit() {
                m += 1;
            }
            m < chars.len() && matches!(chars[m].1, '.' | ')') && next_is_space(m + 1)
        }
        _ => false,
    }
}

fn push_trimmed(content: &str, start: usize, end: usize, out: &mut Vec<Sentence>) {
    if end <= start {
        return;
    }
    let slice = &content[start..end];
    let leading = slice.len() - slice.trim_start().len();
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return;
    }
    out.push(Sentence::new(trimmed, start + leading));
}
