//! # Whitespace Token Spans
//!
//! Reconstructs word boundaries over annotated text so entity spans can be
//! projected onto tokens.

/// A whitespace-delimited token with character offsets into its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpan {
    /// The token text
    pub text: String,
    /// Start character offset
    pub start: usize,
    /// End character offset (exclusive)
    pub end: usize,
    /// Token index in the sequence
    pub index: usize,
}

impl TokenSpan {
    /// Returns `true` if the token lies entirely inside `[start, end)`.
    pub fn within(&self, start: usize, end: usize) -> bool {
        self.start >= start && self.end <= end
    }
}

/// Splits `text` on whitespace and assigns character offsets.
///
/// Offsets assume consecutive tokens are separated by exactly one space and
/// that the text does not start with whitespace. Texts breaking that
/// assumption get shifted offsets; use [`spans_are_exact`] to detect it.
///
/// # Examples
/// ```
/// use annoprep_core::annotation::whitespace_spans;
///
/// let spans = whitespace_spans("Alice met Bob");
/// assert_eq!(spans.len(), 3);
/// assert_eq!((spans[2].start, spans[2].end), (10, 13));
/// ```
pub fn whitespace_spans(text: &str) -> Vec<TokenSpan> {
    let mut spans = Vec::new();
    let mut point = 0;

    for (index, word) in text.split_whitespace().enumerate() {
        let end = point + word.chars().count();
        spans.push(TokenSpan {
            text: word.to_string(),
            start: point,
            end,
            index,
        });
        point = end + 1;
    }

    spans
}

/// Checks that every span's offsets point at its own text in `text`.
pub fn spans_are_exact(text: &str, spans: &[TokenSpan]) -> bool {
    let chars: Vec<char> = text.chars().collect();
    spans.iter().all(|span| {
        span.end <= chars.len() && chars[span.start..span.end].iter().copied().eq(span.text.chars())
    })
}
