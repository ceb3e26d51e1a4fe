use regex::Regex;

/// Punctuation-spacing normalizer shared by boundary rows and inference input.
///
/// Puts a space on both sides of `[ ] ( ) : ,`, trims, then collapses every
/// whitespace run to a single space.
pub struct TextNormalizer {
    re_punct: Regex,
    re_space: Regex,
}

impl TextNormalizer {
    /// Constructs a new `TextNormalizer` with pre-compiled regex patterns.
    ///
    /// # Errors
    ///
    /// Returns `AnnoprepError::RegexError` if a pattern fails to compile
    /// (should never happen with the static patterns defined here).
    pub fn new() -> crate::Result<Self> {
        Ok(Self {
            re_punct: Regex::new(r"([\[()\]:,])")?,
            re_space: Regex::new(r"\s+")?,
        })
    }

    /// Normalizes `text`.
    ///
    /// # Examples
    /// ```
    /// use annoprep_core::TextNormalizer;
    ///
    /// let normalizer = TextNormalizer::new().unwrap();
    /// assert_eq!(normalizer.normalize("abc, (def): ghi"), "abc , ( def ) : ghi");
    /// ```
    pub fn normalize(&self, text: &str) -> String {
        let spaced = self.re_punct.replace_all(text, " ${1} ");
        self.re_space.replace_all(spaced.trim(), " ").into_owned()
    }
}
