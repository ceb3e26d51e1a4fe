use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::normalize::TextNormalizer;

/// An entity found by a recognizer, with character offsets into the text the
/// recognizer was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedEntity {
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub score: f32,
    pub word: String,
}

/// Text in, entities out.
pub trait EntityRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>>;
}

impl<R: EntityRecognizer + ?Sized> EntityRecognizer for Box<R> {
    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>> {
        (**self).recognize(text)
    }
}

/// Inserts a space before every entity start.
///
/// Entities are applied in ascending start order, each insertion shifting
/// the later ones by one. Starts past the end of the text land at the end.
///
/// # Examples
/// ```
/// use annoprep_core::{mark_boundaries, RecognizedEntity};
///
/// let entity = |start| RecognizedEntity {
///     label: "W".into(), start, end: start + 1, score: 1.0, word: String::new(),
/// };
/// assert_eq!(mark_boundaries("abcd", &[entity(0), entity(2)]), " ab cd");
/// ```
pub fn mark_boundaries(text: &str, entities: &[RecognizedEntity]) -> String {
    let mut starts: Vec<usize> = entities.iter().map(|e| e.start).collect();
    starts.sort_unstable();

    let mut chars: Vec<char> = text.chars().collect();
    for (shift, start) in starts.into_iter().enumerate() {
        let at = (start + shift).min(chars.len());
        chars.insert(at, ' ');
    }
    chars.into_iter().collect()
}

/// Normalize → recognize → mark boundaries.
pub struct Segmenter<R> {
    normalizer: TextNormalizer,
    recognizer: R,
}

impl<R: EntityRecognizer> Segmenter<R> {
    /// Create a new segmenter around `recognizer`.
    pub fn new(recognizer: R) -> Result<Self> {
        Ok(Self {
            normalizer: TextNormalizer::new()?,
            recognizer,
        })
    }

    /// Returns the normalized text with a space inserted before each entity.
    pub fn segment(&self, text: &str) -> Result<String> {
        let clean = self.normalizer.normalize(text);
        let entities = self.recognizer.recognize(&clean)?;
        debug!(entities = entities.len(), "recognized entities");
        Ok(mark_boundaries(&clean, &entities))
    }

    /// Get the wrapped recognizer.
    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }
}
