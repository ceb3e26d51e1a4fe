//! # BIO Tags
//!
//! Begin-Inside-Outside tagging over whitespace tokens, and the CoNLL-style
//! writer for tagged examples. The same tag type parses model label names.

use std::fmt;
use std::io::Write;

use super::extract::AnnotatedText;
use crate::error::Result;

/// A BIO tag carrying its entity label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BioTag {
    /// First token of an entity.
    Begin(String),
    /// Continuation token of an entity.
    Inside(String),
    /// Token outside any entity.
    Outside,
}

impl BioTag {
    /// Parses a tag name such as `B-PER`, `I-LOC` or `O`.
    ///
    /// Names without a `B-`/`I-` prefix are treated as inside tags of an
    /// entity with that name, which is how single-scheme label sets behave
    /// under aggregation.
    pub fn parse(name: &str) -> Self {
        if name == "O" {
            BioTag::Outside
        } else if let Some(label) = name.strip_prefix("B-") {
            BioTag::Begin(label.to_string())
        } else if let Some(label) = name.strip_prefix("I-") {
            BioTag::Inside(label.to_string())
        } else {
            BioTag::Inside(name.to_string())
        }
    }

    /// Entity label, `None` for `O`.
    pub fn label(&self) -> Option<&str> {
        match self {
            BioTag::Begin(label) | BioTag::Inside(label) => Some(label),
            BioTag::Outside => None,
        }
    }

    /// Check if this tag begins an entity.
    pub fn is_begin(&self) -> bool {
        matches!(self, BioTag::Begin(_))
    }

    /// Check if this tag is outside any entity.
    pub fn is_outside(&self) -> bool {
        matches!(self, BioTag::Outside)
    }
}

impl fmt::Display for BioTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BioTag::Begin(label) => write!(f, "B-{label}"),
            BioTag::Inside(label) => write!(f, "I-{label}"),
            BioTag::Outside => write!(f, "O"),
        }
    }
}

impl AnnotatedText {
    /// Projects entity spans onto the token spans.
    ///
    /// A token takes an entity's tag only when it lies fully inside the
    /// entity span; the first such token gets `B-`, the rest `I-`. When spans
    /// overlap, the entity that starts first keeps the token.
    pub fn bio_tags(&self) -> Vec<BioTag> {
        let mut tags = vec![BioTag::Outside; self.tokens.len()];

        for entity in self.sorted_entities() {
            let mut first = true;
            for token in &self.tokens {
                if !token.within(entity.start, entity.end) || !tags[token.index].is_outside() {
                    continue;
                }
                tags[token.index] = if first {
                    BioTag::Begin(entity.label.clone())
                } else {
                    BioTag::Inside(entity.label.clone())
                };
                first = false;
            }
        }

        tags
    }
}

/// Writes examples as `token<TAB>tag` lines with a blank line after each
/// example.
pub fn write_conll<W: Write>(mut writer: W, examples: &[AnnotatedText]) -> Result<()> {
    for example in examples {
        for (token, tag) in example.tokens.iter().zip(example.bio_tags()) {
            writeln!(writer, "{}\t{}", token.text, tag)?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}
