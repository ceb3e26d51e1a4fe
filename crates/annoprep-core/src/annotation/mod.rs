//! # Annotation Exports
//!
//! Label Studio JSON model, entity/relation extraction and the token-level
//! views derived from it.

pub mod bio;
pub mod extract;
pub mod record;
pub mod tokens;

pub use bio::{BioTag, write_conll};
pub use extract::{AnnotatedText, EntityAnnotation, RelationAnnotation, extract_annotations};
pub use record::{Annotation, Example, ResultItem, ResultValue, load_examples, read_examples};
pub use tokens::{TokenSpan, whitespace_spans};
