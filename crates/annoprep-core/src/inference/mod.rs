//! Model inference: token classification and boundary marking.

pub mod classifier;
pub mod model;
pub mod recognizer;

pub use classifier::{
    AggregationStrategy, ClassifierConfig, MODEL_FILES, TokenClassifier, TokenPrediction, aggregate,
};
pub use model::TokenClassificationModel;
pub use recognizer::{EntityRecognizer, RecognizedEntity, Segmenter, mark_boundaries};
