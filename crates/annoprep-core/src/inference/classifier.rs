//! # Token Classifier
//!
//! Runs a fine-tuned DistilBERT token classification checkpoint with candle
//! and merges its per-wordpiece predictions into entities.
//!
//! A model directory holds `config.json` (with `id2label`), `tokenizer.json`
//! and `model.safetensors`.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::distilbert::Config as DistilBertConfig;
use safetensors::SafeTensors;
use serde::Deserialize;
use tokenizers::Tokenizer as HfTokenizer;
use tracing::{debug, info};

use super::model::TokenClassificationModel;
use super::recognizer::{EntityRecognizer, RecognizedEntity};
use crate::annotation::BioTag;
use crate::error::{AnnoprepError, Result};

pub const CONFIG_FILE: &str = "config.json";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const WEIGHTS_FILE: &str = "model.safetensors";

/// Files a model directory must contain.
pub const MODEL_FILES: &[&str] = &[CONFIG_FILE, TOKENIZER_FILE, WEIGHTS_FILE];

/// How wordpiece predictions become entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregationStrategy {
    /// One entity per non-`O` wordpiece.
    None,
    /// Consecutive wordpieces of one entity type merge; `B-` starts a new one.
    #[default]
    Simple,
}

impl fmt::Display for AggregationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationStrategy::None => write!(f, "none"),
            AggregationStrategy::Simple => write!(f, "simple"),
        }
    }
}

impl FromStr for AggregationStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(AggregationStrategy::None),
            "simple" => Ok(AggregationStrategy::Simple),
            other => Err(format!("unknown aggregation strategy: {other}")),
        }
    }
}

/// Configuration for the token classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Aggregation strategy
    pub aggregation: AggregationStrategy,
    /// Entities scoring below this are dropped
    pub min_score: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            aggregation: AggregationStrategy::Simple,
            min_score: 0.0,
        }
    }
}

impl ClassifierConfig {
    /// Create a new classifier configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the aggregation strategy.
    pub fn with_aggregation(mut self, aggregation: AggregationStrategy) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Set the minimum entity score.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score.clamp(0.0, 1.0);
        self
    }
}

/// The prediction for one wordpiece.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPrediction {
    pub tag: BioTag,
    pub score: f32,
    /// Start character offset
    pub start: usize,
    /// End character offset (exclusive)
    pub end: usize,
}

/// Merges wordpiece predictions into entities.
pub fn aggregate(
    text: &str,
    predictions: &[TokenPrediction],
    strategy: AggregationStrategy,
) -> Vec<RecognizedEntity> {
    let chars: Vec<char> = text.chars().collect();
    let entity = |label: &str, start: usize, end: usize, scores: &[f32]| RecognizedEntity {
        label: label.to_string(),
        start,
        end,
        score: scores.iter().sum::<f32>() / scores.len() as f32,
        word: chars[start.min(chars.len())..end.min(chars.len())].iter().collect(),
    };

    match strategy {
        AggregationStrategy::None => predictions
            .iter()
            .filter_map(|p| p.tag.label().map(|label| entity(label, p.start, p.end, &[p.score])))
            .collect(),
        AggregationStrategy::Simple => {
            let mut entities = Vec::new();
            // (label, start, end, scores)
            let mut group: Option<(&str, usize, usize, Vec<f32>)> = None;

            for p in predictions {
                let label = p.tag.label();
                let continues = matches!(
                    (&group, label),
                    (Some((current, ..)), Some(label)) if *current == label && !p.tag.is_begin()
                );

                if continues {
                    if let Some((_, _, end, scores)) = group.as_mut() {
                        *end = p.end;
                        scores.push(p.score);
                    }
                } else {
                    if let Some((label, start, end, scores)) = group.take() {
                        entities.push(entity(label, start, end, &scores));
                    }
                    group = label.map(|label| (label, p.start, p.end, vec![p.score]));
                }
            }
            if let Some((label, start, end, scores)) = group {
                entities.push(entity(label, start, end, &scores));
            }
            entities
        }
    }
}

#[derive(Deserialize)]
struct LabelMap {
    id2label: HashMap<String, String>,
}

/// Reads `id2label` from a model config into an index-ordered list.
fn label_names(config_json: &str) -> Result<Vec<String>> {
    let map: LabelMap = serde_json::from_str(config_json)
        .map_err(|e| AnnoprepError::ModelLoadError(format!("config has no usable id2label: {e}")))?;

    let mut labels: Vec<Option<String>> = vec![None; map.id2label.len()];
    for (id, name) in map.id2label {
        match id.parse::<usize>() {
            Ok(i) if i < labels.len() => labels[i] = Some(name),
            _ => {
                return Err(AnnoprepError::ModelLoadError(format!(
                    "id2label key {id:?} out of range"
                )));
            }
        }
    }
    labels
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| AnnoprepError::ModelLoadError("id2label has duplicate ids".into()))
}

/// Classification head layout read from the checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HeadShape {
    prefix: &'static str,
    hidden_size: usize,
    num_labels: usize,
}

fn inspect_weights(bytes: &[u8]) -> Result<HeadShape> {
    let tensors = SafeTensors::deserialize(bytes)
        .map_err(|e| AnnoprepError::ModelLoadError(format!("invalid safetensors: {e}")))?;
    let head = tensors
        .tensor("classifier.weight")
        .map_err(|e| AnnoprepError::ModelLoadError(format!("no classification head: {e}")))?;

    let (num_labels, hidden_size) = match head.shape() {
        [rows, cols] => (*rows, *cols),
        other => {
            return Err(AnnoprepError::ModelLoadError(format!(
                "classifier.weight has shape {other:?}, expected 2 dimensions"
            )));
        }
    };
    let prefix = if tensors.names().iter().any(|n| n.starts_with("distilbert.")) {
        "distilbert"
    } else {
        ""
    };

    Ok(HeadShape {
        prefix,
        hidden_size,
        num_labels,
    })
}

/// DistilBERT token classifier.
pub struct TokenClassifier {
    tokenizer: HfTokenizer,
    model: TokenClassificationModel,
    labels: Vec<BioTag>,
    config: ClassifierConfig,
    device: Device,
}

impl TokenClassifier {
    /// Loads a classifier from a model directory.
    ///
    /// # Errors
    ///
    /// Returns `AnnoprepError::ModelLoadError` if a file is missing or
    /// unreadable, or if the label map and the classification head disagree.
    pub fn from_dir(dir: &Path, config: ClassifierConfig) -> Result<Self> {
        for file in MODEL_FILES {
            if !dir.join(file).exists() {
                return Err(AnnoprepError::ModelLoadError(format!(
                    "{file} not found in {}",
                    dir.display()
                )));
            }
        }

        let tokenizer = HfTokenizer::from_file(dir.join(TOKENIZER_FILE))
            .map_err(|e| AnnoprepError::ModelLoadError(format!("failed to load tokenizer: {e}")))?;

        let config_str = std::fs::read_to_string(dir.join(CONFIG_FILE))?;
        let bert_config: DistilBertConfig = serde_json::from_str(&config_str)
            .map_err(|e| AnnoprepError::ModelLoadError(format!("failed to parse config: {e}")))?;
        let labels: Vec<BioTag> = label_names(&config_str)?
            .iter()
            .map(|l| BioTag::parse(l))
            .collect();

        let weights = std::fs::read(dir.join(WEIGHTS_FILE))?;
        let head = inspect_weights(&weights)?;
        if head.num_labels != labels.len() {
            return Err(AnnoprepError::ModelLoadError(format!(
                "classification head has {} outputs but id2label has {} labels",
                head.num_labels,
                labels.len()
            )));
        }

        let device = Device::Cpu;
        let vb = VarBuilder::from_buffered_safetensors(weights, DType::F32, &device)?;
        let model = TokenClassificationModel::load(
            vb,
            &bert_config,
            head.prefix,
            head.hidden_size,
            head.num_labels,
        )?;

        info!(
            dir = %dir.display(),
            labels = labels.len(),
            hidden_size = head.hidden_size,
            aggregation = %config.aggregation,
            "loaded token classifier"
        );

        Ok(Self {
            tokenizer,
            model,
            labels,
            config,
            device,
        })
    }

    /// Label set in model output order.
    pub fn labels(&self) -> &[BioTag] {
        &self.labels
    }

    /// Get the classifier configuration.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Predicts a tag for every non-special wordpiece of `text`.
    pub fn predict(&self, text: &str) -> Result<Vec<TokenPrediction>> {
        let encoding = self
            .tokenizer
            .encode_char_offsets(text, true)
            .map_err(|e| AnnoprepError::InferenceError(format!("tokenize error: {e}")))?;

        let ids = encoding.get_ids();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let seq_len = ids.len();

        let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        // nothing is masked for a single unpadded sequence
        let mask = Tensor::zeros((seq_len, seq_len), DType::U8, &self.device)?;

        let logits = self.model.forward(&input_ids, &mask)?.squeeze(0)?;
        let probs: Vec<Vec<f32>> = candle_nn::ops::softmax_last_dim(&logits)?.to_vec2()?;

        let special = encoding.get_special_tokens_mask();
        let offsets = encoding.get_offsets();

        let mut predictions = Vec::with_capacity(seq_len);
        for (i, row) in probs.iter().enumerate() {
            let (start, end) = offsets[i];
            if special[i] == 1 || start == end {
                continue;
            }
            let (best, score) = row
                .iter()
                .copied()
                .enumerate()
                .fold((0, f32::MIN), |acc, (j, p)| if p > acc.1 { (j, p) } else { acc });
            let tag = self.labels.get(best).cloned().ok_or_else(|| {
                AnnoprepError::InferenceError(format!("label index {best} out of range"))
            })?;
            predictions.push(TokenPrediction { tag, score, start, end });
        }

        debug!(wordpieces = seq_len, kept = predictions.len(), "classified tokens");
        Ok(predictions)
    }
}

impl EntityRecognizer for TokenClassifier {
    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let predictions = self.predict(text)?;
        Ok(aggregate(text, &predictions, self.config.aggregation)
            .into_iter()
            .filter(|e| e.score >= self.config.min_score)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pred(tag: &str, start: usize, end: usize, score: f32) -> TokenPrediction {
        TokenPrediction {
            tag: BioTag::parse(tag),
            score,
            start,
            end,
        }
    }

    #[test]
    fn simple_aggregation_merges_inside_tokens() {
        let text = "John Smith lives in New York";
        let predictions = [
            pred("B-PER", 0, 4, 0.9),
            pred("I-PER", 5, 10, 0.7),
            pred("O", 11, 16, 0.99),
            pred("O", 17, 19, 0.99),
            pred("B-LOC", 20, 23, 0.8),
            pred("I-LOC", 24, 28, 0.6),
        ];

        let entities = aggregate(text, &predictions, AggregationStrategy::Simple);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].label, "PER");
        assert_eq!((entities[0].start, entities[0].end), (0, 10));
        assert_eq!(entities[0].word, "John Smith");
        assert!((entities[0].score - 0.8).abs() < 1e-6);
        assert_eq!(entities[1].word, "New York");
    }

    #[test]
    fn simple_aggregation_splits_on_begin_and_type_change() {
        let text = "ab cd ef";
        let predictions = [
            pred("B-W", 0, 2, 1.0),
            pred("B-W", 3, 5, 1.0),
            pred("I-X", 6, 8, 1.0),
        ];
        let starts: Vec<usize> = aggregate(text, &predictions, AggregationStrategy::Simple)
            .iter()
            .map(|e| e.start)
            .collect();
        assert_eq!(starts, vec![0, 3, 6]);
    }

    #[test]
    fn unprefixed_labels_group_by_name() {
        let predictions = [pred("WORD", 0, 1, 1.0), pred("WORD", 1, 2, 1.0), pred("O", 2, 3, 1.0)];
        let entities = aggregate("abc", &predictions, AggregationStrategy::Simple);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].word, "ab");
    }

    #[test]
    fn none_aggregation_keeps_every_entity_token() {
        let predictions = [
            pred("B-PER", 0, 4, 0.9),
            pred("I-PER", 5, 10, 0.7),
            pred("O", 11, 16, 0.9),
        ];
        let entities = aggregate("John Smith lives", &predictions, AggregationStrategy::None);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[1].word, "Smith");
        assert_eq!(entities[1].label, "PER");
    }

    #[test]
    fn aggregation_strategy_parsing() {
        assert_eq!("simple".parse::<AggregationStrategy>().unwrap(), AggregationStrategy::Simple);
        assert_eq!("NONE".parse::<AggregationStrategy>().unwrap(), AggregationStrategy::None);
        assert!("max".parse::<AggregationStrategy>().is_err());
        assert_eq!(AggregationStrategy::default().to_string(), "simple");
    }

    #[test]
    fn config_clamps_min_score() {
        assert_eq!(ClassifierConfig::new().with_min_score(1.5).min_score, 1.0);
        assert_eq!(ClassifierConfig::new().with_min_score(-0.5).min_score, 0.0);
    }

    #[test]
    fn label_names_are_index_ordered() {
        let config = r#"{"id2label": {"1": "B-PER", "0": "O", "2": "I-PER"}, "dim": 768}"#;
        assert_eq!(label_names(config).unwrap(), vec!["O", "B-PER", "I-PER"]);
    }

    #[test]
    fn label_names_reject_gaps() {
        assert!(label_names(r#"{"id2label": {"0": "O", "2": "B-PER"}}"#).is_err());
        assert!(label_names(r#"{"id2label": {"zero": "O"}}"#).is_err());
        assert!(label_names(r#"{"dim": 768}"#).is_err());
    }

    #[test]
    fn missing_model_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{}").unwrap();

        let err = TokenClassifier::from_dir(dir.path(), ClassifierConfig::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains(TOKENIZER_FILE));
    }
}
