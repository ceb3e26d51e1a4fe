use candle_core::{Result, Tensor};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::distilbert::{Config, DistilBertModel};

/// A token classification model (DistilBERT encoder + linear head), laid out
/// like a Hugging Face `DistilBertForTokenClassification` checkpoint.
pub struct TokenClassificationModel {
    pub distilbert: DistilBertModel,
    pub classifier: Linear,
}

impl TokenClassificationModel {
    /// Load the model from a var builder over the whole checkpoint.
    ///
    /// `prefix` is the encoder's tensor prefix (`"distilbert"` for fine-tuned
    /// checkpoints, `""` for bare encoders). The head is always `classifier`.
    pub fn load(
        vb: VarBuilder,
        config: &Config,
        prefix: &str,
        hidden_size: usize,
        num_labels: usize,
    ) -> Result<Self> {
        let encoder_vb = if prefix.is_empty() { vb.clone() } else { vb.pp(prefix) };
        let distilbert = DistilBertModel::load(encoder_vb, config)?;
        let classifier = candle_nn::linear(hidden_size, num_labels, vb.pp("classifier"))?;

        Ok(Self {
            distilbert,
            classifier,
        })
    }

    /// Forward pass producing per-token logits.
    /// `input_ids`: [batch_size, seq_len]
    /// `attention_mask`: [seq_len, seq_len], non-zero entries are masked out
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let hidden_states = self.distilbert.forward(input_ids, attention_mask)?;
        self.classifier.forward(&hidden_states)
    }
}
