/// Configuration for building a NER dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetConfig {
    /// Seed of the row shuffler.
    pub seed: u64,
    /// Fraction of all rows held out as test.
    pub test_size: f64,
    /// Fraction of the remaining rows held out as validation.
    pub validation_size: f64,
    /// Also write CoNLL token/tag files next to the CSVs.
    pub emit_conll: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            seed: 1314,
            test_size: 0.2,
            validation_size: 0.125,
            emit_conll: false,
        }
    }
}

impl DatasetConfig {
    /// Create a new dataset configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shuffle seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the test fraction.
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Set the validation fraction (of the rows left after the test split).
    pub fn with_validation_size(mut self, validation_size: f64) -> Self {
        self.validation_size = validation_size;
        self
    }

    /// Enable or disable CoNLL output.
    pub fn with_conll(mut self, enabled: bool) -> Self {
        self.emit_conll = enabled;
        self
    }
}
