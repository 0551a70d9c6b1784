use super::preprocess::PreprocessedTensor;
use super::{Classifier, ClassifierError};

/// Classifier that ignores its input and always returns the same scores.
///
/// Stands in for a real model in tests and in smoke runs without a model
/// artifact on disk.
#[derive(Debug, Clone)]
pub struct StaticClassifier {
    scores: Vec<f32>,
}

impl StaticClassifier {
    pub fn new(scores: Vec<f32>) -> Self {
        Self { scores }
    }
}

impl Classifier for StaticClassifier {
    fn predict(&self, _input: &PreprocessedTensor) -> Result<Vec<f32>, ClassifierError> {
        if self.scores.is_empty() {
            return Err(ClassifierError::EmptyOutput);
        }
        Ok(self.scores.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
