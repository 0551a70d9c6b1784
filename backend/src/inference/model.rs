use std::sync::Arc;

use leafcheck_shared::{Prediction, SelectionError};

use super::fixed::StaticClassifier;
use super::onnx::OnnxClassifier;
use super::preprocess::{DEFAULT_INPUT_SIZE, PreprocessError, preprocess};
use super::{Classifier, ClassifierError};
use crate::config::{ModelBackend, ModelConfig};

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Preprocessing error: {0}")]
    Preprocessing(#[from] PreprocessError),
    #[error(transparent)]
    Model(#[from] ClassifierError),
    #[error("Label selection error: {0}")]
    Selection(#[from] SelectionError),
}

/// Scores for one image together with the winning label.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub prediction: Prediction,
    pub scores: Vec<f32>,
}

#[derive(Clone)]
pub struct Model {
    classifier: Arc<dyn Classifier>,
    input_size: u32,
    apply_softmax: bool,
}

impl Model {
    pub fn new(classifier: Arc<dyn Classifier>, input_size: u32, apply_softmax: bool) -> Self {
        Self {
            classifier,
            input_size,
            apply_softmax,
        }
    }

    /// Model backed by fixed scores, for runs without a model artifact.
    pub fn with_static_scores(scores: Vec<f32>) -> Self {
        Self::new(
            Arc::new(StaticClassifier::new(scores)),
            DEFAULT_INPUT_SIZE,
            false,
        )
    }

    pub fn load(config: &ModelConfig) -> Result<Self, ClassifierError> {
        let classifier: Arc<dyn Classifier> = match config.backend {
            ModelBackend::Onnx => Arc::new(OnnxClassifier::load(&config.path, config.input_size)?),
            ModelBackend::Torch => load_torch(config)?,
        };
        Ok(Self::new(classifier, config.input_size, config.apply_softmax))
    }

    pub fn backend_name(&self) -> &'static str {
        self.classifier.name()
    }

    /// Preprocesses `image` and returns the raw per-label scores.
    pub fn inference(&self, image: &[u8]) -> Result<Vec<f32>, InferenceError> {
        let tensor = preprocess(image, self.input_size)?;
        let output = self.classifier.predict(&tensor)?;
        if self.apply_softmax {
            Ok(softmax(&output))
        } else {
            Ok(output)
        }
    }

    pub fn calculate_result(&self, predictions: &[f32]) -> Result<Prediction, SelectionError> {
        Prediction::from_scores(predictions)
    }

    pub fn classify(&self, image: &[u8]) -> Result<Classification, InferenceError> {
        let scores = self.inference(image)?;
        let prediction = self.calculate_result(&scores)?;
        Ok(Classification { prediction, scores })
    }
}

#[cfg(feature = "torch")]
fn load_torch(config: &ModelConfig) -> Result<Arc<dyn Classifier>, ClassifierError> {
    Ok(Arc::new(super::torch::TorchClassifier::load(&config.path)?))
}

#[cfg(not(feature = "torch"))]
fn load_torch(_config: &ModelConfig) -> Result<Arc<dyn Classifier>, ClassifierError> {
    Err(ClassifierError::BackendUnavailable("torch"))
}

/// Softmax over `logits`. `+inf` entries share all of the mass; NaN entries
/// stay NaN and are left out of the normalization.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let infinite = logits.iter().filter(|v| **v == f32::INFINITY).count();
    if infinite > 0 {
        let share = 1.0 / infinite as f32;
        return logits
            .iter()
            .map(|&v| {
                if v == f32::INFINITY {
                    share
                } else if v.is_nan() {
                    v
                } else {
                    0.0
                }
            })
            .collect();
    }

    let max = logits
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return logits.to_vec();
    }
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().filter(|v| !v.is_nan()).sum();
    exps.into_iter().map(|v| v / sum).collect()
}
