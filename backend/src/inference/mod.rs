pub mod fixed;
pub mod model;
pub mod onnx;
pub mod preprocess;
#[cfg(feature = "torch")]
pub mod torch;

use self::preprocess::PreprocessedTensor;

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Failed to load model from {path}: {reason}")]
    Load { path: String, reason: String },
    #[error("Model error: {0}")]
    Model(String),
    #[error("Model produced no output")]
    EmptyOutput,
    #[error("Backend {0} is not compiled in")]
    BackendUnavailable(&'static str),
}

/// A loaded image-classification model.
///
/// Implementations take a preprocessed image batch and return one score per
/// class label, in label order.
pub trait Classifier: Send + Sync {
    fn predict(&self, input: &PreprocessedTensor) -> Result<Vec<f32>, ClassifierError>;

    fn name(&self) -> &'static str;
}
