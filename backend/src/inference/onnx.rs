use std::path::Path;

use tract_onnx::prelude::*;

use super::preprocess::{CHANNELS, PreprocessedTensor};
use super::{Classifier, ClassifierError};

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

/// Runs an ONNX export of the classifier with tract.
pub struct OnnxClassifier {
    model: OnnxPlan,
    input_shape: [usize; 4],
}

impl OnnxClassifier {
    pub fn load(path: &Path, input_size: u32) -> Result<Self, ClassifierError> {
        let side = input_size as usize;
        let input_shape = [1, side, side, CHANNELS];
        let load_err = |e: TractError| ClassifierError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(load_err)?
            .with_input_fact(0, f32::fact(input_shape).into())
            .map_err(load_err)?
            .into_optimized()
            .map_err(load_err)?
            .into_runnable()
            .map_err(load_err)?;

        log::info!(
            "Loaded ONNX model from {} with input shape {:?}",
            path.display(),
            input_shape
        );
        Ok(Self { model, input_shape })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, input: &PreprocessedTensor) -> Result<Vec<f32>, ClassifierError> {
        if input.shape() != self.input_shape {
            return Err(ClassifierError::Model(format!(
                "input shape {:?} does not match model input {:?}",
                input.shape(),
                self.input_shape
            )));
        }

        let tensor = Tensor::from_shape(&self.input_shape, &input.to_vec())
            .map_err(|e| ClassifierError::Model(e.to_string()))?;
        let outputs = self
            .model
            .run(tvec!(tensor.into_tvalue()))
            .map_err(|e| ClassifierError::Model(e.to_string()))?;

        let output = outputs.first().ok_or(ClassifierError::EmptyOutput)?;
        let scores: Vec<f32> = output
            .to_array_view::<f32>()
            .map_err(|e| ClassifierError::Model(e.to_string()))?
            .iter()
            .copied()
            .collect();

        if scores.is_empty() {
            return Err(ClassifierError::EmptyOutput);
        }
        Ok(scores)
    }

    fn name(&self) -> &'static str {
        "onnx"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_file_is_a_load_error() {
        let result = OnnxClassifier::load(Path::new("does/not/exist.onnx"), 224);
        match result {
            Err(ClassifierError::Load { path, .. }) => assert!(path.ends_with("exist.onnx")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("loading a missing model should fail"),
        }
    }
}
