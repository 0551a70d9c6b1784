use std::path::Path;
use std::sync::Mutex;

use tch::{CModule, Device, Kind, Tensor, nn::ModuleT};

use super::preprocess::PreprocessedTensor;
use super::{Classifier, ClassifierError};

/// Runs a TorchScript export of the classifier with libtorch.
pub struct TorchClassifier {
    model: Mutex<CModule>,
    device: Device,
}

impl TorchClassifier {
    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let device = Device::cuda_if_available();
        let model = CModule::load_on_device(path, device).map_err(|e| ClassifierError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        log::info!("Loaded TorchScript model from {} on {:?}", path.display(), device);
        Ok(Self {
            model: Mutex::new(model),
            device,
        })
    }
}

impl Classifier for TorchClassifier {
    fn predict(&self, input: &PreprocessedTensor) -> Result<Vec<f32>, ClassifierError> {
        let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
        let tensor = Tensor::from_slice(&input.to_vec())
            .view(shape.as_slice())
            .to_device(self.device);

        let output = {
            let model = self
                .model
                .lock()
                .map_err(|_| ClassifierError::Model("model lock poisoned".into()))?;
            model.forward_t(&tensor, false)
        };

        let output_flat = output
            .to_kind(Kind::Float)
            .to_device(Device::Cpu)
            .view([-1]);
        let scores =
            Vec::<f32>::try_from(&output_flat).map_err(|e| ClassifierError::Model(e.to_string()))?;
        if scores.is_empty() {
            return Err(ClassifierError::EmptyOutput);
        }
        Ok(scores)
    }

    fn name(&self) -> &'static str {
        "torch"
    }
}
