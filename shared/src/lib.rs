use serde::{Deserialize, Serialize};
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{Display, EnumCount as EnumCountMacro, EnumIter, EnumString, IntoStaticStr};

/// Disease/health categories the classifier was trained on.
///
/// Declaration order is the model's output order: the score at index `i` of a
/// prediction vector belongs to the `i`-th variant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    EnumCountMacro,
    IntoStaticStr,
)]
pub enum ClassLabel {
    #[serde(rename = "Early_Blight")]
    #[strum(serialize = "Early_Blight")]
    EarlyBlight,
    #[serde(rename = "Healthy")]
    #[strum(serialize = "Healthy")]
    Healthy,
    #[serde(rename = "Late_Blight")]
    #[strum(serialize = "Late_Blight")]
    LateBlight,
    #[serde(rename = "Leaf_Miner")]
    #[strum(serialize = "Leaf_Miner")]
    LeafMiner,
    #[serde(rename = "Magnesium_Deficiency")]
    #[strum(serialize = "Magnesium_Deficiency")]
    MagnesiumDeficiency,
    #[serde(rename = "Nitrogen_Deficiency")]
    #[strum(serialize = "Nitrogen_Deficiency")]
    NitrogenDeficiency,
    #[serde(rename = "Potassium_Deficiency")]
    #[strum(serialize = "Potassium_Deficiency")]
    PotassiumDeficiency,
    #[serde(rename = "Spotted_Wilt_Virus")]
    #[strum(serialize = "Spotted_Wilt_Virus")]
    SpottedWiltVirus,
}

impl ClassLabel {
    pub fn from_index(index: usize) -> Option<Self> {
        Self::iter().nth(index)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn all() -> Vec<ClassLabel> {
        Self::iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectionError {
    #[error("Prediction vector is empty")]
    Empty,
    #[error("Prediction vector has {actual} entries, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Prediction vector has no finite score")]
    NoFiniteScore,
}

/// Highest-scoring label of a single prediction vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: ClassLabel,
    pub index: usize,
    pub score: f32,
}

impl Prediction {
    /// Picks the maximum score and maps its index onto [`ClassLabel`].
    ///
    /// Ties resolve to the first maximal index. NaN entries are skipped on
    /// purpose rather than reported as the maximum, and a vector with no finite
    /// score is rejected.
    pub fn from_scores(scores: &[f32]) -> Result<Self, SelectionError> {
        if scores.is_empty() {
            return Err(SelectionError::Empty);
        }
        if scores.len() != ClassLabel::COUNT {
            return Err(SelectionError::LengthMismatch {
                expected: ClassLabel::COUNT,
                actual: scores.len(),
            });
        }

        let mut best: Option<(usize, f32)> = None;
        for (index, &score) in scores.iter().enumerate() {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, current)) if score <= current => {}
                _ => best = Some((index, score)),
            }
        }

        let (index, score) = best.ok_or(SelectionError::NoFiniteScore)?;
        let label = ClassLabel::from_index(index).ok_or(SelectionError::LengthMismatch {
            expected: ClassLabel::COUNT,
            actual: scores.len(),
        })?;

        Ok(Self {
            label,
            index,
            score,
        })
    }

    pub fn confidence_percent(&self) -> f32 {
        self.score * 100.0
    }

    pub fn formatted_confidence(&self) -> String {
        format!("{:.2}%", self.confidence_percent())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: ClassLabel,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResponse {
    pub prediction: ClassLabel,
    pub confidence: String,
    pub confidence_percent: f32,
    pub scores: Vec<LabelScore>,
    pub image_path: String,
}

impl InferenceResponse {
    pub fn new(prediction: &Prediction, scores: &[f32], image_path: impl Into<String>) -> Self {
        let scores = ClassLabel::iter()
            .zip(scores.iter().copied())
            .map(|(label, score)| LabelScore { label, score })
            .collect();

        Self {
            prediction: prediction.label,
            confidence: prediction.formatted_confidence(),
            confidence_percent: prediction.confidence_percent(),
            scores,
            image_path: image_path.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn labels_keep_model_order() {
        let names: Vec<&str> = ClassLabel::iter().map(ClassLabel::as_str).collect();
        assert_eq!(
            names,
            vec![
                "Early_Blight",
                "Healthy",
                "Late_Blight",
                "Leaf_Miner",
                "Magnesium_Deficiency",
                "Nitrogen_Deficiency",
                "Potassium_Deficiency",
                "Spotted_Wilt_Virus",
            ]
        );
        assert_eq!(ClassLabel::COUNT, 8);
        assert_eq!(ClassLabel::from_index(2), Some(ClassLabel::LateBlight));
        assert_eq!(ClassLabel::from_index(8), None);
        assert_eq!(ClassLabel::SpottedWiltVirus.index(), 7);
    }

    #[test]
    fn label_string_forms_agree() {
        let label = ClassLabel::MagnesiumDeficiency;
        assert_eq!(label.to_string(), "Magnesium_Deficiency");
        assert_eq!(ClassLabel::from_str("Magnesium_Deficiency").unwrap(), label);
        assert_eq!(
            serde_json::to_string(&label).unwrap(),
            "\"Magnesium_Deficiency\""
        );
    }

    #[test]
    fn picks_highest_score() {
        let scores = [0.01, 0.02, 0.05, 0.7, 0.1, 0.05, 0.04, 0.03];
        let prediction = Prediction::from_scores(&scores).unwrap();
        assert_eq!(prediction.label, ClassLabel::LeafMiner);
        assert_eq!(prediction.index, 3);
        assert_eq!(prediction.formatted_confidence(), "70.00%");
    }

    #[test]
    fn ties_resolve_to_first_index() {
        let scores = [0.1, 0.4, 0.0, 0.4, 0.0, 0.0, 0.1, 0.0];
        let prediction = Prediction::from_scores(&scores).unwrap();
        assert_eq!(prediction.index, 1);
        assert_eq!(prediction.label, ClassLabel::Healthy);
    }

    #[test]
    fn nan_scores_are_skipped() {
        let scores = [f32::NAN, 0.2, 0.3, 0.1, 0.1, 0.1, 0.1, 0.1];
        let prediction = Prediction::from_scores(&scores).unwrap();
        assert_eq!(prediction.label, ClassLabel::LateBlight);

        let all_nan = [f32::NAN; 8];
        assert_eq!(
            Prediction::from_scores(&all_nan),
            Err(SelectionError::NoFiniteScore)
        );
    }

    #[test]
    fn rejects_malformed_vectors() {
        assert_eq!(Prediction::from_scores(&[]), Err(SelectionError::Empty));
        assert_eq!(
            Prediction::from_scores(&[0.5, 0.5]),
            Err(SelectionError::LengthMismatch {
                expected: 8,
                actual: 2
            })
        );
    }

    #[test]
    fn confidence_formats_two_decimals() {
        let prediction = Prediction {
            label: ClassLabel::Healthy,
            index: 1,
            score: 0.98765,
        };
        assert_eq!(prediction.formatted_confidence(), "98.77%");
        assert!((prediction.confidence_percent() - 98.765).abs() < 1e-3);
    }

    #[test]
    fn response_pairs_scores_with_labels() {
        let scores = [0.9, 0.1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let prediction = Prediction::from_scores(&scores).unwrap();
        let response = InferenceResponse::new(&prediction, &scores, "/static/uploaded_image.jpg");

        assert_eq!(response.prediction, ClassLabel::EarlyBlight);
        assert_eq!(response.confidence, "90.00%");
        assert_eq!(response.scores.len(), 8);
        assert_eq!(response.scores[1].label, ClassLabel::Healthy);
        assert_eq!(response.scores[1].score, 0.1);
    }
}
