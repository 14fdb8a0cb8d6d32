use std::path::Path;

use crate::error::ModelError;
use crate::iris::{Label, Sample, N_CLASSES, TARGET_NAMES};
use crate::metrics::{classification_report, ConfusionMatrix};

/// Outcome of [`Classifier::evaluate`].
#[derive(Debug, Clone)]
pub struct Evaluation {
	pub accuracy: f64,
	pub report: String,
	pub confusion: ConfusionMatrix,
}

/// A model that can be trained on iris samples and persisted to disk.
pub trait Classifier {
	fn train(&mut self, features: &[Sample], labels: &[Label]) -> Result<(), ModelError>;

	fn predict(&self, features: &[Sample]) -> Result<Vec<Label>, ModelError>;

	/// One row per sample with the probability of each class.
	fn predict_proba(&self, features: &[Sample]) -> Result<Vec<Vec<f64>>, ModelError>;

	fn evaluate(&self, features: &[Sample], labels: &[Label]) -> Result<Evaluation, ModelError> {
		if features.len() != labels.len() {
			return Err(ModelError::LengthMismatch {
				features: features.len(),
				labels: labels.len(),
			});
		}

		let predicted = self.predict(features)?;
		let confusion = ConfusionMatrix::from_predictions(labels, &predicted, N_CLASSES);

		Ok(Evaluation {
			accuracy: confusion.accuracy(),
			report: classification_report(&confusion, &TARGET_NAMES),
			confusion,
		})
	}

	/// Relative importance of each feature, if the model tracks it.
	fn feature_importances(&self) -> Option<Vec<f64>> {
		None
	}

	fn save(&self, path: &Path) -> Result<(), ModelError>;

	/// Replaces the model with the one stored at `path`.
	///
	/// A missing file is reported as [`ModelError::NotFound`].
	fn load(&mut self, path: &Path) -> Result<(), ModelError>;
}
