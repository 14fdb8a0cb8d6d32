//! The `train` and `predict` entry points.
//!
//! Both take the classifier (and plotter) as parameters so the binaries can
//! pass the real random forest while tests pass recording doubles.

use std::io::Write;
use std::path::PathBuf;

use log::{info, warn};

use crate::classifier::Classifier;
use crate::config::{PredictConfig, TrainConfig};
use crate::error::{AppError, ModelError};
use crate::iris::{Label, Sample, N_FEATURES};
use crate::loader;
use crate::plot::Plotter;

/// Hand-picked flowers, roughly one per species.
pub const EXAMPLES: [Sample; 3] = [
	[5.1, 3.5, 1.4, 0.2],
	[6.2, 2.9, 4.3, 1.3],
	[7.3, 2.9, 6.3, 1.8],
];

#[derive(Debug, Clone, PartialEq)]
pub struct TrainSummary {
	pub train_samples: usize,
	pub test_samples: usize,
	pub accuracy: f64,
	pub model_path: PathBuf,
}

pub fn train<C, P, W>(config: &TrainConfig, classifier: &mut C, plotter: &mut P, out: &mut W) -> Result<TrainSummary, AppError>
where
	C: Classifier,
	P: Plotter,
	W: Write,
{
	info!("Splitting dataset to train and test ({:.0}% test, seed {}) ...", config.test_fraction * 100.0, config.seed);
	let split = loader::split(config.test_fraction, config.seed)?;
	info!("test: {}, train: {}", split.test_features.len(), split.train_features.len());

	classifier.train(&split.train_features, &split.train_labels)?;

	info!("Evaluating classifier ...");
	let evaluation = classifier.evaluate(&split.test_features, &split.test_labels)?;

	writeln!(
		out,
		"Trained on {} samples, tested on {} samples",
		split.train_features.len(),
		split.test_features.len()
	)?;
	writeln!(out, "Accuracy: {:.3}", evaluation.accuracy)?;
	writeln!(out)?;
	writeln!(out, "Classification report:")?;
	write!(out, "{}", evaluation.report)?;

	classifier.save(&config.model_path)?;
	writeln!(out, "Model saved to {}", config.model_path.display())?;

	plotter.plot_confusion_matrix(&evaluation.confusion, loader::target_names(), &config.confusion_matrix_path())?;

	let importances = classifier.feature_importances().unwrap_or_else(|| {
		warn!("Classifier does not report feature importances, plotting zeros");
		vec![0.0; N_FEATURES]
	});
	plotter.plot_feature_importance(&importances, loader::feature_names(), &config.feature_importance_path())?;

	Ok(TrainSummary {
		train_samples: split.train_features.len(),
		test_samples: split.test_features.len(),
		accuracy: evaluation.accuracy,
		model_path: config.model_path.clone(),
	})
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
	pub sample: Sample,
	pub label: Label,
	pub probabilities: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictOutcome {
	Predicted(Vec<Prediction>),
	/// No model file; a message telling the user to train first was printed.
	ModelMissing(PathBuf),
}

pub fn predict<C, W>(config: &PredictConfig, classifier: &mut C, out: &mut W) -> Result<PredictOutcome, AppError>
where
	C: Classifier,
	W: Write,
{
	match classifier.load(&config.model_path) {
		Ok(()) => {}
		Err(ModelError::NotFound(path)) => {
			writeln!(out, "Model not found at {}. Run `train` first.", path.display())?;
			return Ok(PredictOutcome::ModelMissing(path));
		}
		Err(err) => return Err(err.into()),
	}

	let names = loader::target_names();
	let name = |label: Label| names.get(label).copied().unwrap_or("unknown");
	let mut predictions = Vec::with_capacity(EXAMPLES.len());

	for (i, sample) in EXAMPLES.iter().enumerate() {
		let label = first(classifier.predict(&[*sample])?)?;
		let probabilities = first(classifier.predict_proba(&[*sample])?)?;

		writeln!(out, "Example {}: {:?}", i + 1, sample)?;
		writeln!(out, "  Predicted species: {}", name(label))?;

		let listed = probabilities
			.iter()
			.enumerate()
			.map(|(class, p)| format!("{}: {:.3}", name(class), p))
			.collect::<Vec<_>>();
		writeln!(out, "  Probabilities: {}", listed.join(", "))?;

		predictions.push(Prediction {
			sample: *sample,
			label,
			probabilities,
		});
	}

	Ok(PredictOutcome::Predicted(predictions))
}

// One sample in, one row out.
fn first<T>(rows: Vec<T>) -> Result<T, ModelError> {
	rows.into_iter()
		.next()
		.ok_or_else(|| ModelError::InvalidData("classifier returned no rows".to_string()))
}
