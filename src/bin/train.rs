//! Trains the random forest on the iris split, then writes the model and
//! the evaluation plots.

use std::io;

use env_logger::Env;
use iris_classifier::app;
use iris_classifier::config::TrainConfig;
use iris_classifier::plot::PngPlotter;
use iris_classifier::random_forest::RandomForestClassifier;
use iris_classifier::AppError;
use log::error;

fn main() {
	env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

	if let Err(err) = run() {
		error!("{}", err);
		std::process::exit(1);
	}
}

fn run() -> Result<(), AppError> {
	let config = TrainConfig::from_env()?;
	let mut classifier = RandomForestClassifier::new(config.forest.clone());
	let mut plotter = PngPlotter::default();

	let summary = app::train(&config, &mut classifier, &mut plotter, &mut io::stdout().lock())?;

	println!(
		"Done: accuracy {:.3} on {} test samples, model at {}",
		summary.accuracy,
		summary.test_samples,
		summary.model_path.display()
	);

	Ok(())
}
