//! Loads the trained model and classifies three example flowers.

use std::io;

use env_logger::Env;
use iris_classifier::app;
use iris_classifier::config::PredictConfig;
use iris_classifier::random_forest::{RandomForestBuilder, RandomForestClassifier};
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
	let config = PredictConfig::from_env();
	let mut classifier = RandomForestClassifier::new(RandomForestBuilder::default());

	// A missing model is reported on stdout and is not an error.
	app::predict(&config, &mut classifier, &mut io::stdout().lock())?;

	Ok(())
}
