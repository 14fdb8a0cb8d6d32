use std::path::PathBuf;

use thiserror::Error;

use crate::iris::Label;

#[derive(Debug, Error, PartialEq)]
pub enum LoaderError {
	#[error("invalid argument: {0}")]
	InvalidArgument(String),
}

#[derive(Debug, Error)]
pub enum ModelError {
	#[error("model file not found: {}", .0.display())]
	NotFound(PathBuf),
	#[error("model has not been trained")]
	NotTrained,
	#[error("cannot train on an empty dataset")]
	EmptyTrainingSet,
	#[error("got {features} feature rows but {labels} labels")]
	LengthMismatch { features: usize, labels: usize },
	#[error("label {0} is not a known class")]
	UnknownLabel(Label),
	#[error("invalid model file: {0}")]
	InvalidData(String),
	#[error("model i/o failed: {0}")]
	Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum PlotError {
	#[error("nothing to plot: {0}")]
	Empty(&'static str),
	#[error("got {values} values but {names} names")]
	LengthMismatch { values: usize, names: usize },
	#[error("{0} must be at least one pixel")]
	ZeroSize(&'static str),
	#[error("failed to prepare {}: {source}", .path.display())]
	CreateDir { path: PathBuf, source: std::io::Error },
	#[error("failed to write image: {0}")]
	Image(#[from] image::ImageError),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
	#[error("invalid value {value:?} for {key}: {reason}")]
	Invalid {
		key: &'static str,
		value: String,
		reason: String,
	},
}

/// Anything that stops the `train` or `predict` binaries.
#[derive(Debug, Error)]
pub enum AppError {
	#[error(transparent)]
	Loader(#[from] LoaderError),
	#[error(transparent)]
	Model(#[from] ModelError),
	#[error(transparent)]
	Plot(#[from] PlotError),
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error("failed to write output: {0}")]
	Output(#[from] std::io::Error),
}
