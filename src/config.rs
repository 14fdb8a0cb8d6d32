use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ConfigError;
use crate::loader::{DEFAULT_SEED, DEFAULT_TEST_FRACTION};
use crate::random_forest::{RandomForestBuilder, MAX_TREES};

pub const MODEL_PATH: &str = "models/iris_classifier.pkl";
pub const PLOT_DIR: &str = "plots";
pub const CONFUSION_MATRIX_FILE: &str = "confusion_matrix.png";
pub const FEATURE_IMPORTANCE_FILE: &str = "feature_importance.png";

pub const ENV_TEST_FRACTION: &str = "IRIS_TEST_FRACTION";
pub const ENV_SEED: &str = "IRIS_SEED";
pub const ENV_MODEL_PATH: &str = "IRIS_MODEL_PATH";
pub const ENV_PLOT_DIR: &str = "IRIS_PLOT_DIR";
pub const ENV_N_TREES: &str = "IRIS_N_TREES";
pub const ENV_MAX_DEPTH: &str = "IRIS_MAX_DEPTH";

#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
	pub test_fraction: f64,
	/// Seeds both the split and the forest.
	pub seed: u64,
	pub model_path: PathBuf,
	pub plot_dir: PathBuf,
	pub forest: RandomForestBuilder,
}

impl Default for TrainConfig {
	fn default() -> Self {
		Self {
			test_fraction: DEFAULT_TEST_FRACTION,
			seed: DEFAULT_SEED,
			model_path: PathBuf::from(MODEL_PATH),
			plot_dir: PathBuf::from(PLOT_DIR),
			forest: RandomForestBuilder {
				seed: DEFAULT_SEED,
				..RandomForestBuilder::default()
			},
		}
	}
}

impl TrainConfig {
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Defaults overridden by whichever `IRIS_*` variables `lookup` knows.
	pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
		let mut config = Self::default();

		if let Some(test_fraction) = parse::<f64, _>(&lookup, ENV_TEST_FRACTION)? {
			config.test_fraction = test_fraction;
		}
		if let Some(seed) = parse::<u64, _>(&lookup, ENV_SEED)? {
			config.seed = seed;
			config.forest.seed = seed;
		}
		if let Some(path) = lookup(ENV_MODEL_PATH) {
			config.model_path = PathBuf::from(path);
		}
		if let Some(dir) = lookup(ENV_PLOT_DIR) {
			config.plot_dir = PathBuf::from(dir);
		}
		if let Some(n_trees) = parse::<usize, _>(&lookup, ENV_N_TREES)? {
			if n_trees == 0 {
				return Err(invalid(ENV_N_TREES, "0", "need at least one tree"));
			}
			if n_trees > MAX_TREES {
				return Err(invalid(
					ENV_N_TREES,
					&n_trees.to_string(),
					&format!("at most {} trees can be saved", MAX_TREES),
				));
			}
			config.forest.n_trees = n_trees;
		}
		if let Some(max_depth) = parse::<usize, _>(&lookup, ENV_MAX_DEPTH)? {
			config.forest.max_depth = max_depth;
		}

		Ok(config)
	}

	/// Moves relative output paths under `root`.
	pub fn within(mut self, root: &Path) -> Self {
		self.model_path = root.join(&self.model_path);
		self.plot_dir = root.join(&self.plot_dir);
		self
	}

	pub fn confusion_matrix_path(&self) -> PathBuf {
		self.plot_dir.join(CONFUSION_MATRIX_FILE)
	}

	pub fn feature_importance_path(&self) -> PathBuf {
		self.plot_dir.join(FEATURE_IMPORTANCE_FILE)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictConfig {
	pub model_path: PathBuf,
}

impl Default for PredictConfig {
	fn default() -> Self {
		Self {
			model_path: PathBuf::from(MODEL_PATH),
		}
	}
}

impl PredictConfig {
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
		lookup(ENV_MODEL_PATH)
			.map(|path| Self {
				model_path: PathBuf::from(path),
			})
			.unwrap_or_default()
	}

	pub fn within(mut self, root: &Path) -> Self {
		self.model_path = root.join(&self.model_path);
		self
	}
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
	T: FromStr,
	T::Err: std::fmt::Display,
	F: Fn(&str) -> Option<String>,
{
	match lookup(key) {
		None => Ok(None),
		Some(value) => value
			.trim()
			.parse()
			.map(Some)
			.map_err(|err: T::Err| invalid(key, &value, &err.to_string())),
	}
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
	ConfigError::Invalid {
		key,
		value: value.to_string(),
		reason: reason.to_string(),
	}
}
