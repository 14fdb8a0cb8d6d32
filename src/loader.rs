//! The Iris dataset as seen by the training and prediction entry points:
//! a reproducible stratified split, name metadata, a tabular view and a
//! summary record.
//!
//! Every function here is pure. The measurements come from
//! [`iris::load_iris`], which is built once and never mutated.

use std::collections::BTreeMap;
use std::io::Write;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::LoaderError;
use crate::iris::{self, Label, Sample, Species, FEATURE_NAMES, N_FEATURES, TARGET_NAMES};

pub const DEFAULT_TEST_FRACTION: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;

pub const TARGET_COLUMN: &str = "target";
pub const SPECIES_COLUMN: &str = "species";

/// A train/test partition of the 150 iris samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
	pub train_features: Vec<Sample>,
	pub test_features: Vec<Sample>,
	pub train_labels: Vec<Label>,
	pub test_labels: Vec<Label>,
}

/// Splits the dataset so that `test_fraction` of the samples, rounded to the
/// nearest row, end up in the test set.
///
/// Each species is split on its own, so both sides keep the 1/3 share of
/// every class. The same `seed` always gives the same rows in the same order.
pub fn split(test_fraction: f64, seed: u64) -> Result<Split, LoaderError> {
	if !(test_fraction > 0.0 && test_fraction < 1.0) {
		return Err(LoaderError::InvalidArgument(format!(
			"test fraction must be within (0, 1), got {}",
			test_fraction
		)));
	}

	let mut rng = StdRng::seed_from_u64(seed);
	let (train, test) = iris::load_iris().build().stratified_split(&mut rng, test_fraction)?;

	Ok(Split {
		train_features: samples(&train),
		test_features: samples(&test),
		train_labels: train.targets().collect(),
		test_labels: test.targets().collect(),
	})
}

fn samples(dataset: &Dataset) -> Vec<Sample> {
	dataset.rows().map(|row| std::array::from_fn(|j| row[j])).collect()
}

pub fn feature_names() -> &'static [&'static str] {
	&FEATURE_NAMES
}

/// Species names, indexed by label.
pub fn target_names() -> &'static [&'static str] {
	&TARGET_NAMES
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
	pub features: Sample,
	pub target: Label,
	pub species: &'static str,
}

/// Denormalized rows of the dataset: features, label and species name.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
	rows: Vec<TableRow>,
}

impl Table {
	pub fn columns(&self) -> Vec<&'static str> {
		FEATURE_NAMES
			.iter()
			.copied()
			.chain([TARGET_COLUMN, SPECIES_COLUMN])
			.collect()
	}

	pub fn n_rows(&self) -> usize {
		self.rows.len()
	}

	pub fn n_columns(&self) -> usize {
		N_FEATURES + 2
	}

	pub fn rows(&self) -> &[TableRow] {
		&self.rows
	}

	pub fn feature_column(&self, column: usize) -> impl Iterator<Item = f64> + '_ {
		self.rows.iter().map(move |row| row.features[column])
	}

	pub fn target_column(&self) -> impl Iterator<Item = Label> + '_ {
		self.rows.iter().map(|row| row.target)
	}

	pub fn species_column(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.rows.iter().map(|row| row.species)
	}

	/// Occurrences of each species name.
	pub fn species_counts(&self) -> BTreeMap<&'static str, usize> {
		let mut counts = BTreeMap::new();

		for species in self.species_column() {
			*counts.entry(species).or_default() += 1;
		}

		counts
	}

	pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
		let mut writer = csv::Writer::from_writer(writer);
		writer.write_record(self.columns())?;

		for row in &self.rows {
			let mut record = row.features.iter().map(|x| x.to_string()).collect::<Vec<_>>();
			record.push(row.target.to_string());
			record.push(row.species.to_string());
			writer.write_record(&record)?;
		}

		writer.flush()?;
		Ok(())
	}
}

pub fn as_table() -> Table {
	let dataset = iris::load_iris().build();

	let rows = samples(&dataset)
		.into_iter()
		.zip(dataset.targets())
		.map(|(features, target)| TableRow {
			features,
			target,
			species: Species::from_label(target).map_or("unknown", Species::name),
		})
		.collect();

	Table { rows }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetInfo {
	pub feature_names: Vec<&'static str>,
	pub target_names: Vec<&'static str>,
	pub n_samples: usize,
	pub n_features: usize,
	pub n_classes: usize,
	pub class_distribution: BTreeMap<&'static str, usize>,
}

/// Summary of the dataset, recomputed from [`as_table`] on every call.
pub fn dataset_info() -> DatasetInfo {
	let table = as_table();
	let class_distribution = table.species_counts();

	DatasetInfo {
		feature_names: feature_names().to_vec(),
		target_names: target_names().to_vec(),
		n_samples: table.n_rows(),
		n_features: feature_names().len(),
		n_classes: class_distribution.len(),
		class_distribution,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BTreeSet;

	fn label_set(labels: &[Label]) -> BTreeSet<Label> {
		labels.iter().copied().collect()
	}

	#[test]
	fn default_split_shapes() {
		let split = split(DEFAULT_TEST_FRACTION, DEFAULT_SEED).unwrap();

		assert_eq!(split.train_features.len(), 120);
		assert_eq!(split.test_features.len(), 30);
		assert_eq!(split.train_labels.len(), split.train_features.len());
		assert_eq!(split.test_labels.len(), split.test_features.len());
		assert!(split.train_labels.iter().chain(&split.test_labels).all(|&y| y <= 2));
	}

	#[test]
	fn split_is_reproducible() {
		for seed in 0..20 {
			assert_eq!(split(0.2, seed).unwrap(), split(0.2, seed).unwrap());
		}
	}

	#[test]
	fn different_seeds_give_different_splits() {
		let reference = split(0.2, 42).unwrap();

		for seed in (0..50).filter(|&s| s != 42) {
			let other = split(0.2, seed).unwrap();

			assert_ne!(other.test_features, reference.test_features, "seed {}", seed);
			assert_ne!(other.train_features, reference.train_features, "seed {}", seed);
		}
	}

	#[test]
	fn realized_fraction_matches_request() {
		for &fraction in &[0.1, 0.2, 0.3] {
			let split = split(fraction, 7).unwrap();
			let total = split.train_features.len() + split.test_features.len();
			let realized = split.test_features.len() as f64 / total as f64;

			assert_eq!(total, 150);
			assert!((realized - fraction).abs() <= 0.05, "{} gave {}", fraction, realized);
		}
	}

	#[test]
	fn split_is_stratified() {
		for &fraction in &[0.1, 0.2, 0.25, 0.3, 0.4] {
			for seed in 0..10 {
				let split = split(fraction, seed).unwrap();

				assert_eq!(label_set(&split.train_labels), label_set(&[0, 1, 2]));
				assert_eq!(label_set(&split.test_labels), label_set(&[0, 1, 2]));

				let n_test = split.test_labels.len() as f64;
				for label in 0..3 {
					let count = split.test_labels.iter().filter(|&&y| y == label).count() as f64;
					assert!((count - n_test / 3.0).abs() <= 1.0);
				}
			}
		}
	}

	#[test]
	fn split_partitions_the_dataset() {
		let split = split(0.3, 3).unwrap();
		let table = as_table();

		let mut seen = split
			.train_features
			.iter()
			.chain(&split.test_features)
			.zip(split.train_labels.iter().chain(&split.test_labels))
			.map(|(x, &y)| (format!("{:?}", x), y))
			.collect::<Vec<_>>();
		let mut all = table
			.rows()
			.iter()
			.map(|row| (format!("{:?}", row.features), row.target))
			.collect::<Vec<_>>();

		seen.sort();
		all.sort();
		assert_eq!(seen, all);
	}

	#[test]
	fn invalid_fraction_is_rejected() {
		for &fraction in &[0.0, 1.0, -0.2, 1.5, f64::NAN] {
			assert!(matches!(split(fraction, 42), Err(LoaderError::InvalidArgument(_))), "{}", fraction);
		}

		// Too few test rows to hold every class
		assert!(matches!(split(0.005, 42), Err(LoaderError::InvalidArgument(_))));
	}

	#[test]
	fn feature_names_describe_measurements() {
		let names = feature_names();
		let joined = names.join(" ").to_lowercase();

		assert_eq!(names.len(), 4);
		for word in &["sepal", "petal", "length", "width"] {
			assert!(joined.contains(word));
		}
	}

	#[test]
	fn target_names_follow_labels() {
		assert_eq!(target_names(), &["setosa", "versicolor", "virginica"]);
	}

	#[test]
	fn table_shape_and_columns() {
		let table = as_table();

		assert_eq!(table.n_rows(), 150);
		assert_eq!(table.n_columns(), 6);
		assert_eq!(table.columns().len(), table.n_columns());
		assert!(table.columns().contains(&TARGET_COLUMN));
		assert!(table.columns().contains(&SPECIES_COLUMN));

		let targets = table.target_column().collect::<Vec<_>>();
		assert_eq!(targets.iter().min(), Some(&0));
		assert_eq!(targets.iter().max(), Some(&2));
		for label in 0..3 {
			assert_eq!(targets.iter().filter(|&&y| y == label).count(), 50);
		}

		let species = table.species_counts();
		assert_eq!(species.len(), 3);
		assert!(species.values().all(|&n| n == 50));
		assert!(table.rows().iter().all(|row| target_names()[row.target] == row.species));
		assert_eq!(table.feature_column(0).next(), Some(5.1));
	}

	#[test]
	fn table_exports_csv() {
		let mut buffer = Vec::new();
		as_table().write_csv(&mut buffer).unwrap();

		let text = String::from_utf8(buffer).unwrap();
		let mut lines = text.lines();

		assert_eq!(
			lines.next(),
			Some("sepal length (cm),sepal width (cm),petal length (cm),petal width (cm),target,species")
		);
		assert_eq!(lines.next(), Some("5.1,3.5,1.4,0.2,0,setosa"));
		assert_eq!(text.lines().count(), 151);
		assert_eq!(text.lines().last(), Some("5.9,3,5.1,1.8,2,virginica"));
	}

	#[test]
	fn dataset_info_is_consistent() {
		let info = dataset_info();

		assert_eq!(info.n_samples, 150);
		assert_eq!(info.n_features, 4);
		assert_eq!(info.n_classes, 3);
		assert_eq!(info.feature_names, feature_names());
		assert_eq!(info.target_names, target_names());
		assert_eq!(info.class_distribution.len(), 3);
		assert!(info.class_distribution.values().all(|&n| n == 50));
		assert_eq!(info.class_distribution, as_table().species_counts());
	}

	#[test]
	fn dataset_info_serializes_expected_keys() {
		let value = serde_json::to_value(dataset_info()).unwrap();

		for key in &["feature_names", "target_names", "n_samples", "n_features", "n_classes", "class_distribution"] {
			assert!(value.get(key).is_some(), "missing {}", key);
		}
		assert_eq!(value["class_distribution"]["setosa"], 50);
	}
}
