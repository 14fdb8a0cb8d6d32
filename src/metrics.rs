//! Evaluation metrics for classification models.

use std::fmt::Write as _;

use crate::iris::Label;

/// Confusion matrix for a `K`-class classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
	pub n_classes: usize,
	/// Row-major `KxK` counts (`truth * K + predicted`).
	pub counts: Vec<u32>,
}

impl ConfusionMatrix {
	pub fn new(n_classes: usize) -> Self {
		Self {
			n_classes,
			counts: vec![0; n_classes * n_classes],
		}
	}

	/// Pairs outside `0..n_classes` are ignored.
	pub fn from_predictions(truth: &[Label], predicted: &[Label], n_classes: usize) -> Self {
		let mut matrix = Self::new(n_classes);

		for (&t, &p) in truth.iter().zip(predicted) {
			matrix.add(t, p);
		}

		matrix
	}

	pub fn add(&mut self, truth: Label, predicted: Label) {
		if truth >= self.n_classes || predicted >= self.n_classes {
			return;
		}

		let idx = truth * self.n_classes + predicted;
		self.counts[idx] = self.counts[idx].saturating_add(1);
	}

	pub fn get(&self, truth: Label, predicted: Label) -> u32 {
		self.counts[truth * self.n_classes + predicted]
	}

	pub fn total(&self) -> u32 {
		self.counts.iter().sum()
	}

	pub fn accuracy(&self) -> f64 {
		let total = self.total();
		if total == 0 {
			return 0.0;
		}

		let correct: u32 = (0..self.n_classes).map(|i| self.get(i, i)).sum();
		correct as f64 / total as f64
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerClassStats {
	/// `TP / (TP + FP)`.
	pub precision: f64,
	/// `TP / (TP + FN)`.
	pub recall: f64,
	pub f1: f64,
	/// Number of true examples of the class.
	pub support: u32,
}

pub fn per_class_stats(matrix: &ConfusionMatrix) -> Vec<PerClassStats> {
	let k = matrix.n_classes;

	(0..k)
		.map(|class| {
			let tp = matrix.get(class, class) as f64;
			let support: u32 = (0..k).map(|j| matrix.get(class, j)).sum();
			let predicted: u32 = (0..k).map(|i| matrix.get(i, class)).sum();

			let precision = ratio(tp, predicted as f64);
			let recall = ratio(tp, support as f64);
			let f1 = ratio(2.0 * precision * recall, precision + recall);

			PerClassStats {
				precision,
				recall,
				f1,
				support,
			}
		})
		.collect()
}

fn ratio(num: f64, den: f64) -> f64 {
	if den > 0.0 {
		num / den
	} else {
		0.0
	}
}

/// Plain-text precision/recall/f1 table with accuracy and averages.
pub fn classification_report(matrix: &ConfusionMatrix, class_names: &[&str]) -> String {
	let stats = per_class_stats(matrix);
	let total = matrix.total();
	let width = class_names
		.iter()
		.map(|name| name.len())
		.chain(std::iter::once("weighted avg".len()))
		.max()
		.unwrap_or_default();

	let mut report = String::new();
	let _ = writeln!(report, "{:>width$} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support");
	let _ = writeln!(report);

	for (class, s) in stats.iter().enumerate() {
		let name = class_names.get(class).copied().unwrap_or("?");
		let _ = writeln!(
			report,
			"{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
			name, s.precision, s.recall, s.f1, s.support
		);
	}

	let _ = writeln!(report);
	let _ = writeln!(report, "{:>width$} {:>9} {:>9} {:>9.2} {:>9}", "accuracy", "", "", matrix.accuracy(), total);

	let k = stats.len().max(1) as f64;
	let macro_avg = |f: fn(&PerClassStats) -> f64| stats.iter().map(f).sum::<f64>() / k;
	let weighted_avg = |f: fn(&PerClassStats) -> f64| {
		ratio(stats.iter().map(|s| f(s) * s.support as f64).sum::<f64>(), total as f64)
	};

	let _ = writeln!(
		report,
		"{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
		"macro avg",
		macro_avg(|s| s.precision),
		macro_avg(|s| s.recall),
		macro_avg(|s| s.f1),
		total
	);
	let _ = writeln!(
		report,
		"{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
		"weighted avg",
		weighted_avg(|s| s.precision),
		weighted_avg(|s| s.recall),
		weighted_avg(|s| s.f1),
		total
	);

	report
}

#[cfg(test)]
mod tests {
	use super::*;

	fn matrix() -> ConfusionMatrix {
		ConfusionMatrix::from_predictions(&[0, 0, 1, 1, 2, 2], &[0, 0, 1, 2, 2, 2], 3)
	}

	#[test]
	fn counts_and_accuracy() {
		let m = matrix();

		assert_eq!(m.get(1, 2), 1);
		assert_eq!(m.get(2, 2), 2);
		assert_eq!(m.total(), 6);
		assert!((m.accuracy() - 5.0 / 6.0).abs() < 1e-12);
	}

	#[test]
	fn out_of_range_pairs_are_ignored() {
		let mut m = ConfusionMatrix::new(2);
		m.add(0, 5);
		m.add(3, 1);

		assert_eq!(m.total(), 0);
		assert_eq!(m.accuracy(), 0.0);
	}

	#[test]
	fn precision_and_recall() {
		let stats = per_class_stats(&matrix());

		assert_eq!(stats[0].precision, 1.0);
		assert_eq!(stats[1].recall, 0.5);
		assert!((stats[2].precision - 2.0 / 3.0).abs() < 1e-12);
		assert_eq!(stats[2].support, 2);
	}

	#[test]
	fn report_lists_every_class() {
		let report = classification_report(&matrix(), &["setosa", "versicolor", "virginica"]);

		for needle in &["precision", "setosa", "versicolor", "virginica", "accuracy", "macro avg", "weighted avg"] {
			assert!(report.contains(needle), "missing {} in\n{}", needle, report);
		}
		assert!(report.contains("0.83"));
	}
}
