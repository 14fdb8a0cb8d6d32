use std::collections::BTreeMap;

use crate::iris::Label;

pub fn histogram(values: impl Iterator<Item = Label>) -> (BTreeMap<Label, usize>, usize) {
	let mut histogram = BTreeMap::new();
	let mut len = 0;

	for value in values {
		*histogram.entry(value).or_default() += 1;
		len += 1;
	}

	(histogram, len)
}

pub fn gini_val(histogram: &BTreeMap<Label, usize>, len: usize) -> f64 {
	1.0 - histogram
		.values()
		.map(|&n| (n as f64 / len as f64).powi(2))
		.sum::<f64>()
}

pub fn gini(values: impl Iterator<Item = Label>) -> f64 {
	let (histogram, len) = histogram(values);
	gini_val(&histogram, len)
}

/// Relative frequency of each class `0..n_classes`.
pub fn distribution(values: impl Iterator<Item = Label>, n_classes: usize) -> Vec<f64> {
	let (histogram, len) = histogram(values);
	let mut distribution = vec![0.0; n_classes];

	for (label, n) in histogram {
		if let Some(p) = distribution.get_mut(label) {
			*p = n as f64 / len as f64;
		}
	}

	distribution
}

/// Index of the largest value, the lowest index wins ties.
pub fn argmax(values: &[f64]) -> Label {
	values
		.iter()
		.enumerate()
		.fold((0, f64::MIN), |best, (i, &p)| if p > best.1 { (i, p) } else { best })
		.0
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn gini_of_pure_and_mixed() {
		assert_eq!(gini(vec![1, 1, 1].into_iter()), 0.0);
		assert!((gini(vec![0, 1].into_iter()) - 0.5).abs() < 1e-12);
		assert!((gini(vec![0, 1, 2].into_iter()) - 2.0 / 3.0).abs() < 1e-12);
	}

	#[test]
	fn distribution_covers_missing_classes() {
		assert_eq!(distribution(vec![2, 2, 0, 2].into_iter(), 3), vec![0.25, 0.0, 0.75]);
	}

	#[test]
	fn argmax_prefers_first_on_ties() {
		assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
		assert_eq!(argmax(&[1.0]), 0);
	}
}
