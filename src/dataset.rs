use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::ops::Range;

use ordered_float::OrderedFloat;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::LoaderError;
use crate::iris::Label;

/// A view over the rows of a [`Builder`].
///
/// The view never copies feature data: it owns an index into the builder's
/// columns and an active `range` of that index, so sorting, splitting and
/// bootstrapping only move row numbers around.
#[derive(Clone, Debug)]
pub struct Dataset<'a> {
	columns: &'a [Vec<f64>],
	targets: &'a [Label],

	index: Vec<usize>,
	range: Range<usize>,
}

impl<'a, 'b> Dataset<'a> {
	pub fn sort(&mut self, column: usize) {
		let values = &self.columns[column];

		self.index[self.range.start..self.range.end].sort_by_key(|&x| OrderedFloat(values[x]));
	}

	/// Candidate thresholds of a column sorted with [`Dataset::sort`].
	///
	/// Yields the rows left of the threshold and the midpoint between the two
	/// neighbouring distinct values.
	pub fn get_splits(&'b self, column: usize) -> impl 'b + Iterator<Item = (Range<usize>, f64)> {
		let column = &self.columns[column];

		self.indices()
			.map(move |x| column[x])
			.enumerate()
			.scan(None, |prev: &mut Option<f64>, (i, x)| {
				let split = match *prev {
					Some(y) if (x - y).abs() > f64::EPSILON => Some((0..i, (x + y) / 2.0)),
					_ => None,
				};

				*prev = Some(x);
				Some(split)
			})
			.flatten()
	}

	pub fn split<F, T>(&mut self, row: usize, mut f: F) -> (T, T)
	where
		F: FnMut(&mut Self) -> T,
	{
		let row = row + self.range.start;
		let original = self.range.clone();

		self.range.end = row;
		let left = f(self);
		self.range.end = original.end;

		self.range.start = row;
		let right = f(self);
		self.range.start = original.start;

		(left, right)
	}

	/// Partitions the rows into `(train, test)` keeping every class's share
	/// of the rows in both halves, up to rounding.
	pub fn stratified_split<R: Rng + ?Sized>(self, rng: &mut R, test_rate: f64) -> Result<(Self, Self), LoaderError> {
		let rows = self.rows_len();
		let test_num = (rows as f64 * test_rate).round() as usize;

		let mut classes: BTreeMap<Label, Vec<usize>> = BTreeMap::new();
		for i in self.indices() {
			classes.entry(self.targets[i]).or_default().push(i);
		}

		if test_num < classes.len() || rows - test_num.min(rows) < classes.len() {
			return Err(LoaderError::InvalidArgument(format!(
				"test fraction {} gives {} test rows out of {}, each side needs at least one row of each of the {} classes",
				test_rate,
				test_num,
				rows,
				classes.len(),
			)));
		}

		let counts = classes.values().map(Vec::len).collect::<Vec<_>>();
		let allocation = allocate(test_num, &counts, rng);

		let mut train_index = Vec::with_capacity(rows - test_num);
		let mut test_index = Vec::with_capacity(test_num);

		for (mut members, take) in classes.into_values().zip(allocation) {
			members.shuffle(rng);
			test_index.extend_from_slice(&members[..take]);
			train_index.extend_from_slice(&members[take..]);
		}

		train_index.shuffle(rng);
		test_index.shuffle(rng);

		Ok((self.with_index(train_index), self.with_index(test_index)))
	}

	pub fn bootstrap<R: Rng + ?Sized>(&self, rng: &mut R, max_samples: usize) -> Self {
		let samples = std::cmp::min(max_samples, self.rows_len());

		let index = (0..samples)
			.map(|_| self.index[rng.gen_range(self.range.start, self.range.end)])
			.collect::<Vec<_>>();

		self.with_index(index)
	}

	fn with_index(&self, index: Vec<usize>) -> Self {
		Self {
			range: 0..index.len(),
			index,
			columns: self.columns,
			targets: self.targets,
		}
	}

	fn indices(&'b self) -> impl 'b + Iterator<Item = usize> + Clone {
		self.index[self.range.start..self.range.end].iter().copied()
	}

	pub fn targets(&'b self) -> impl 'b + Iterator<Item = Label> {
		self.indices().map(move |i| self.targets[i])
	}

	pub fn column(&'b self, column: usize) -> impl 'b + Iterator<Item = f64> {
		let column = &self.columns[column];

		self.indices().map(move |i| column[i])
	}

	pub fn features_len(&self) -> usize {
		self.columns.len()
	}

	pub fn rows_len(&self) -> usize {
		self.range.end - self.range.start
	}

	pub fn rows(&'b self) -> impl 'b + Iterator<Item = Vec<f64>> {
		self.indices().map(move |i| self.columns.iter().map(|column| column[i]).collect())
	}

	pub fn class_counts(&self) -> BTreeMap<Label, usize> {
		let mut counts = BTreeMap::new();

		for y in self.targets() {
			*counts.entry(y).or_default() += 1;
		}

		counts
	}
}

/// Splits `total` over groups proportionally to `counts` by largest
/// remainder. Equal remainders are ordered randomly.
fn allocate<R: Rng + ?Sized>(total: usize, counts: &[usize], rng: &mut R) -> Vec<usize> {
	let rows: usize = counts.iter().sum();
	let exact = counts
		.iter()
		.map(|&n| total as f64 * n as f64 / rows as f64)
		.collect::<Vec<_>>();

	let mut allocation = exact.iter().map(|x| x.floor() as usize).collect::<Vec<_>>();
	let mut left = total - allocation.iter().sum::<usize>();

	let mut order = (0..counts.len()).collect::<Vec<_>>();
	order.shuffle(rng);
	order.sort_by_key(|&i| Reverse(OrderedFloat(exact[i] - allocation[i] as f64)));

	for i in order.into_iter().cycle().take(counts.len() * 2) {
		if left == 0 {
			break;
		}

		if allocation[i] < counts[i] {
			allocation[i] += 1;
			left -= 1;
		}
	}

	allocation
}

#[derive(Debug, Default)]
pub struct Builder {
	columns: Vec<Vec<f64>>,
	targets: Vec<Label>,
}

impl Builder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_samples<S: AsRef<[f64]>>(features: &[S], labels: &[Label]) -> Self {
		let mut builder = Self::new();

		for (x, &y) in features.iter().zip(labels) {
			builder.add(x.as_ref(), y);
		}

		builder
	}

	pub fn build(&self) -> Dataset {
		let range = 0..self.targets.len();

		Dataset {
			columns: &self.columns,
			targets: &self.targets,

			range: range.clone(),
			index: range.collect(),
		}
	}

	pub fn add(&mut self, x: &[f64], y: Label) {
		if self.columns.is_empty() {
			self.columns = vec![Vec::new(); x.len()];
		}

		for (column, value) in self.columns.iter_mut().zip(x) {
			column.push(*value);
		}

		self.targets.push(y);
	}

	pub fn len(&self) -> usize {
		self.targets.len()
	}

	pub fn is_empty(&self) -> bool {
		self.targets.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::rngs::StdRng;
	use rand::SeedableRng;

	fn toy() -> Builder {
		let mut builder = Builder::new();

		for i in 0..20 {
			builder.add(&[i as f64, (20 - i) as f64], i % 2);
		}

		builder
	}

	#[test]
	fn sort_and_get_splits() {
		let mut builder = Builder::new();
		for &(x, y) in &[(3.0, 0), (1.0, 0), (2.0, 1), (2.0, 1), (5.0, 1)] {
			builder.add(&[x], y);
		}

		let mut dataset = builder.build();
		dataset.sort(0);

		assert_eq!(dataset.column(0).collect::<Vec<_>>(), vec![1.0, 2.0, 2.0, 3.0, 5.0]);
		assert_eq!(
			dataset.get_splits(0).collect::<Vec<_>>(),
			vec![(0..1, 1.5), (0..3, 2.5), (0..4, 4.0)]
		);
	}

	#[test]
	fn split_restores_range() {
		let builder = toy();
		let mut dataset = builder.build();

		let (left, right) = dataset.split(5, |x| x.rows_len());

		assert_eq!((left, right), (5, 15));
		assert_eq!(dataset.rows_len(), 20);
	}

	#[test]
	fn stratified_split_keeps_class_shares() {
		let builder = toy();
		let mut rng = StdRng::seed_from_u64(7);

		let (train, test) = builder.build().stratified_split(&mut rng, 0.2).unwrap();

		assert_eq!(train.rows_len(), 16);
		assert_eq!(test.rows_len(), 4);
		assert_eq!(test.class_counts().into_iter().collect::<Vec<_>>(), vec![(0, 2), (1, 2)]);

		let mut all = train.column(0).chain(test.column(0)).collect::<Vec<_>>();
		all.sort_by_key(|&x| OrderedFloat(x));
		assert_eq!(all, (0..20).map(|x| x as f64).collect::<Vec<_>>());
	}

	#[test]
	fn stratified_split_rejects_unrepresentable_classes() {
		let builder = toy();
		let mut rng = StdRng::seed_from_u64(7);

		assert!(builder.build().stratified_split(&mut rng, 0.01).is_err());
		assert!(builder.build().stratified_split(&mut rng, 0.99).is_err());
	}

	#[test]
	fn allocate_uses_largest_remainder() {
		let mut rng = StdRng::seed_from_u64(0);

		assert_eq!(allocate(30, &[50, 50, 50], &mut rng), vec![10, 10, 10]);
		assert_eq!(allocate(10, &[60, 30, 10], &mut rng), vec![6, 3, 1]);
		assert_eq!(allocate(4, &[6, 2], &mut rng), vec![3, 1]);

		let uneven = allocate(38, &[50, 50, 50], &mut rng);
		assert_eq!(uneven.iter().sum::<usize>(), 38);
		assert!(uneven.iter().all(|&n| n == 12 || n == 13));
	}

	#[test]
	fn bootstrap_draws_from_active_rows() {
		let builder = toy();
		let mut rng = StdRng::seed_from_u64(1);
		let mut dataset = builder.build();
		dataset.sort(0);

		let (low, _) = dataset.split(5, |x| x.bootstrap(&mut rng, 100));

		assert_eq!(low.rows_len(), 5);
		assert!(low.column(0).all(|x| x < 5.0));
	}

	#[test]
	fn from_samples_builds_columns() {
		let builder = Builder::from_samples(&[[1.0, 2.0], [3.0, 4.0]], &[0, 1]);
		let dataset = builder.build();

		assert_eq!(builder.len(), 2);
		assert_eq!(dataset.rows().collect::<Vec<_>>(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
		assert_eq!(dataset.targets().collect::<Vec<_>>(), vec![0, 1]);
	}
}
