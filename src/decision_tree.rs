use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use rand::seq::SliceRandom as _;
use rand::Rng;
use std::collections::BTreeMap;
use std::io::{Read, Write};

use crate::dataset::Dataset;
use crate::functions::{self, distribution, gini, gini_val};
use crate::iris::Label;
use crate::node::{Node, Split};

// Sliding window of gini
// https://arxiv.org/pdf/1403.6348.pdf
#[derive(Default)]
struct SlidingGini {
	n: usize,
	ni: BTreeMap<Label, usize>,
	g: f64,
}

impl SlidingGini {
	pub fn new(targets: impl Iterator<Item = Label>) -> Self {
		let (histogram, len) = functions::histogram(targets);

		Self {
			n: len,
			g: gini_val(&histogram, len),
			ni: histogram,
		}
	}

	pub fn inc(&mut self, typ: Label) {
		let entry = self.ni.entry(typ).or_insert(0);
		*entry += 1;
		self.n += 1;
		self.g = 1.0 - 1.0 / (self.n as f64).powi(2) * (((self.n - 1) as f64).powi(2) * (1.0 - self.g) + 2.0 * *entry as f64 - 1.0);
	}

	pub fn dec(&mut self, typ: Label) {
		let entry = self.ni.entry(typ).or_insert(0);
		*entry -= 1;
		self.n -= 1;
		self.g = 1.0 - 1.0 / (self.n as f64).powi(2) * (((self.n + 1) as f64).powi(2) * (1.0 - self.g) - 2.0 * *entry as f64 - 1.0);
	}

	pub fn gini(&self) -> f64 {
		self.g
	}
}

struct NodeBuilder<R> {
	max_features: usize,
	max_depth: usize,
	n_classes: usize,
	importances: Vec<f64>,
	rng: R,
}

impl<R: Rng> NodeBuilder<R> {
	fn build(&mut self, dataset: &mut Dataset, depth: usize) -> Node {
		let impurity = gini(dataset.targets());

		if depth > self.max_depth || impurity <= f64::EPSILON {
			return self.leaf(dataset);
		}

		let rows = dataset.rows_len();
		let mut best_split: Option<Split> = None;
		let mut best_gain = 0.0;

		let columns = (0..dataset.features_len()).collect::<Vec<usize>>();
		let max_features = std::cmp::min(columns.len(), self.max_features);
		let chosen = columns
			.choose_multiple(&mut self.rng, max_features)
			.copied()
			.collect::<Vec<_>>();

		for column in chosen {
			dataset.sort(column);

			// Rows move from the right window to the left one as the
			// threshold slides over the sorted column.
			let mut left_window = SlidingGini::default();
			let mut right_window = SlidingGini::new(dataset.targets());
			let mut targets = dataset.targets();
			let mut moved = 0;

			for (left, value) in dataset.get_splits(column) {
				for cls in targets.by_ref().take(left.end - moved) {
					left_window.inc(cls);
					right_window.dec(cls);
				}
				moved = left.end;

				let ratio_l = left.end as f64 / rows as f64;
				let ratio_r = 1.0 - ratio_l;

				let gain = impurity - (ratio_l * left_window.gini() + ratio_r * right_window.gini());

				if best_gain < gain {
					best_split = Some(Split { column, value });
					best_gain = gain;
				}
			}
		}

		match best_split {
			Some(split) => {
				self.importances[split.column] += rows as f64 * best_gain;
				self.build_children(dataset, split, depth)
			}
			None => self.leaf(dataset),
		}
	}

	fn build_children(&mut self, dataset: &mut Dataset, split: Split, depth: usize) -> Node {
		dataset.sort(split.column);

		let split_row = dataset
			.column(split.column)
			.take_while(|&f| f <= split.value)
			.count();

		let (left, right) = dataset.split(split_row, |x| Box::new(self.build(x, depth + 1)));

		Node::Children { left, right, split }
	}

	fn leaf(&self, dataset: &Dataset) -> Node {
		Node::Leaf(distribution(dataset.targets(), self.n_classes))
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
	root: Node,
	importances: Vec<f64>,
}

impl DecisionTree {
	/// Class distribution of the leaf `x` falls into.
	pub fn predict(&self, x: &[f64]) -> &[f64] {
		self.root.predict(x)
	}

	/// Impurity decrease contributed by each feature, summing to 1 unless
	/// the tree is a single leaf.
	pub fn importances(&self) -> &[f64] {
		&self.importances
	}

	pub fn depth(&self) -> usize {
		self.root.depth()
	}

	pub fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
		writer.write_u16::<BigEndian>(self.importances.len() as u16)?;
		for &importance in &self.importances {
			writer.write_f64::<BigEndian>(importance)?;
		}

		self.root.serialize(writer)
	}

	pub fn deserialize<R: Read>(reader: &mut R) -> std::io::Result<Self> {
		let len = reader.read_u16::<BigEndian>()?;
		let importances = (0..len)
			.map(|_| reader.read_f64::<BigEndian>())
			.collect::<std::io::Result<Vec<f64>>>()?;
		let root = Node::deserialize(reader)?;

		Ok(Self { root, importances })
	}
}

#[derive(Debug, Clone)]
pub struct DecisionTreeBuilder {
	pub max_features: Option<usize>,
	pub max_depth: usize,
}

impl Default for DecisionTreeBuilder {
	fn default() -> Self {
		Self {
			max_features: None,
			max_depth: 32,
		}
	}
}

impl DecisionTreeBuilder {
	pub fn fit<R: Rng + ?Sized>(&self, rng: &mut R, mut dataset: Dataset, n_classes: usize) -> DecisionTree {
		let features_len = dataset.features_len();
		let mut builder = NodeBuilder {
			max_features: self.max_features.unwrap_or(features_len),
			max_depth: self.max_depth,
			n_classes,
			importances: vec![0.0; features_len],
			rng,
		};

		let root = builder.build(&mut dataset, 1);

		let mut importances = builder.importances;
		let total: f64 = importances.iter().sum();
		if total > 0.0 {
			importances.iter_mut().for_each(|x| *x /= total);
		}

		DecisionTree { root, importances }
	}
}
