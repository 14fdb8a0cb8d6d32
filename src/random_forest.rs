use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::Instant;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::classifier::Classifier;
use crate::dataset::{Builder, Dataset};
use crate::decision_tree::{DecisionTree, DecisionTreeBuilder};
use crate::error::ModelError;
use crate::functions::argmax;
use crate::iris::{Label, Sample, N_CLASSES, N_FEATURES};

const MAGIC: &[u8; 4] = b"IRRF";
const VERSION: u16 = 1;

/// Largest forest the model file can describe.
pub const MAX_TREES: usize = u16::MAX as usize;

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestBuilder {
	pub n_trees: usize,
	pub max_depth: usize,
	/// Share of the training rows drawn (with replacement) for each tree.
	pub bag_amount: f64,
	pub seed: u64,
}

impl Default for RandomForestBuilder {
	fn default() -> Self {
		Self {
			n_trees: 100,
			max_depth: 32,
			bag_amount: 0.5,
			seed: 42,
		}
	}
}

impl RandomForestBuilder {
	pub fn fit(&self, dataset: Dataset, n_classes: usize) -> Vec<DecisionTree> {
		let feature_len = (dataset.features_len() as f64).sqrt().ceil() as usize;
		let whole = Instant::now();

		let forest = self
			.get_rngs()
			.enumerate()
			.map(|(i, mut rng)| {
				let tree = self.fit_tree(&mut rng, &dataset, feature_len, n_classes);

				debug!(
					"[{:.1}%] tree {} has depth {}",
					(i + 1) as f64 / self.n_trees as f64 * 100.0,
					i,
					tree.depth()
				);

				tree
			})
			.collect::<Vec<_>>();

		info!("Fitted {} trees in {:.2} s", forest.len(), whole.elapsed().as_secs_f64());

		forest
	}

	fn fit_tree<R: Rng + ?Sized>(&self, rng: &mut R, dataset: &Dataset, feature_len: usize, n_classes: usize) -> DecisionTree {
		let builder = DecisionTreeBuilder {
			max_features: Some(feature_len),
			max_depth: self.max_depth,
		};

		let max_samples = ((dataset.rows_len() as f64 * self.bag_amount).round() as usize).max(1);
		let bootstrapped = dataset.bootstrap(rng, max_samples);

		builder.fit(rng, bootstrapped, n_classes)
	}

	// One independent generator per tree, all derived from `seed`.
	fn get_rngs(&self) -> impl Iterator<Item = StdRng> {
		let mut rng = StdRng::seed_from_u64(self.seed);

		(0..self.n_trees).map(move |_| {
			let mut seed = [0u8; 32];
			rng.fill(&mut seed);
			StdRng::from_seed(seed)
		})
	}
}

#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
	params: RandomForestBuilder,
	forest: Vec<DecisionTree>,
	n_classes: usize,
}

impl RandomForestClassifier {
	pub fn new(params: RandomForestBuilder) -> Self {
		Self {
			params,
			forest: Vec::new(),
			n_classes: N_CLASSES,
		}
	}

	pub fn params(&self) -> &RandomForestBuilder {
		&self.params
	}

	pub fn n_trees(&self) -> usize {
		self.forest.len()
	}

	fn proba(&self, x: &[f64]) -> Vec<f64> {
		let mut sum = vec![0.0; self.n_classes];

		for tree in &self.forest {
			for (s, p) in sum.iter_mut().zip(tree.predict(x)) {
				*s += p;
			}
		}

		let len = self.forest.len() as f64;
		sum.iter_mut().for_each(|s| *s /= len);
		sum
	}

	fn trained(&self) -> Result<(), ModelError> {
		if self.forest.is_empty() {
			Err(ModelError::NotTrained)
		} else {
			Ok(())
		}
	}

	pub fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
		writer.write_all(MAGIC)?;
		writer.write_u16::<BigEndian>(VERSION)?;
		writer.write_u16::<BigEndian>(N_FEATURES as u16)?;
		writer.write_u16::<BigEndian>(self.n_classes as u16)?;
		let len = u16::try_from(self.forest.len()).map_err(|_| {
			io::Error::new(
				io::ErrorKind::InvalidData,
				format!("{} trees, at most {} can be saved", self.forest.len(), MAX_TREES),
			)
		})?;
		writer.write_u16::<BigEndian>(len)?;

		for tree in &self.forest {
			tree.serialize(writer)?;
		}

		Ok(())
	}

	pub fn deserialize<R: Read>(reader: &mut R, params: RandomForestBuilder) -> Result<Self, ModelError> {
		let mut magic = [0u8; 4];
		reader.read_exact(&mut magic).map_err(corrupt)?;
		if &magic != MAGIC {
			return Err(ModelError::InvalidData("not a random forest model".to_string()));
		}

		let version = reader.read_u16::<BigEndian>().map_err(corrupt)?;
		if version != VERSION {
			return Err(ModelError::InvalidData(format!("unsupported version {}", version)));
		}

		let features = reader.read_u16::<BigEndian>().map_err(corrupt)? as usize;
		let n_classes = reader.read_u16::<BigEndian>().map_err(corrupt)? as usize;
		if features != N_FEATURES || n_classes != N_CLASSES {
			return Err(ModelError::InvalidData(format!(
				"model expects {} features and {} classes",
				features, n_classes
			)));
		}

		let len = reader.read_u16::<BigEndian>().map_err(corrupt)?;
		let forest = (0..len)
			.map(|_| DecisionTree::deserialize(reader))
			.collect::<io::Result<Vec<DecisionTree>>>()
			.map_err(corrupt)?;

		if reader.read(&mut [0u8; 1]).map_err(corrupt)? != 0 {
			return Err(ModelError::InvalidData("trailing bytes after the last tree".to_string()));
		}

		Ok(Self {
			params,
			forest,
			n_classes,
		})
	}
}

fn corrupt(err: io::Error) -> ModelError {
	match err.kind() {
		io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => ModelError::InvalidData(err.to_string()),
		_ => ModelError::Io(err),
	}
}

impl Classifier for RandomForestClassifier {
	fn train(&mut self, features: &[Sample], labels: &[Label]) -> Result<(), ModelError> {
		if features.len() != labels.len() {
			return Err(ModelError::LengthMismatch {
				features: features.len(),
				labels: labels.len(),
			});
		}

		if features.is_empty() {
			return Err(ModelError::EmptyTrainingSet);
		}

		if let Some(&label) = labels.iter().find(|&&y| y >= self.n_classes) {
			return Err(ModelError::UnknownLabel(label));
		}

		info!(
			"Fitting random forest classifier [trees: {}, depth: {}] on {} samples ...",
			self.params.n_trees,
			self.params.max_depth,
			features.len()
		);

		let builder = Builder::from_samples(features, labels);
		self.forest = self.params.fit(builder.build(), self.n_classes);

		Ok(())
	}

	fn predict(&self, features: &[Sample]) -> Result<Vec<Label>, ModelError> {
		Ok(self.predict_proba(features)?.iter().map(|p| argmax(p)).collect())
	}

	fn predict_proba(&self, features: &[Sample]) -> Result<Vec<Vec<f64>>, ModelError> {
		self.trained()?;

		Ok(features.iter().map(|x| self.proba(x)).collect())
	}

	fn feature_importances(&self) -> Option<Vec<f64>> {
		if self.forest.is_empty() {
			return None;
		}

		let mut importances = vec![0.0; N_FEATURES];
		for tree in &self.forest {
			for (sum, x) in importances.iter_mut().zip(tree.importances()) {
				*sum += x;
			}
		}

		let total: f64 = importances.iter().sum();
		if total > 0.0 {
			importances.iter_mut().for_each(|x| *x /= total);
		}

		Some(importances)
	}

	fn save(&self, path: &Path) -> Result<(), ModelError> {
		self.trained()?;
		if self.forest.len() > MAX_TREES {
			return Err(ModelError::InvalidData(format!(
				"{} trees, at most {} can be saved",
				self.forest.len(),
				MAX_TREES
			)));
		}

		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent)?;
		}

		info!("Serializing model to {} ...", path.display());
		let mut writer = BufWriter::new(File::create(path)?);
		self.serialize(&mut writer)?;
		writer.flush()?;

		Ok(())
	}

	fn load(&mut self, path: &Path) -> Result<(), ModelError> {
		let file = File::open(path).map_err(|err| match err.kind() {
			io::ErrorKind::NotFound => ModelError::NotFound(path.to_path_buf()),
			_ => ModelError::Io(err),
		})?;

		info!("Deserializing model from {} ...", path.display());
		*self = Self::deserialize(&mut BufReader::new(file), self.params.clone())?;

		Ok(())
	}
}
