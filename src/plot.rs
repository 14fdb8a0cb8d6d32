use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};
use log::info;

use crate::error::PlotError;
use crate::metrics::ConfusionMatrix;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const GRID: Rgb<u8> = Rgb([160, 160, 160]);
const AXIS: Rgb<u8> = Rgb([64, 64, 64]);
const BAR: Rgb<u8> = Rgb([70, 130, 180]);

// Ends of the "Blues" colour ramp
const LIGHT: [u8; 3] = [247, 251, 255];
const DARK: [u8; 3] = [8, 48, 107];

pub trait Plotter {
	fn plot_confusion_matrix(&mut self, matrix: &ConfusionMatrix, class_names: &[&str], path: &Path) -> Result<(), PlotError>;

	fn plot_feature_importance(&mut self, importances: &[f64], feature_names: &[&str], path: &Path) -> Result<(), PlotError>;
}

/// Draws plots as PNG images.
///
/// The confusion matrix is a heat map with true classes as rows and predicted
/// classes as columns. Feature importances are horizontal bars, largest first.
#[derive(Debug, Clone)]
pub struct PngPlotter {
	pub cell: u32,
	pub bar_length: u32,
	pub bar_height: u32,
	pub margin: u32,
}

impl Default for PngPlotter {
	fn default() -> Self {
		Self {
			cell: 96,
			bar_length: 480,
			bar_height: 40,
			margin: 16,
		}
	}
}

impl Plotter for PngPlotter {
	fn plot_confusion_matrix(&mut self, matrix: &ConfusionMatrix, class_names: &[&str], path: &Path) -> Result<(), PlotError> {
		let k = matrix.n_classes;
		if k == 0 {
			return Err(PlotError::Empty("confusion matrix"));
		}
		if class_names.len() != k {
			return Err(PlotError::LengthMismatch {
				values: k,
				names: class_names.len(),
			});
		}
		if self.cell == 0 {
			return Err(PlotError::ZeroSize("cell"));
		}

		let side = self.margin * 2 + self.cell * k as u32;
		let mut img = RgbImage::from_pixel(side, side, WHITE);
		let max = matrix.counts.iter().copied().max().unwrap_or(0).max(1) as f64;

		for truth in 0..k {
			for predicted in 0..k {
				let x = self.margin + predicted as u32 * self.cell;
				let y = self.margin + truth as u32 * self.cell;
				let shade = blues(matrix.get(truth, predicted) as f64 / max);

				fill_rect(&mut img, x, y, self.cell, self.cell, shade);
				outline_rect(&mut img, x, y, self.cell, self.cell, GRID);
			}
		}

		prepare(path)?;
		img.save(path)?;

		info!(
			"Saved confusion matrix [{}] to {}",
			class_names.join(", "),
			path.display()
		);

		Ok(())
	}

	fn plot_feature_importance(&mut self, importances: &[f64], feature_names: &[&str], path: &Path) -> Result<(), PlotError> {
		let n = importances.len();
		if n == 0 {
			return Err(PlotError::Empty("feature importances"));
		}
		if feature_names.len() != n {
			return Err(PlotError::LengthMismatch {
				values: n,
				names: feature_names.len(),
			});
		}
		if self.bar_height == 0 {
			return Err(PlotError::ZeroSize("bar height"));
		}
		if self.bar_length == 0 {
			return Err(PlotError::ZeroSize("bar length"));
		}

		let mut order = (0..n).collect::<Vec<_>>();
		order.sort_by(|&a, &b| importances[b].total_cmp(&importances[a]));

		let stride = self.bar_height + self.margin;
		let width = self.margin * 2 + self.bar_length;
		let height = self.margin + stride * n as u32;
		let mut img = RgbImage::from_pixel(width, height, WHITE);

		let max = importances.iter().copied().fold(0.0, f64::max);
		let max = if max > 0.0 { max } else { 1.0 };

		for (row, &i) in order.iter().enumerate() {
			let length = (importances[i].max(0.0) / max * self.bar_length as f64).round() as u32;
			fill_rect(&mut img, self.margin, self.margin + row as u32 * stride, length, self.bar_height, BAR);
		}

		fill_rect(&mut img, self.margin.saturating_sub(1), 0, 1, height, AXIS);

		prepare(path)?;
		img.save(path)?;

		let ranking = order
			.iter()
			.map(|&i| format!("{}={:.3}", feature_names[i], importances[i]))
			.collect::<Vec<_>>();
		info!("Saved feature importance [{}] to {}", ranking.join(", "), path.display());

		Ok(())
	}
}

fn blues(t: f64) -> Rgb<u8> {
	let t = t.clamp(0.0, 1.0);
	let mut rgb = [0u8; 3];

	for (c, (&light, &dark)) in rgb.iter_mut().zip(LIGHT.iter().zip(DARK.iter())) {
		*c = (light as f64 + (dark as f64 - light as f64) * t).round() as u8;
	}

	Rgb(rgb)
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
	for py in y..(y + h).min(img.height()) {
		for px in x..(x + w).min(img.width()) {
			img.put_pixel(px, py, color);
		}
	}
}

fn outline_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
	fill_rect(img, x, y, w, 1, color);
	fill_rect(img, x, y + h.saturating_sub(1), w, 1, color);
	fill_rect(img, x, y, 1, h, color);
	fill_rect(img, x + w.saturating_sub(1), y, 1, h, color);
}

fn prepare(path: &Path) -> Result<(), PlotError> {
	match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).map_err(|source| PlotError::CreateDir {
			path: parent.to_path_buf(),
			source,
		}),
		_ => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const NAMES: [&str; 3] = ["setosa", "versicolor", "virginica"];

	#[test]
	fn confusion_matrix_heat_map() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("plots").join("confusion_matrix.png");
		let matrix = ConfusionMatrix::from_predictions(&[0, 0, 1, 2], &[0, 0, 2, 2], 3);
		let mut plotter = PngPlotter::default();

		plotter.plot_confusion_matrix(&matrix, &NAMES, &path).unwrap();

		let img = image::open(&path).unwrap().to_rgb8();
		let center = |row: u32, col: u32| {
			*img.get_pixel(plotter.margin + col * plotter.cell + plotter.cell / 2, plotter.margin + row * plotter.cell + plotter.cell / 2)
		};

		assert_eq!(img.dimensions(), (2 * 16 + 3 * 96, 2 * 16 + 3 * 96));
		assert_eq!(center(0, 0), Rgb(DARK));
		assert_eq!(center(0, 1), Rgb(LIGHT));
		assert_ne!(center(1, 2), Rgb(LIGHT));
	}

	#[test]
	fn feature_importance_bars_are_sorted() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("feature_importance.png");
		let mut plotter = PngPlotter::default();

		plotter
			.plot_feature_importance(&[0.1, 0.2, 0.5, 0.2], &["a", "b", "c", "d"], &path)
			.unwrap();

		let img = image::open(&path).unwrap().to_rgb8();
		let bar_end = |row: u32| {
			let y = plotter.margin + row * (plotter.bar_height + plotter.margin) + plotter.bar_height / 2;
			(plotter.margin..img.width()).take_while(|&x| *img.get_pixel(x, y) == BAR).count()
		};

		assert_eq!(bar_end(0), 480);
		assert_eq!(bar_end(1), 192);
		assert_eq!(bar_end(3), 96);
	}

	#[test]
	fn rejects_mismatched_names() {
		let dir = tempfile::tempdir().unwrap();
		let mut plotter = PngPlotter::default();

		assert!(matches!(
			plotter.plot_feature_importance(&[0.5, 0.5], &["a"], &dir.path().join("x.png")),
			Err(PlotError::LengthMismatch { values: 2, names: 1 })
		));
		assert!(matches!(
			plotter.plot_feature_importance(&[], &[], &dir.path().join("x.png")),
			Err(PlotError::Empty(_))
		));
		assert!(matches!(
			plotter.plot_confusion_matrix(&ConfusionMatrix::new(3), &["a", "b"], &dir.path().join("y.png")),
			Err(PlotError::LengthMismatch { values: 3, names: 2 })
		));
	}

	#[test]
	fn rejects_zero_sizes() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("z.png");
		let matrix = ConfusionMatrix::from_predictions(&[0, 1, 2], &[0, 1, 2], 3);

		let mut plotter = PngPlotter {
			cell: 0,
			..PngPlotter::default()
		};
		assert!(matches!(
			plotter.plot_confusion_matrix(&matrix, &NAMES, &path),
			Err(PlotError::ZeroSize("cell"))
		));

		let mut plotter = PngPlotter {
			bar_height: 0,
			..PngPlotter::default()
		};
		assert!(matches!(
			plotter.plot_feature_importance(&[0.5, 0.5], &["a", "b"], &path),
			Err(PlotError::ZeroSize("bar height"))
		));
		assert!(!path.exists());
	}
}
