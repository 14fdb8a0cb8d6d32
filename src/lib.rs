pub mod app;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod decision_tree;
pub mod error;
pub mod functions;
pub mod iris;
pub mod loader;
pub mod metrics;
pub mod node;
pub mod plot;
pub mod random_forest;

pub use classifier::Classifier;
pub use error::{AppError, ConfigError, LoaderError, ModelError, PlotError};
pub use iris::{Label, Sample, Species};
pub use plot::Plotter;
