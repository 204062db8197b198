//! Debug probes for a cross-modal timeseries forecaster built on burn.
//!
//! [`probe::fetch_one_batch`] prints the geometry of the first batch a loader
//! produces, and [`probe::run_forward_pass`] runs one gradient-free pass
//! while an [`observe::ForwardObserver`] watches the first few sub-modules.

pub mod cli;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod models;
pub mod modules;
pub mod observe;
pub mod probe;
pub mod utils;

pub use config::{select_device, ProbeConfig};
pub use engine::{Engine, ForecastMetrics};
pub use error::{ProbeError, Result};

/// Backend both binaries run on.
pub type ProbeBackend = burn::backend::Autodiff<burn::backend::NdArray<f32>>;
