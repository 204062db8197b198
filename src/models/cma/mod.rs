pub mod alignment;
pub mod model;
pub mod revin;

pub use model::{CrossModalForecaster, CrossModalForecasterConfig};
