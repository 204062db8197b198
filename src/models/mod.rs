pub mod cma;

use burn::tensor::{backend::Backend, Tensor};

use crate::data::ForecastBatch;
use crate::error::Result;
use crate::observe::{NamedModules, ObserverScope};

/// What the forward probe needs from a model.
pub trait Forecaster<B: Backend>: NamedModules {
    /// Rejects a batch whose geometry the model was not built for.
    fn check_batch(&self, batch: &ForecastBatch<B>) -> Result<()>;

    /// Runs the model, reporting each sub-module call to `scope`.
    fn forward_observed(
        &self,
        x: Tensor<B, 3>,
        x_mark: Tensor<B, 3>,
        embeddings: Tensor<B, 3>,
        scope: &mut ObserverScope<'_>,
    ) -> Tensor<B, 3>;
}
