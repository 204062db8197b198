use burn::module::{AutodiffModule, Module, ModuleVisitor, ParamId};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::Tensor;

use crate::data::ForecastBatch;
use crate::error::Result;
use crate::models::Forecaster;
use crate::observe::{ForwardObserver, ObserverScope};

/// Prediction of one pass next to the target it should match.
#[derive(Clone, Debug)]
pub struct ForwardOutput<B: Backend> {
    pub prediction: Tensor<B, 3>,
    pub target: Tensor<B, 3>,
}

impl<B: Backend> ForwardOutput<B> {
    pub fn shapes_match(&self) -> bool {
        self.prediction.dims() == self.target.dims()
    }

    pub fn report(&self) -> String {
        format!(
            "yhat: {:?} target: {:?}",
            self.prediction.dims(),
            self.target.dims()
        )
    }
}

/// Runs `model` once on a copy of `batch` moved to `device`.
///
/// The pass happens on the inner backend of `model.valid()`, so no autodiff
/// graph is recorded and the caller's parameters cannot change. When
/// `observe_first > 0`, `observer` sees every call of the first
/// `observe_first` named sub-modules, and is detached again before this
/// function returns.
pub fn run_forward_pass<B, M>(
    model: &M,
    batch: &ForecastBatch<B>,
    device: &B::Device,
    observe_first: usize,
    observer: &mut dyn ForwardObserver,
) -> Result<ForwardOutput<B::InnerBackend>>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    M::InnerModule: Forecaster<B::InnerBackend>,
{
    let batch = batch.to_device(device).inner();
    let model = model.clone().to_device(device).valid();
    model.check_batch(&batch)?;

    let ForecastBatch {
        x,
        y,
        x_mark,
        embeddings,
        ..
    } = batch;

    let prediction = {
        let mut scope = ObserverScope::attach(&model, observe_first, observer);
        model.forward_observed(x, x_mark, embeddings, &mut scope)
    };
    tracing::debug!("Forward pass produced {:?}", prediction.dims());

    Ok(ForwardOutput {
        prediction,
        target: y,
    })
}

/// Copy of every parameter value of `module`, in visiting order.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSnapshot {
    values: Vec<Vec<f32>>,
}

impl ParamSnapshot {
    pub fn capture<B: Backend, M: Module<B>>(module: &M) -> Self {
        let mut collector = ParamCollector { values: Vec::new() };
        module.visit(&mut collector);

        Self {
            values: collector.values,
        }
    }

    pub fn num_tensors(&self) -> usize {
        self.values.len()
    }
}

struct ParamCollector {
    values: Vec<Vec<f32>>,
}

impl<B: Backend> ModuleVisitor<B> for ParamCollector {
    fn visit_float<const D: usize>(&mut self, _id: &ParamId, tensor: &Tensor<B, D>) {
        self.values.push(tensor.to_data().convert::<f32>().value);
    }
}
