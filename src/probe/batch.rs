use std::fmt;

use burn::data::dataloader::DataLoader;
use burn::tensor::backend::Backend;

use crate::data::ForecastBatch;
use crate::error::{ProbeError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TensorInfo {
    pub name: &'static str,
    pub shape: Vec<usize>,
}

/// Shapes of a batch plus the dtype and device they share.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchReport {
    pub tensors: Vec<TensorInfo>,
    pub dtype: String,
    pub device: String,
}

impl BatchReport {
    pub fn shape_of(&self, name: &str) -> Option<&[usize]> {
        self.tensors
            .iter()
            .find(|info| info.name == name)
            .map(|info| info.shape.as_slice())
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for info in &self.tensors {
            writeln!(f, "{}: {:?}", info.name, info.shape)?;
        }
        write!(f, "dtype: {} device: {}", self.dtype, self.device)
    }
}

pub fn describe_batch<B: Backend>(batch: &ForecastBatch<B>) -> BatchReport {
    BatchReport {
        tensors: batch
            .named_tensors()
            .into_iter()
            .map(|(name, tensor)| TensorInfo {
                name,
                shape: tensor.dims().to_vec(),
            })
            .collect(),
        dtype: std::any::type_name::<B::FloatElem>().to_string(),
        device: format!("{:?}", batch.x.device()),
    }
}

/// First batch of a fresh pass over `loader`, without printing anything.
pub fn first_batch<B: Backend>(
    loader: &dyn DataLoader<ForecastBatch<B>>,
) -> Result<ForecastBatch<B>> {
    loader.iter().next().ok_or(ProbeError::EmptySource)
}

/// Takes the first batch of `loader` and prints its report to stdout.
pub fn fetch_one_batch<B: Backend>(
    loader: &dyn DataLoader<ForecastBatch<B>>,
) -> Result<ForecastBatch<B>> {
    let batch = first_batch(loader)?;
    println!("{}", describe_batch(&batch));

    Ok(batch)
}
