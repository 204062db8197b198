use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::Tensor;

#[derive(Clone, Debug)]
pub struct ForecastBatch<B: Backend> {
    pub x: Tensor<B, 3>,          // [N, T, C]
    pub y: Tensor<B, 3>,          // [N, H, C]
    pub x_mark: Tensor<B, 3>,     // [N, T, M]
    pub y_mark: Tensor<B, 3>,     // [N, H, M]
    pub embeddings: Tensor<B, 3>, // [N, C, E]
}

impl<B: Backend> ForecastBatch<B> {
    pub fn batch_size(&self) -> usize {
        self.x.dims()[0]
    }

    /// Copies every tensor onto `device`; `self` is left as it was.
    pub fn to_device(&self, device: &B::Device) -> Self {
        Self {
            x: self.x.clone().to_device(device),
            y: self.y.clone().to_device(device),
            x_mark: self.x_mark.clone().to_device(device),
            y_mark: self.y_mark.clone().to_device(device),
            embeddings: self.embeddings.clone().to_device(device),
        }
    }

    pub fn named_tensors(&self) -> [(&'static str, &Tensor<B, 3>); 5] {
        [
            ("x", &self.x),
            ("y", &self.y),
            ("x_mark", &self.x_mark),
            ("y_mark", &self.y_mark),
            ("embeddings", &self.embeddings),
        ]
    }
}

impl<B: AutodiffBackend> ForecastBatch<B> {
    /// The same batch on the inner backend, outside of gradient tracking.
    pub fn inner(self) -> ForecastBatch<B::InnerBackend> {
        ForecastBatch {
            x: self.x.inner(),
            y: self.y.inner(),
            x_mark: self.x_mark.inner(),
            y_mark: self.y_mark.inner(),
            embeddings: self.embeddings.inner(),
        }
    }
}
