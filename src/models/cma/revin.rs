use burn::module::Module;
use burn::tensor::{backend::Backend, Tensor};

/// Location and scale of each series in a batch, `[batch, 1, variates]`.
#[derive(Clone, Debug)]
pub struct InstanceStats<B: Backend> {
    pub loc: Tensor<B, 3>,
    pub scale: Tensor<B, 3>,
}

/// Per-instance normalization over the time axis, undone on the output.
#[derive(Module, Clone, Debug)]
pub struct InstanceNorm {
    eps: f32,
}

impl InstanceNorm {
    pub fn new(eps: f32) -> Self {
        Self { eps }
    }

    /// `x` is `[batch, time, variates]`.
    pub fn normalize<B: Backend>(&self, x: Tensor<B, 3>) -> (Tensor<B, 3>, InstanceStats<B>) {
        let data = x.detach();

        let loc = data.clone().mean_dim(1);
        let centered = data - loc.clone();
        let variance = (centered.clone() * centered.clone()).mean_dim(1);
        let scale = (variance + self.eps).sqrt();

        (centered / scale.clone(), InstanceStats { loc, scale })
    }

    pub fn denormalize<B: Backend>(
        &self,
        y: Tensor<B, 3>,
        stats: &InstanceStats<B>,
    ) -> Tensor<B, 3> {
        y * stats.scale.clone() + stats.loc.clone()
    }
}
