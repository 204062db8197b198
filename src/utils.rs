use burn::tensor::{backend::Backend, Tensor};

pub fn mse_loss<B: Backend, const D: usize>(
    pred: Tensor<B, D>,
    target: Tensor<B, D>,
) -> Tensor<B, 1> {
    let residual = pred - target;
    (residual.clone() * residual).mean()
}

pub fn mae_loss<B: Backend, const D: usize>(
    pred: Tensor<B, D>,
    target: Tensor<B, D>,
) -> Tensor<B, 1> {
    (pred - target).abs().mean()
}
