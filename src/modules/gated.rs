use burn::config::Config;
use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, LayerNorm, LayerNormConfig, Linear, LinearConfig};
use burn::tensor::activation;
use burn::tensor::{backend::Backend, Tensor};

pub fn elu<B: Backend, const D: usize>(x: Tensor<B, D>, alpha: f32) -> Tensor<B, D> {
    let mask = x.clone().lower_equal_elem(0.0);
    let negative = (x.clone().exp() - 1.0) * alpha;

    x.mask_where(mask, negative)
}

/// Splits the last axis in two halves and gates the first with the second.
#[derive(Module, Clone, Debug)]
pub struct GatedLinearUnit {
    nonlinear: bool,
}

impl GatedLinearUnit {
    pub fn forward<B: Backend, const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        let mut halves = x.chunk(2, D - 1);
        let gate = halves.remove(1);
        let value = halves.remove(0);

        let value = if self.nonlinear { value.tanh() } else { value };

        activation::sigmoid(gate) * value
    }
}

#[derive(Config, Debug)]
pub struct GatedLinearUnitConfig {
    #[config(default = true)]
    nonlinear: bool,
}

impl GatedLinearUnitConfig {
    pub fn init(&self) -> GatedLinearUnit {
        GatedLinearUnit {
            nonlinear: self.nonlinear,
        }
    }
}

/// Projection with an ELU hidden layer, a GLU output gate and a residual
/// path, normalized over the output features.
#[derive(Module, Debug)]
pub struct GatedResidualNetwork<B: Backend> {
    skip_proj: Option<Linear<B>>,
    input_linear: Linear<B>,
    hidden_linear: Linear<B>,
    dropout: Dropout,
    gate_linear: Linear<B>,
    gate: GatedLinearUnit,
    norm: LayerNorm<B>,
    elu_alpha: f32,
}

impl<B: Backend> GatedResidualNetwork<B> {
    pub fn forward<const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        let skip = match &self.skip_proj {
            Some(proj) => proj.forward(x.clone()),
            None => x.clone(),
        };

        let x = elu(self.input_linear.forward(x), self.elu_alpha);
        let x = self.dropout.forward(self.hidden_linear.forward(x));
        let x = self.gate.forward(self.gate_linear.forward(x));

        self.norm.forward(x + skip)
    }
}

#[derive(Config, Debug)]
pub struct GatedResidualNetworkConfig {
    d_input: usize,
    d_hidden: usize,

    #[config(default = "None")]
    d_output: Option<usize>,

    #[config(default = 0.0)]
    dropout: f64,

    #[config(default = 1.0)]
    elu_alpha: f32,
}

impl GatedResidualNetworkConfig {
    pub fn init<B: Backend>(&self) -> GatedResidualNetwork<B> {
        let d_output = self.d_output.unwrap_or(self.d_input);

        let skip_proj = if self.d_input != d_output {
            Some(LinearConfig::new(self.d_input, d_output).init())
        } else {
            None
        };

        GatedResidualNetwork {
            skip_proj,
            input_linear: LinearConfig::new(self.d_input, self.d_hidden).init(),
            hidden_linear: LinearConfig::new(self.d_hidden, self.d_hidden).init(),
            dropout: DropoutConfig::new(self.dropout).init(),
            gate_linear: LinearConfig::new(self.d_hidden, d_output * 2).init(),
            gate: GatedLinearUnitConfig::new().with_nonlinear(false).init(),
            norm: LayerNormConfig::new(d_output).init(),
            elu_alpha: self.elu_alpha,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::{Data, Shape};

    type TestBackend = burn::backend::NdArray<f32>;

    #[test]
    fn elu_keeps_positive_and_bends_negative() {
        let x: Tensor<TestBackend, 1> =
            Tensor::from_data(Data::new(vec![-1.0, 0.5], Shape::new([2])));
        let y = elu(x, 1.0).into_data().value;

        assert!((y[0] - ((-1.0f32).exp() - 1.0)).abs() < 1e-6);
        assert!((y[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn glu_halves_last_axis() {
        let glu = GatedLinearUnitConfig::new().with_nonlinear(false).init();
        let x: Tensor<TestBackend, 2> =
            Tensor::from_data(Data::new(vec![2.0, 4.0, 0.0, 0.0], Shape::new([1, 4])));
        let y = glu.forward(x);

        assert_eq!(y.dims(), [1, 2]);
        // sigmoid(0) = 0.5
        let y = y.into_data().value;
        assert!((y[0] - 1.0).abs() < 1e-5);
        assert!((y[1] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn grn_projects_to_output_width() {
        let grn: GatedResidualNetwork<TestBackend> = GatedResidualNetworkConfig::new(12, 6)
            .with_d_output(Some(4))
            .init();
        let x: Tensor<TestBackend, 3> = Tensor::ones([2, 3, 12]);

        assert_eq!(grn.forward(x).dims(), [2, 3, 4]);
    }
}
