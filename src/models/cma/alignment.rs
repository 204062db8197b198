use burn::config::Config;
use burn::module::Module;
use burn::nn::attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig};
use burn::nn::{LayerNorm, LayerNormConfig, Linear, LinearConfig};
use burn::tensor::{backend::Backend, Tensor};

use crate::modules::gated::{GatedLinearUnit, GatedLinearUnitConfig};
use crate::observe::ObserverScope;

/// Lets every series token attend over the prompt tokens, then gates the
/// retrieved context back into the series stream.
#[derive(Module, Debug)]
pub struct CrossModalAlignment<B: Backend> {
    attention: MultiHeadAttention<B>,
    gate_linear: Linear<B>,
    gate: GatedLinearUnit,
    norm: LayerNorm<B>,
}

impl<B: Backend> CrossModalAlignment<B> {
    pub fn forward(
        &self,
        series: Tensor<B, 3>,
        prompt: Tensor<B, 3>,
        scope: &mut ObserverScope<'_>,
    ) -> Tensor<B, 3> {
        let series_dims = series.dims();
        let prompt_dims = prompt.dims();

        let att_input = MhaInput::new(series.clone(), prompt.clone(), prompt);
        let context = self.attention.forward(att_input).context;
        let context_dims = context.dims();
        scope.record(
            "alignment.attention",
            &[&series_dims, &prompt_dims, &prompt_dims],
            &context_dims,
        );

        let gated = self.gate.forward(self.gate_linear.forward(context));
        let gated_dims = gated.dims();
        scope.record("alignment.gate", &[&context_dims], &gated_dims);

        let aligned = self.norm.forward(series + gated);
        scope.record("alignment.norm", &[&series_dims, &gated_dims], &aligned.dims());
        scope.record("alignment", &[&series_dims, &prompt_dims], &aligned.dims());

        aligned
    }
}

#[derive(Config, Debug)]
pub struct CrossModalAlignmentConfig {
    d_model: usize,
    num_heads: usize,

    #[config(default = 0.0)]
    dropout: f64,
}

impl CrossModalAlignmentConfig {
    pub fn init<B: Backend>(&self) -> CrossModalAlignment<B> {
        CrossModalAlignment {
            attention: MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
                .with_dropout(self.dropout)
                .init(),
            gate_linear: LinearConfig::new(self.d_model, self.d_model * 2).init(),
            gate: GatedLinearUnitConfig::new().init(),
            norm: LayerNormConfig::new(self.d_model).init(),
        }
    }
}
