use burn::config::Config;
use burn::module::Module;
use burn::nn::transformer::{
    TransformerDecoder, TransformerDecoderConfig, TransformerDecoderInput, TransformerEncoder,
    TransformerEncoderConfig, TransformerEncoderInput,
};
use burn::nn::{Linear, LinearConfig};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::Tensor;
use burn::train::{RegressionOutput, TrainOutput, TrainStep, ValidStep};

use super::alignment::{CrossModalAlignment, CrossModalAlignmentConfig};
use super::revin::InstanceNorm;
use crate::data::ForecastBatch;
use crate::error::ProbeError;
use crate::models::Forecaster;
use crate::modules::gated::{GatedResidualNetwork, GatedResidualNetworkConfig};
use crate::observe::{NamedModules, ObserverScope};
use crate::utils::mse_loss;

const MODULE_NAMES: [&str; 12] = [
    "model",
    "normalize",
    "length_to_feature",
    "ts_encoder",
    "prompt_proj",
    "prompt_encoder",
    "alignment",
    "alignment.attention",
    "alignment.gate",
    "alignment.norm",
    "decoder",
    "projection",
];

/// Forecasts `pred_len` steps of `num_nodes` variates from a `seq_len`
/// window, its calendar covariates and one auxiliary embedding per variate.
///
/// Every variate (and every covariate) becomes one token whose features are
/// a projection of its whole input window. Series tokens are aligned with
/// the encoded embedding tokens by cross attention and decoded into the
/// horizon.
#[derive(Module, Debug)]
pub struct CrossModalForecaster<B: Backend> {
    seq_len: usize,
    pred_len: usize,
    num_nodes: usize,
    d_llm: usize,
    normalize: InstanceNorm,
    length_to_feature: Linear<B>,
    ts_encoder: TransformerEncoder<B>,
    prompt_proj: GatedResidualNetwork<B>,
    prompt_encoder: TransformerEncoder<B>,
    alignment: CrossModalAlignment<B>,
    decoder: TransformerDecoder<B>,
    projection: Linear<B>,
}

impl<B: Backend> CrossModalForecaster<B> {
    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn pred_len(&self) -> usize {
        self.pred_len
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn forward(
        &self,
        x: Tensor<B, 3>,          // [N, T, C]
        x_mark: Tensor<B, 3>,     // [N, T, M]
        embeddings: Tensor<B, 3>, // [N, C, E]
    ) -> Tensor<B, 3> {
        self.forward_observed(x, x_mark, embeddings, &mut ObserverScope::detached())
    }

    pub fn forward_regression(&self, batch: ForecastBatch<B>) -> RegressionOutput<B> {
        let pred = self.forward(batch.x, batch.x_mark, batch.embeddings);
        let loss = mse_loss(pred.clone(), batch.y.clone());

        let [batch_size, horizon, variates] = pred.dims();
        RegressionOutput::new(
            loss,
            pred.reshape([batch_size, horizon * variates]),
            batch.y.reshape([batch_size, horizon * variates]),
        )
    }
}

impl<B: Backend> NamedModules for CrossModalForecaster<B> {
    fn named_modules(&self) -> Vec<&'static str> {
        MODULE_NAMES.to_vec()
    }
}

impl<B: Backend> Forecaster<B> for CrossModalForecaster<B> {
    fn check_batch(&self, batch: &ForecastBatch<B>) -> crate::error::Result<()> {
        let batch_size = batch.batch_size();

        expect_dims("x", &[batch_size, self.seq_len, self.num_nodes], &batch.x.dims())?;
        expect_dims(
            "x_mark",
            &[batch_size, self.seq_len],
            &batch.x_mark.dims()[..2],
        )?;
        expect_dims(
            "embeddings",
            &[batch_size, self.num_nodes, self.d_llm],
            &batch.embeddings.dims(),
        )
    }

    fn forward_observed(
        &self,
        x: Tensor<B, 3>,
        x_mark: Tensor<B, 3>,
        embeddings: Tensor<B, 3>,
        scope: &mut ObserverScope<'_>,
    ) -> Tensor<B, 3> {
        let x_dims = x.dims();
        let mark_dims = x_mark.dims();
        let emb_dims = embeddings.dims();

        let (x, stats) = self.normalize.normalize(x);
        scope.record("normalize", &[&x_dims], &x.dims());

        // [N, C + M, T]
        let tokens = Tensor::cat(vec![x.swap_dims(1, 2), x_mark.swap_dims(1, 2)], 1);
        let token_dims = tokens.dims();
        let tokens = self.length_to_feature.forward(tokens);
        let feature_dims = tokens.dims();
        scope.record("length_to_feature", &[&token_dims], &feature_dims);

        let encoded = self.ts_encoder.forward(TransformerEncoderInput::new(tokens));
        scope.record("ts_encoder", &[&feature_dims], &encoded.dims());
        let [batch_size, _, d_model] = encoded.dims();
        let encoded = encoded.slice([0..batch_size, 0..self.num_nodes, 0..d_model]);

        let prompt = self.prompt_proj.forward(embeddings);
        let prompt_dims = prompt.dims();
        scope.record("prompt_proj", &[&emb_dims], &prompt_dims);
        let prompt = self.prompt_encoder.forward(TransformerEncoderInput::new(prompt));
        scope.record("prompt_encoder", &[&prompt_dims], &prompt.dims());

        let aligned = self.alignment.forward(encoded.clone(), prompt, scope);
        let aligned_dims = aligned.dims();
        let memory_dims = encoded.dims();
        let decoded = self
            .decoder
            .forward(TransformerDecoderInput::new(aligned, encoded));
        let decoded_dims = decoded.dims();
        scope.record("decoder", &[&aligned_dims, &memory_dims], &decoded_dims);

        // [N, C, H]
        let horizon = self.projection.forward(decoded);
        scope.record("projection", &[&decoded_dims], &horizon.dims());

        let output = self.normalize.denormalize(horizon.swap_dims(1, 2), &stats);
        scope.record("model", &[&x_dims, &mark_dims, &emb_dims], &output.dims());

        output
    }
}

fn expect_dims(component: &'static str, expected: &[usize], actual: &[usize]) -> crate::error::Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ProbeError::ShapeMismatch {
            component,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        })
    }
}

impl<B: AutodiffBackend> TrainStep<ForecastBatch<B>, RegressionOutput<B>>
    for CrossModalForecaster<B>
{
    fn step(&self, batch: ForecastBatch<B>) -> TrainOutput<RegressionOutput<B>> {
        let item = self.forward_regression(batch);
        TrainOutput::new(self, item.loss.backward(), item)
    }
}

impl<B: Backend> ValidStep<ForecastBatch<B>, RegressionOutput<B>> for CrossModalForecaster<B> {
    fn step(&self, batch: ForecastBatch<B>) -> RegressionOutput<B> {
        self.forward_regression(batch)
    }
}

#[derive(Config, Debug)]
pub struct CrossModalForecasterConfig {
    seq_len: usize,
    pred_len: usize,
    num_nodes: usize,
    d_llm: usize,

    #[config(default = 32)]
    channel: usize,

    #[config(default = 1)]
    e_layer: usize,

    #[config(default = 1)]
    d_layer: usize,

    #[config(default = 8)]
    head: usize,

    #[config(default = 0.2)]
    dropout: f64,
}

impl CrossModalForecasterConfig {
    /// Fails when `channel` cannot be split evenly across `head`.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.head == 0 || self.channel % self.head != 0 {
            return Err(ProbeError::Config(format!(
                "channel {} is not divisible by head {}",
                self.channel, self.head
            )));
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self) -> CrossModalForecaster<B> {
        let d_ff = self.channel * 4;

        let ts_encoder =
            TransformerEncoderConfig::new(self.channel, d_ff, self.head, self.e_layer)
                .with_dropout(self.dropout)
                .init();

        let prompt_proj = GatedResidualNetworkConfig::new(self.d_llm, self.channel)
            .with_d_output(Some(self.channel))
            .with_dropout(self.dropout)
            .init();

        let prompt_encoder =
            TransformerEncoderConfig::new(self.channel, d_ff, self.head, self.e_layer)
                .with_dropout(self.dropout)
                .init();

        let alignment = CrossModalAlignmentConfig::new(self.channel, self.head)
            .with_dropout(self.dropout)
            .init();

        let decoder = TransformerDecoderConfig::new(self.channel, d_ff, self.head, self.d_layer)
            .with_dropout(self.dropout)
            .init();

        CrossModalForecaster {
            seq_len: self.seq_len,
            pred_len: self.pred_len,
            num_nodes: self.num_nodes,
            d_llm: self.d_llm,
            normalize: InstanceNorm::new(1e-5),
            length_to_feature: LinearConfig::new(self.seq_len, self.channel).init(),
            ts_encoder,
            prompt_proj,
            prompt_encoder,
            alignment,
            decoder,
            projection: LinearConfig::new(self.channel, self.pred_len).init(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::ShapeRecorder;

    type TestBackend = burn::backend::NdArray<f32>;

    fn model() -> CrossModalForecaster<TestBackend> {
        CrossModalForecasterConfig::new(12, 6, 3, 10)
            .with_channel(8)
            .with_head(2)
            .init()
    }

    fn batch(batch_size: usize) -> ForecastBatch<TestBackend> {
        ForecastBatch {
            x: Tensor::ones([batch_size, 12, 3]),
            y: Tensor::zeros([batch_size, 6, 3]),
            x_mark: Tensor::zeros([batch_size, 12, 4]),
            y_mark: Tensor::zeros([batch_size, 6, 4]),
            embeddings: Tensor::ones([batch_size, 3, 10]),
        }
    }

    #[test]
    fn forward_maps_window_to_horizon() {
        let model = model();
        let batch = batch(2);

        let pred = model.forward(batch.x, batch.x_mark, batch.embeddings);
        assert_eq!(pred.dims(), [2, 6, 3]);
    }

    #[test]
    fn named_modules_start_at_root() {
        let names = model().named_modules();

        assert_eq!(names.len(), 12);
        assert_eq!(names[0], "model");
        assert_eq!(names[11], "projection");
    }

    #[test]
    fn check_batch_reports_wrong_window() {
        let model = CrossModalForecasterConfig::new(24, 6, 3, 10)
            .with_channel(8)
            .with_head(2)
            .init::<TestBackend>();

        let err = model.check_batch(&batch(2)).unwrap_err();
        assert!(matches!(
            err,
            ProbeError::ShapeMismatch { component: "x", ref expected, .. } if expected == &vec![2, 24, 3]
        ));
        assert!(self::model().check_batch(&batch(2)).is_ok());
    }

    #[test]
    fn heads_must_divide_channel() {
        let config = CrossModalForecasterConfig::new(12, 6, 3, 10)
            .with_channel(10)
            .with_head(4);

        assert!(matches!(config.validate(), Err(ProbeError::Config(_))));
    }

    #[test]
    fn valid_step_flattens_horizon() {
        let output = ValidStep::step(&model(), batch(2));

        assert_eq!(output.output.dims(), [2, 18]);
        assert_eq!(output.targets.dims(), [2, 18]);
        assert_eq!(output.loss.dims(), [1]);
    }

    #[test]
    fn every_named_module_reports_exactly_once() {
        let model = model();
        let batch = batch(2);
        let names = model.named_modules();

        let mut recorder = ShapeRecorder::default();
        {
            let mut scope = ObserverScope::attach(&model, names.len(), &mut recorder);
            model.forward_observed(batch.x, batch.x_mark, batch.embeddings, &mut scope);
        }

        let recorded = recorder.names();
        for name in &names {
            let calls = recorded.iter().filter(|seen| *seen == name).count();
            assert_eq!(calls, 1, "{name} reported {calls} times");
        }
        assert_eq!(recorded.len(), names.len());
    }
}
