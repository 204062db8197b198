use std::fmt;
use std::path::{Path, PathBuf};

use burn::module::{AutodiffModule, Module};
use burn::optim::decay::WeightDecayConfig;
use burn::optim::AdamConfig;
use burn::record::{CompactRecorder, Recorder};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;

use crate::config::ProbeConfig;
use crate::data::{ForecastBatch, StandardScaler};
use crate::error::{ProbeError, Result};
use crate::models::cma::{CrossModalForecaster, CrossModalForecasterConfig};
use crate::models::Forecaster;
use crate::utils::{mae_loss, mse_loss};

/// Error of one batch in the data's original units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForecastMetrics {
    pub mse: f32,
    pub mae: f32,
}

impl fmt::Display for ForecastMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mse: {:.4} mae: {:.4}", self.mse, self.mae)
    }
}

/// A forecaster together with the scaler of its data and the optimizer
/// settings it is trained with.
pub struct Engine<B: AutodiffBackend> {
    pub model: CrossModalForecaster<B>,
    pub scaler: StandardScaler,
    device: B::Device,
    learning_rate: f64,
    weight_decay: f64,
    epochs: usize,
}

impl<B: AutodiffBackend> Engine<B> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scaler: StandardScaler,
        channel: usize,
        num_nodes: usize,
        seq_len: usize,
        pred_len: usize,
        dropout: f64,
        d_llm: usize,
        e_layer: usize,
        d_layer: usize,
        head: usize,
        learning_rate: f64,
        weight_decay: f64,
        device: B::Device,
        epochs: usize,
    ) -> Result<Self> {
        let model_config = CrossModalForecasterConfig::new(seq_len, pred_len, num_nodes, d_llm)
            .with_channel(channel)
            .with_e_layer(e_layer)
            .with_d_layer(d_layer)
            .with_head(head)
            .with_dropout(dropout);
        model_config.validate()?;

        let model = model_config.init::<B>().to_device(&device);
        tracing::info!(
            "Built forecaster with {} parameters (channel {}, heads {}, layers {}/{})",
            model.num_params(),
            channel,
            head,
            e_layer,
            d_layer
        );

        Ok(Self {
            model,
            scaler,
            device,
            learning_rate,
            weight_decay,
            epochs,
        })
    }

    /// Seeds the backend with `config.seed` so weights are reproducible.
    pub fn from_config(
        config: &ProbeConfig,
        scaler: StandardScaler,
        device: B::Device,
    ) -> Result<Self> {
        B::seed(config.seed);

        Self::new(
            scaler,
            config.channel,
            config.num_nodes,
            config.seq_len,
            config.pred_len,
            config.dropout_n,
            config.d_llm,
            config.e_layer,
            config.d_layer,
            config.head,
            config.learning_rate,
            config.weight_decay,
            device,
            config.epochs,
        )
    }

    /// Replaces the weights with a record saved by [`Engine::save_checkpoint`].
    /// The recorder adds its own file extension to `path`.
    pub fn load_checkpoint(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let record = CompactRecorder::new()
            .load(path.clone())
            .map_err(|err| ProbeError::Checkpoint {
                path: path.clone(),
                message: format!("{err:?}"),
            })?;

        self.model = self.model.load_record(record).to_device(&self.device);
        tracing::info!("Loaded checkpoint {:?}", path);

        Ok(self)
    }

    pub fn save_checkpoint(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        self.model
            .clone()
            .save_file(path.clone(), &CompactRecorder::new())
            .map_err(|err| ProbeError::Checkpoint {
                path,
                message: format!("{err:?}"),
            })
    }

    pub fn optimizer(&self) -> AdamConfig {
        AdamConfig::new().with_weight_decay(Some(WeightDecayConfig::new(self.weight_decay as _)))
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn epochs(&self) -> usize {
        self.epochs
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Scores one batch without tracking gradients.
    pub fn evaluate(&self, batch: &ForecastBatch<B>) -> Result<ForecastMetrics> {
        let model = self.model.valid();
        let batch = batch.to_device(&self.device).inner();
        model.check_batch(&batch)?;

        let pred = model.forward(batch.x, batch.x_mark, batch.embeddings);
        let pred = self.scaler.inverse_tensor(pred);
        let target = self.scaler.inverse_tensor(batch.y);

        Ok(ForecastMetrics {
            mse: mse_loss(pred.clone(), target.clone()).into_scalar().elem(),
            mae: mae_loss(pred, target).into_scalar().elem(),
        })
    }
}
