use clap::Parser;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG: &str = "tsprobe=info";

use crate::config::ProbeConfig;
use crate::error::Result;

/// Flags shared by both probe binaries. Every flag is optional; an omitted
/// flag keeps the value from `--config`, or the built-in default.
#[derive(Parser, Debug, Default)]
#[command(version, about)]
pub struct ProbeArgs {
    /// JSON file written by `ProbeConfig::save`
    #[arg(long)]
    pub config: Option<String>,

    /// Dataset name, read from `<root-path>/<data-path>.csv`
    #[arg(long)]
    pub data_path: Option<String>,

    #[arg(long)]
    pub root_path: Option<String>,

    /// Directory with `train.jsonl`, `val.jsonl` and `test.jsonl` embeddings
    #[arg(long)]
    pub embeddings_path: Option<String>,

    #[arg(long)]
    pub seq_len: Option<usize>,

    #[arg(long)]
    pub pred_len: Option<usize>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long)]
    pub num_workers: Option<usize>,

    /// `cpu` or `auto`
    #[arg(long)]
    pub device: Option<String>,

    /// Number of named sub-modules whose calls get printed
    #[arg(long)]
    pub observe_modules: Option<usize>,

    /// Record saved by a previous training run
    #[arg(long)]
    pub checkpoint: Option<String>,

    #[arg(long)]
    pub channel: Option<usize>,

    #[arg(long)]
    pub num_nodes: Option<usize>,

    #[arg(long)]
    pub d_llm: Option<usize>,

    #[arg(long)]
    pub e_layer: Option<usize>,

    #[arg(long)]
    pub d_layer: Option<usize>,

    #[arg(long)]
    pub head: Option<usize>,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub dropout_n: Option<f64>,

    #[arg(long)]
    pub learning_rate: Option<f64>,

    #[arg(long)]
    pub weight_decay: Option<f64>,

    #[arg(long)]
    pub epochs: Option<usize>,

    /// Shuffle the training source with `--seed`
    #[arg(long)]
    pub shuffle: bool,
}

impl ProbeArgs {
    /// Builds the configuration once; nothing mutates it afterwards.
    pub fn into_config(self) -> Result<ProbeConfig> {
        let mut config = match &self.config {
            Some(path) => ProbeConfig::load_json(path)?,
            None => ProbeConfig::new(),
        };

        if let Some(value) = self.data_path {
            config = config.with_data_path(value);
        }
        if let Some(value) = self.root_path {
            config = config.with_root_path(value);
        }
        if let Some(value) = self.embeddings_path {
            config = config.with_embeddings_path(Some(value));
        }
        if let Some(value) = self.seq_len {
            config = config.with_seq_len(value);
        }
        if let Some(value) = self.pred_len {
            config = config.with_pred_len(value);
        }
        if let Some(value) = self.batch_size {
            config = config.with_batch_size(value);
        }
        if let Some(value) = self.num_workers {
            config = config.with_num_workers(value);
        }
        if let Some(value) = self.device {
            config = config.with_device(value);
        }
        if let Some(value) = self.observe_modules {
            config = config.with_observe_modules(value);
        }
        if let Some(value) = self.checkpoint {
            config = config.with_checkpoint(Some(value));
        }
        if let Some(value) = self.channel {
            config = config.with_channel(value);
        }
        if let Some(value) = self.num_nodes {
            config = config.with_num_nodes(value);
        }
        if let Some(value) = self.d_llm {
            config = config.with_d_llm(value);
        }
        if let Some(value) = self.e_layer {
            config = config.with_e_layer(value);
        }
        if let Some(value) = self.d_layer {
            config = config.with_d_layer(value);
        }
        if let Some(value) = self.head {
            config = config.with_head(value);
        }
        if let Some(value) = self.seed {
            config = config.with_seed(value);
        }
        if let Some(value) = self.dropout_n {
            config = config.with_dropout_n(value);
        }
        if let Some(value) = self.learning_rate {
            config = config.with_learning_rate(value);
        }
        if let Some(value) = self.weight_decay {
            config = config.with_weight_decay(value);
        }
        if let Some(value) = self.epochs {
            config = config.with_epochs(value);
        }
        if self.shuffle {
            config = config.with_shuffle(true);
        }

        Ok(config)
    }
}

/// Directives from `RUST_LOG` when set and valid, `tsprobe=info` otherwise.
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG))
}

/// Logs go to stderr so stdout only carries probe reports.
pub fn init_logging() -> anyhow::Result<()> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
}
