use burn::backend::ndarray::NdArrayDevice;
use burn::config::Config;

use crate::error::ProbeError;

/// Settings shared by the data loader, the model and the probes.
///
/// Values are never mutated after construction; `with_*` returns an
/// overridden copy.
#[derive(Config, Debug)]
pub struct ProbeConfig {
    /// Dataset identifier, resolved to `<root_path>/<data_path>.csv`.
    #[config(default = "String::from(\"ETTh1\")")]
    pub data_path: String,

    #[config(default = "String::from(\"dataset\")")]
    pub root_path: String,

    /// Directory with `<split>.jsonl` prompt embeddings. Zeros when unset.
    #[config(default = "None")]
    pub embeddings_path: Option<String>,

    #[config(default = 96)]
    pub seq_len: usize,

    #[config(default = 96)]
    pub pred_len: usize,

    #[config(default = 8)]
    pub batch_size: usize,

    /// 0 keeps batch production on the calling thread.
    #[config(default = 0)]
    pub num_workers: usize,

    #[config(default = false)]
    pub shuffle: bool,

    #[config(default = 2024)]
    pub seed: u64,

    #[config(default = 32)]
    pub channel: usize,

    #[config(default = 7)]
    pub num_nodes: usize,

    #[config(default = 0.2)]
    pub dropout_n: f64,

    #[config(default = 768)]
    pub d_llm: usize,

    #[config(default = 1)]
    pub e_layer: usize,

    #[config(default = 1)]
    pub d_layer: usize,

    #[config(default = 8)]
    pub head: usize,

    #[config(default = 1e-4)]
    pub learning_rate: f64,

    #[config(default = 1e-3)]
    pub weight_decay: f64,

    #[config(default = 100)]
    pub epochs: usize,

    #[config(default = "String::from(\"cpu\")")]
    pub device: String,

    /// How many named sub-modules the forward probe observes.
    #[config(default = 10)]
    pub observe_modules: usize,

    #[config(default = "None")]
    pub checkpoint: Option<String>,
}

impl ProbeConfig {
    pub fn load_json(path: &str) -> crate::error::Result<Self> {
        Self::load(path).map_err(|err| ProbeError::Config(format!("{path}: {err:?}")))
    }
}

/// Resolves the configured device name once at startup.
///
/// `auto` picks an accelerator when one exists, which with the ndarray
/// backend is never the case.
pub fn select_device(name: &str) -> crate::error::Result<NdArrayDevice> {
    match name.to_ascii_lowercase().as_str() {
        "cpu" => Ok(NdArrayDevice::Cpu),
        "auto" => {
            tracing::info!("no accelerator backend compiled in, using cpu");
            Ok(NdArrayDevice::Cpu)
        }
        _ => Err(ProbeError::UnsupportedDevice(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_probe_setup() {
        let config = ProbeConfig::new();

        assert_eq!(config.data_path, "ETTh1");
        assert_eq!(config.seq_len, 96);
        assert_eq!(config.pred_len, 96);
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.num_workers, 0);
        assert_eq!(config.observe_modules, 10);
        assert!(config.embeddings_path.is_none());
    }

    #[test]
    fn overrides_produce_new_value() {
        let base = ProbeConfig::new();
        let tweaked = base.clone().with_seq_len(48).with_data_path("ETTm1".into());

        assert_eq!(base.seq_len, 96);
        assert_eq!(base.data_path, "ETTh1");
        assert_eq!(tweaked.seq_len, 48);
        assert_eq!(tweaked.data_path, "ETTm1");
    }

    #[test]
    fn device_selection() {
        assert_eq!(select_device("cpu").unwrap(), NdArrayDevice::Cpu);
        assert_eq!(select_device("AUTO").unwrap(), NdArrayDevice::Cpu);
        assert!(matches!(
            select_device("cuda"),
            Err(ProbeError::UnsupportedDevice(name)) if name == "cuda"
        ));
    }
}
