use std::path::Path;
use std::sync::Arc;

use burn::data::dataloader::{DataLoader, DataLoaderBuilder};
use burn::data::dataset::Dataset;
use burn::tensor::backend::Backend;

use super::batcher::ForecastBatcher;
use super::batchitem::ForecastBatch;
use super::embeddings::EmbeddingTable;
use super::frame::{time_features, Frequency, TimeSeriesFrame};
use super::scaler::StandardScaler;
use super::window::{Split, SplitBorders, SplitSeries, WindowDataset};
use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};

pub type BatchLoader<B> = Arc<dyn DataLoader<ForecastBatch<B>>>;

/// Everything the data side hands to a probe.
pub struct DataBundle<B: Backend> {
    pub train_set: WindowDataset,
    pub val_set: WindowDataset,
    pub test_set: WindowDataset,
    pub train_loader: BatchLoader<B>,
    pub val_loader: BatchLoader<B>,
    pub test_loader: BatchLoader<B>,
    pub scaler: StandardScaler,
}

/// Reads `<root_path>/<data_path>.csv` and builds the three splits.
pub fn load_data<B: Backend>(config: &ProbeConfig, device: &B::Device) -> Result<DataBundle<B>> {
    let path = Path::new(&config.root_path).join(format!("{}.csv", config.data_path));
    tracing::info!("Loading dataset {:?}", path);

    let frame = TimeSeriesFrame::from_csv(&path, config.data_path.clone())?;
    load_data_from_frame(config, &frame, device)
}

pub fn load_data_from_frame<B: Backend>(
    config: &ProbeConfig,
    frame: &TimeSeriesFrame,
    device: &B::Device,
) -> Result<DataBundle<B>> {
    let num_nodes = frame.num_columns();
    if num_nodes != config.num_nodes {
        return Err(ProbeError::ChannelMismatch {
            expected: config.num_nodes,
            actual: num_nodes,
        });
    }

    let borders = SplitBorders::for_dataset(frame.name(), frame.num_rows(), config.seq_len)?;
    let freq = Frequency::for_dataset(frame.name());
    let num_marks = freq.num_features();

    let train_rows = borders.range(Split::Train);
    let scaler = StandardScaler::fit(
        &frame.values()[train_rows.start * num_nodes..train_rows.end * num_nodes],
        num_nodes,
    );

    let build_split = |split: Split| -> Result<WindowDataset> {
        let rows = borders.range(split);
        let series = SplitSeries {
            values: scaler
                .transform(&frame.values()[rows.start * num_nodes..rows.end * num_nodes]),
            marks: time_features(&frame.timestamps()[rows.clone()], freq),
            num_nodes,
            num_marks,
            embeddings: EmbeddingTable::for_split(
                config.embeddings_path.as_deref(),
                split.name(),
                num_nodes * config.d_llm,
            )?,
        };

        let dataset = WindowDataset::new(split, series, config.seq_len, config.pred_len)?;
        tracing::info!(
            "{} split: rows {:?}, {} windows",
            split.name(),
            rows,
            dataset.len()
        );
        Ok(dataset)
    };

    let train_set = build_split(Split::Train)?;
    let val_set = build_split(Split::Val)?;
    let test_set = build_split(Split::Test)?;

    Ok(DataBundle {
        train_loader: build_loader(config, train_set.clone(), num_marks, device, config.shuffle),
        val_loader: build_loader(config, val_set.clone(), num_marks, device, false),
        test_loader: build_loader(config, test_set.clone(), num_marks, device, false),
        train_set,
        val_set,
        test_set,
        scaler,
    })
}

/// Wraps a split in burn's dataloader. With `num_workers == 0` batches are
/// produced on the calling thread in dataset order.
pub fn build_loader<B: Backend>(
    config: &ProbeConfig,
    dataset: WindowDataset,
    num_marks: usize,
    device: &B::Device,
    shuffle: bool,
) -> BatchLoader<B> {
    let batcher = ForecastBatcher::<B>::new(
        device.clone(),
        config.seq_len,
        config.pred_len,
        config.num_nodes,
        num_marks,
        config.d_llm,
    );

    let mut builder = DataLoaderBuilder::new(batcher).batch_size(config.batch_size);
    if shuffle {
        builder = builder.shuffle(config.seed);
    }
    if config.num_workers > 0 {
        builder = builder.num_workers(config.num_workers);
    }

    builder.build(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use chrono::{Duration, NaiveDate};

    type TestBackend = NdArray<f32>;

    fn frame(name: &str, rows: usize, columns: usize) -> TimeSeriesFrame {
        let start = NaiveDate::from_ymd_opt(2016, 7, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap();
        let timestamps = (0..rows)
            .map(|i| start + Duration::hours(i as i64))
            .collect();
        let values = (0..rows * columns)
            .map(|i| ((i / columns) as f32 * 0.1).sin() + (i % columns) as f32)
            .collect();

        TimeSeriesFrame::new(
            name,
            (0..columns).map(|c| format!("v{c}")).collect(),
            timestamps,
            values,
        )
        .unwrap()
    }

    fn config() -> ProbeConfig {
        ProbeConfig::new()
            .with_data_path("synthetic".into())
            .with_seq_len(24)
            .with_pred_len(12)
            .with_batch_size(4)
            .with_num_nodes(3)
            .with_d_llm(5)
    }

    #[test]
    fn builds_three_splits() {
        let data = frame("synthetic", 400, 3);
        let bundle =
            load_data_from_frame::<TestBackend>(&config(), &data, &Default::default()).unwrap();

        // 280 / 40 / 80 rows, val and test extended back by seq_len.
        assert_eq!(bundle.train_set.len(), 280 - 36 + 1);
        assert_eq!(bundle.val_set.len(), 64 - 36 + 1);
        assert_eq!(bundle.test_set.len(), 104 - 36 + 1);
        assert_eq!(bundle.train_loader.num_items(), bundle.train_set.len());
        assert_eq!(bundle.scaler.num_columns(), 3);
    }

    #[test]
    fn scaler_is_fitted_on_train_rows_only() {
        let data = frame("synthetic", 400, 3);
        let bundle =
            load_data_from_frame::<TestBackend>(&config(), &data, &Default::default()).unwrap();

        let expected = StandardScaler::fit(&data.values()[..280 * 3], 3);
        assert_eq!(bundle.scaler, expected);
    }

    #[test]
    fn loader_yields_configured_batches() {
        let data = frame("synthetic", 400, 3);
        let bundle =
            load_data_from_frame::<TestBackend>(&config(), &data, &Default::default()).unwrap();

        let batch = bundle.test_loader.iter().next().unwrap();
        assert_eq!(batch.x.dims(), [4, 24, 3]);
        assert_eq!(batch.y.dims(), [4, 12, 3]);
        assert_eq!(batch.x_mark.dims(), [4, 24, 4]);
        assert_eq!(batch.y_mark.dims(), [4, 12, 4]);
        assert_eq!(batch.embeddings.dims(), [4, 3, 5]);
    }

    #[test]
    fn channel_count_must_match() {
        let result = load_data_from_frame::<TestBackend>(
            &config().with_num_nodes(7),
            &frame("synthetic", 400, 3),
            &Default::default(),
        );

        assert!(matches!(
            result,
            Err(ProbeError::ChannelMismatch { expected: 7, actual: 3 })
        ));
    }

    #[test]
    fn missing_dataset_file_is_reported() {
        let result = load_data::<TestBackend>(
            &config().with_root_path("/nonexistent".into()),
            &Default::default(),
        );

        assert!(matches!(result, Err(ProbeError::Csv { .. })));
    }
}
