use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};

use tsprobe::data::{load_data, DataBundle};
use tsprobe::observe::ShapeRecorder;
use tsprobe::probe::{
    describe_batch, fetch_one_batch, first_batch, run_forward_pass, ParamSnapshot,
};
use tsprobe::{Engine, ProbeBackend, ProbeConfig, ProbeError};

const ROWS: usize = 1000;
const NODES: usize = 7;

/// Writes an hourly CSV with `ROWS` rows of `NODES` variates and returns its
/// directory.
fn write_dataset(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tsprobe-it-{}-{}", tag, std::process::id()));
    fs::create_dir_all(&dir).unwrap();

    let mut file = fs::File::create(dir.join("synthetic.csv")).unwrap();
    let header: Vec<String> = (0..NODES).map(|c| format!("v{c}")).collect();
    writeln!(file, "date,{}", header.join(",")).unwrap();

    let start = NaiveDate::from_ymd_opt(2016, 7, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap();
    for row in 0..ROWS {
        let stamp = start + Duration::hours(row as i64);
        let values: Vec<String> = (0..NODES)
            .map(|c| format!("{:.4}", (row as f32 * 0.05 + c as f32).sin() * (c + 1) as f32))
            .collect();
        writeln!(file, "{},{}", stamp.format("%Y-%m-%d %H:%M:%S"), values.join(",")).unwrap();
    }

    dir
}

fn config(dir: &Path) -> ProbeConfig {
    ProbeConfig::new()
        .with_root_path(dir.to_string_lossy().into_owned())
        .with_data_path("synthetic".into())
        .with_num_nodes(NODES)
        .with_channel(8)
        .with_head(2)
        .with_d_llm(16)
}

fn bundle(config: &ProbeConfig) -> DataBundle<ProbeBackend> {
    load_data::<ProbeBackend>(config, &Default::default()).unwrap()
}

#[test]
fn first_train_batch_has_the_configured_geometry() {
    let dir = write_dataset("geometry");
    let config = config(&dir);
    let bundle = bundle(&config);

    let batch = fetch_one_batch(bundle.train_loader.as_ref()).unwrap();
    let report = describe_batch(&batch);
    fs::remove_dir_all(&dir).ok();

    assert_eq!(report.shape_of("x"), Some([8, 96, NODES].as_slice()));
    assert_eq!(report.shape_of("y"), Some([8, 96, NODES].as_slice()));
    assert_eq!(report.shape_of("x_mark"), Some([8, 96, 4].as_slice()));
    assert_eq!(report.shape_of("y_mark"), Some([8, 96, 4].as_slice()));
    assert_eq!(report.shape_of("embeddings"), Some([8, NODES, 16].as_slice()));
    assert_eq!(report.device, "Cpu");
}

#[test]
fn fresh_loaders_yield_identical_first_batches() {
    let dir = write_dataset("determinism");
    let config = config(&dir);

    let first = first_batch(bundle(&config).train_loader.as_ref()).unwrap();
    let second = first_batch(bundle(&config).train_loader.as_ref()).unwrap();
    fs::remove_dir_all(&dir).ok();

    for ((name, a), (_, b)) in first.named_tensors().into_iter().zip(second.named_tensors()) {
        assert_eq!(
            a.clone().into_data().value,
            b.clone().into_data().value,
            "{name} differs"
        );
    }
}

#[test]
fn forward_pass_is_read_only_and_unaffected_by_observers() {
    let dir = write_dataset("forward");
    let config = config(&dir);
    let bundle = bundle(&config);
    fs::remove_dir_all(&dir).ok();

    let batch = first_batch(bundle.test_loader.as_ref()).unwrap();
    let engine = Engine::<ProbeBackend>::from_config(&config, bundle.scaler, Default::default())
        .unwrap();
    let before = ParamSnapshot::capture(&engine.model);

    let mut silent = ShapeRecorder::default();
    let plain = run_forward_pass(&engine.model, &batch, engine.device(), 0, &mut silent).unwrap();

    let mut recorder = ShapeRecorder::default();
    let observed = run_forward_pass(
        &engine.model,
        &batch,
        engine.device(),
        config.observe_modules,
        &mut recorder,
    )
    .unwrap();

    assert_eq!(plain.prediction.dims(), [8, 96, NODES]);
    assert!(plain.shapes_match());
    assert_eq!(ParamSnapshot::capture(&engine.model), before);
    assert_eq!(
        plain.prediction.into_data().value,
        observed.prediction.into_data().value
    );

    assert!(silent.invocations().is_empty());
    assert!(!recorder.names().contains(&"decoder"));
    assert!(!recorder.names().contains(&"projection"));
    assert_eq!(recorder.names().last(), Some(&"model"));
}

#[test]
fn missing_dataset_propagates() {
    let config = ProbeConfig::new().with_root_path("/nonexistent".into());
    let result = load_data::<ProbeBackend>(&config, &Default::default());

    assert!(matches!(result, Err(ProbeError::Csv { .. })));
}
