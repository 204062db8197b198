use clap::Parser;

use tsprobe::cli::{init_logging, ProbeArgs};
use tsprobe::data::load_data;
use tsprobe::observe::ShapePrinter;
use tsprobe::probe::{first_batch, run_forward_pass, ParamSnapshot};
use tsprobe::{select_device, Engine, ProbeBackend};

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let config = ProbeArgs::parse().into_config()?;
    let device = select_device(&config.device)?;

    let bundle = load_data::<ProbeBackend>(&config, &device)?;
    let batch = first_batch(bundle.test_loader.as_ref())?;

    let mut engine = Engine::<ProbeBackend>::from_config(&config, bundle.scaler, device)?;
    match &config.checkpoint {
        Some(path) => engine = engine.load_checkpoint(path)?,
        None => tracing::warn!("No checkpoint given, probing freshly initialized weights"),
    }

    let before = ParamSnapshot::capture(&engine.model);
    let output = run_forward_pass(
        &engine.model,
        &batch,
        engine.device(),
        config.observe_modules,
        &mut ShapePrinter,
    )?;
    println!("{}", output.report());

    if !output.shapes_match() {
        tracing::warn!("Prediction and target shapes differ");
    }
    if ParamSnapshot::capture(&engine.model) != before {
        anyhow::bail!("parameters changed during the forward pass");
    }
    tracing::info!("Test batch {}", engine.evaluate(&batch)?);

    Ok(())
}
