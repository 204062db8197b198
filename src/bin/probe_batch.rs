use clap::Parser;

use tsprobe::cli::{init_logging, ProbeArgs};
use tsprobe::data::load_data;
use tsprobe::probe::fetch_one_batch;
use tsprobe::{select_device, ProbeBackend};

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let config = ProbeArgs::parse().into_config()?;
    let device = select_device(&config.device)?;

    let bundle = load_data::<ProbeBackend>(&config, &device)?;
    tracing::info!(
        "train/val/test windows: {}/{}/{}",
        bundle.train_loader.num_items(),
        bundle.val_loader.num_items(),
        bundle.test_loader.num_items()
    );

    fetch_one_batch(bundle.train_loader.as_ref())?;

    Ok(())
}
