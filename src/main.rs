use clap::Parser;
use surface_reshape::config::{Args, Config};
use surface_reshape::reshape::{run, Outcome};
use surface_reshape::utils::io::NiftiStore;
use surface_reshape::utils::verify_targets;

fn main() -> anyhow::Result<()> {
    // Info by default so the detection message shows up, RUST_LOG overrides
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    // Fixed shapes must agree before any file is touched
    verify_targets()?;

    let config = Config::from(Args::parse());
    log::debug!("running {} reshape with {:?}", config.mode, config);

    match run(&config, &NiftiStore)? {
        Outcome::Reshaped { shape } => log::debug!("done, output shape is {:?}", shape),
        Outcome::Skipped { spatial_len } => {
            log::debug!("input is not CIFTI-like ({} spatial samples), no output written", spatial_len)
        }
    }

    Ok(())
}
