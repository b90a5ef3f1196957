
pub use num_complex;
/// Floating point type used for signal processing.
pub type Sample = f32;
/// Complex floating point type used for signal processing.
pub type ComplexSample = num_complex::Complex<Sample>;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

mod blocks;
mod configuration;
use configuration::Parser;
mod error;
mod flowgraph;
mod realtime;
mod soapyconfig;
#[cfg(test)]
mod testing;
mod transmitter;


fn run(cli: configuration::Cli) -> Result<(), error::Error> {
    let config = configuration::TxConfig::from_cli(&cli);

    let source: Box<dyn blocks::SampleSource + Send> = match &cli.input {
        Some(path) => {
            log::info!("Reading samples from {}", path.display());
            Box::new(blocks::FileSource::open(path)?)
        },
        None => Box::new(blocks::FileSource::stdin()),
    };

    let sdr = soapyconfig::SoapyTx::open(&cli, &config)?;
    let mut transmitter = transmitter::Transmitter::new(config, source, sdr, cli.block_size)?;
    log::debug!("Connections: {:?}", transmitter.connections());
    if let Some(rate) = cli.sample_rate {
        transmitter.set_sample_rate(rate)?;
    }
    log::info!("Sample rate {} samples/s on TX channel {}",
        transmitter.sample_rate(), transmitter.config().channel);

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        if let Err(err) = ctrlc::set_handler(move || {
            log::warn!("Got Ctrl-C, stopping");
            stop.store(true, Ordering::Relaxed);
        }) {
            log::warn!("Failed to set Ctrl-C handler: {}", err);
        }
    }

    let stats = if cli.no_realtime {
        transmitter.run(stop)?
    } else {
        transmitter::start(transmitter, realtime::enable_realtime_scheduling, stop)?
    };

    if stats.stopped {
        log::info!("Stopped after transmitting {} samples", stats.samples_written);
    } else {
        log::info!("Done, read {} samples, transmitted {}",
            stats.samples_read.unwrap_or(0), stats.samples_written);
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = configuration::Cli::parse();

    if let Err(err) = run(cli) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
