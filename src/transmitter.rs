use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::blocks::{SampleSource, Scaler, TxControl, TxDevice};
use crate::configuration::TxConfig;
use crate::error::Error;
use crate::flowgraph::{BlockId, Connection, Pipeline, Port, RunStats};
use crate::realtime::{self, RealtimeError};

/// Apply every setting of the configuration to the radio.
pub fn configure(radio: &mut dyn TxControl, config: &TxConfig) -> Result<(), Error> {
    let ch = config.channel;
    radio.set_sample_rate(config.sample_rate)?;
    radio.set_center_frequency(ch, config.center_frequency)?;
    radio.set_frequency_correction(ch, config.frequency_correction)?;
    radio.set_gain(ch, config.gain)?;
    radio.set_if_gain(ch, config.if_gain)?;
    radio.set_bb_gain(ch, config.bb_gain)?;
    radio.set_antenna(ch, &config.antenna)?;
    radio.set_bandwidth(ch, config.bandwidth)?;
    log::info!(
        "Transmitting on {:.3} MHz at {} samples/s, bandwidth {:.2} MHz, gains {}/{}/{} dB",
        config.center_frequency / 1e6,
        config.sample_rate,
        config.bandwidth / 1e6,
        config.gain,
        config.if_gain,
        config.bb_gain,
    );
    Ok(())
}

/// Source, scaler and radio connected in series.
pub struct Transmitter<K> {
    config: TxConfig,
    pipeline: Pipeline<K>,
    radio: BlockId,
}

impl<K: TxDevice> Transmitter<K> {
    /// Configure the radio and connect the pipeline.
    pub fn new(
        config: TxConfig,
        source: Box<dyn SampleSource + Send>,
        mut radio: K,
        block_size: usize,
    ) -> Result<Self, Error> {
        configure(&mut radio, &config)?;

        let mut pipeline = Pipeline::new(block_size);
        let source = pipeline.add_source(source);
        let scaler = pipeline.add_scaler(Scaler::new(config.scale));
        let radio = pipeline.add_sink(radio);
        pipeline.connect(Port::new(source, 0), Port::new(scaler, 0))?;
        pipeline.connect(Port::new(scaler, 0), Port::new(radio, 0))?;

        Ok(Self {
            config,
            pipeline,
            radio,
        })
    }

    pub fn config(&self) -> &TxConfig {
        &self.config
    }

    pub fn connections(&self) -> &[Connection] {
        self.pipeline.connections()
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }

    /// Change the sample rate. The radio is retuned immediately.
    pub fn set_sample_rate(&mut self, rate: f64) -> Result<(), Error> {
        self.pipeline.sink_mut(self.radio)?.set_sample_rate(rate)?;
        self.config.sample_rate = rate;
        Ok(())
    }

    /// Run until the input ends or `stop` is set.
    pub fn run(self, stop: Arc<AtomicBool>) -> Result<RunStats, Error> {
        self.pipeline.run(stop)
    }
}

/// Ask for real-time scheduling, then run the transmitter.
/// Failing to get real-time scheduling is not fatal.
pub fn start<K: TxDevice>(
    transmitter: Transmitter<K>,
    enable_realtime: impl FnOnce() -> Result<(), RealtimeError>,
    stop: Arc<AtomicBool>,
) -> Result<RunStats, Error> {
    if !realtime::request_realtime(enable_realtime) {
        log::info!("Running at normal scheduling priority");
    }
    transmitter.run(stop)
}
