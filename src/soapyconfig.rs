use soapysdr;
use crate::blocks::{SampleSink, TxControl};
use crate::configuration;
use crate::error::Error;

type StreamType = crate::ComplexSample;

const TX: soapysdr::Direction = soapysdr::Direction::Tx;

/// Timeout for writing one block, in microseconds.
const WRITE_TIMEOUT_US: i64 = 1_000_000;

/// Which gain elements of a device receive the IF and baseband gains.
struct GainElements<'a> {
    /// Name used to print which SDR was detected
    pub name: &'a str,
    /// Element set by the IF gain. None if the device has no such stage.
    pub if_gain: Option<&'a str>,
    /// Element set by the baseband gain.
    pub bb_gain: Option<&'a str>,
}

/// HackRF has an IF amplifier (VGA) but no separate baseband gain on transmit.
const GAIN_ELEMENTS_HACKRF: GainElements = GainElements {
    name: "HackRF",
    if_gain: Some("VGA"),
    bb_gain: None,
};

const GAIN_ELEMENTS_LIME: GainElements = GainElements {
    name: "LimeSDR",
    if_gain: Some("PAD"),
    bb_gain: Some("IAMP"),
};

/// Any other SDR
const GAIN_ELEMENTS: GainElements = GainElements {
    name: "unknown SDR device",
    if_gain: Some("IF"),
    bb_gain: Some("BB"),
};

/// Frequency component that takes the correction in ppm.
const CORRECTION_COMPONENT: &str = "CORR";

/// Convert command line device arguments to soapysdr::Args.
fn convert_args(cli_args: &[String]) -> soapysdr::Args {
    let mut args = soapysdr::Args::new();
    for arg in cli_args.chunks_exact(2) {
        args.set(arg[0].as_str(), arg[1].as_str());
    }
    args
}

/// It is annoying to repeat error handling so do that in a macro.
/// ? could be used but then it could not print which SoapySDR call failed.
macro_rules! soapycheck {
    ($text:literal, $soapysdr_call:expr) => {
        match $soapysdr_call {
            Ok(ret) => { ret },
            Err(err) => {
                log::error!("SoapySDR: Failed to {}: {}", $text, err);
                return Err(err.into());
            }
        }
    }
}

/// Transmit side of a SoapySDR device.
pub struct SoapyTx {
    dev: soapysdr::Device,
    /// Channels streamed. Sample rate is set on all of them.
    channels: Vec<usize>,
    /// Stream arguments from command line, as pairs.
    stream_args: Vec<String>,
    gain_elements: &'static GainElements<'static>,
    /// Transmit stream. None until started.
    tx: Option<soapysdr::TxStream<StreamType>>,
}

impl SoapyTx {
    /// Open the device. Settings are applied through [`TxControl`]
    /// and the stream is set up when the sink is started.
    pub fn open(cli: &configuration::Cli, config: &configuration::TxConfig) -> Result<Self, Error> {
        let dev = soapycheck!("open SoapySDR device",
            soapysdr::Device::new(convert_args(&cli.sdr_device)));

        let available = soapycheck!("get number of TX channels", dev.num_channels(TX));
        if config.channel + config.num_channels > available {
            log::error!("Device has {} TX channels, channel {} requested", available, config.channel);
            return Err(soapysdr::Error {
                code: soapysdr::ErrorCode::NotSupported,
                message: "not enough TX channels".to_string(),
            }.into());
        }

        let gain_elements = match(
            dev.driver_key()  .unwrap_or("".to_string()).to_lowercase().as_str(),
            dev.hardware_key().unwrap_or("".to_string()).to_lowercase().as_str()
        ) {
            ("hackrf", _) => &GAIN_ELEMENTS_HACKRF,
            (_, hw) if hw.starts_with("hackrf") => &GAIN_ELEMENTS_HACKRF,

            ("lime", _) => &GAIN_ELEMENTS_LIME,
            (_, hw) if hw.starts_with("limesdr") => &GAIN_ELEMENTS_LIME,

            (_, _) => &GAIN_ELEMENTS,
        };
        log::info!("Using gain elements for {}", gain_elements.name);

        Ok(Self {
            dev,
            channels: (config.channel..config.channel + config.num_channels).collect(),
            stream_args: cli.tx_args.clone(),
            gain_elements,
            tx: None,
        })
    }

    /// Set a gain element if the device has it.
    fn set_gain_element(
        &mut self,
        channel: usize,
        kind: &str,
        element: Option<&str>,
        gain: f64,
    ) -> Result<(), Error> {
        let elements = soapycheck!("list gain elements", self.dev.list_gains(TX, channel));
        match element {
            Some(name) if elements.iter().any(|e| e == name) => {
                soapycheck!("set gain element",
                    self.dev.set_gain_element(TX, channel, name, gain));
                log::debug!("{} gain: {} = {} dB", kind, name, gain);
            },
            _ => {
                log::warn!("{} has no {} gain stage, ignoring {} dB",
                    self.gain_elements.name, kind, gain);
            },
        }
        Ok(())
    }
}

impl TxControl for SoapyTx {
    fn set_sample_rate(&mut self, rate: f64) -> Result<(), Error> {
        for &channel in &self.channels {
            soapycheck!("set TX sample rate",
                self.dev.set_sample_rate(TX, channel, rate));
        }
        log::debug!("Sample rate {}", rate);
        Ok(())
    }

    fn set_center_frequency(&mut self, channel: usize, frequency: f64) -> Result<(), Error> {
        soapycheck!("set TX center frequency",
            self.dev.set_frequency(TX, channel, frequency, soapysdr::Args::new()));
        Ok(())
    }

    fn set_frequency_correction(&mut self, channel: usize, ppm: f64) -> Result<(), Error> {
        let components = soapycheck!("list frequency components",
            self.dev.list_frequencies(TX, channel));
        if components.iter().any(|c| c == CORRECTION_COMPONENT) {
            soapycheck!("set frequency correction",
                self.dev.set_component_frequency(TX, channel, CORRECTION_COMPONENT, ppm, soapysdr::Args::new()));
        } else if ppm != 0.0 {
            log::warn!("{} has no frequency correction, ignoring {} ppm",
                self.gain_elements.name, ppm);
        }
        Ok(())
    }

    fn set_gain(&mut self, channel: usize, gain: f64) -> Result<(), Error> {
        soapycheck!("set overall gain",
            self.dev.set_gain(TX, channel, gain));
        Ok(())
    }

    fn set_if_gain(&mut self, channel: usize, gain: f64) -> Result<(), Error> {
        let element = self.gain_elements.if_gain;
        self.set_gain_element(channel, "IF", element, gain)
    }

    fn set_bb_gain(&mut self, channel: usize, gain: f64) -> Result<(), Error> {
        let element = self.gain_elements.bb_gain;
        self.set_gain_element(channel, "baseband", element, gain)
    }

    fn set_antenna(&mut self, channel: usize, antenna: &str) -> Result<(), Error> {
        if antenna.is_empty() {
            log::debug!("Using default TX antenna");
            return Ok(());
        }
        soapycheck!("set TX antenna",
            self.dev.set_antenna(TX, channel, antenna));
        Ok(())
    }

    fn set_bandwidth(&mut self, channel: usize, bandwidth: f64) -> Result<(), Error> {
        soapycheck!("set TX bandwidth",
            self.dev.set_bandwidth(TX, channel, bandwidth));
        Ok(())
    }
}

impl SampleSink for SoapyTx {
    fn start(&mut self) -> Result<(), Error> {
        let mut tx = soapycheck!("setup TX stream",
            self.dev.tx_stream_args(&self.channels, convert_args(&self.stream_args)));
        soapycheck!("activate TX stream",
            tx.activate(None));
        self.tx = Some(tx);
        Ok(())
    }

    fn write(&mut self, samples: &[StreamType]) -> Result<(), Error> {
        let Some(tx) = &mut self.tx else {
            return Err(Error::SinkNotStarted);
        };
        soapycheck!("write to TX stream",
            tx.write_all(&[samples], None, false, WRITE_TIMEOUT_US));
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Error> {
        if let Some(mut tx) = self.tx.take() {
            soapycheck!("deactivate TX stream",
                tx.deactivate(None));
        }
        Ok(())
    }
}
