pub use clap::Parser;

use crate::ComplexSample;

/// DAB channel 11B.
pub const CENTER_FREQUENCY: f64 = 218.640e6;
pub const SAMPLE_RATE: f64 = 3.2e6;
pub const BANDWIDTH: f64 = 1.75e6;
pub const FREQUENCY_CORRECTION_PPM: f64 = 0.0;
pub const OVERALL_GAIN: f64 = 14.0;

pub const DEFAULT_BLOCK_SIZE: usize = 8192;

#[derive(Parser)]
#[command(version, about = "Transmit a DAB I/Q stream with a SoapySDR device")]
pub struct Cli {
    /// SoapySDR device arguments
    /// as pairs like argument_name argument_value...
    /// For example: --sdr-device driver hackrf
    #[arg(long, value_delimiter = ' ', num_args = 2.., default_values = ["driver", "hackrf"])]
    pub sdr_device: Vec<String>,

    /// SoapySDR transmit stream arguments.
    #[arg(long, value_delimiter = ' ', num_args = 2..)]
    pub tx_args: Vec<String>,

    /// Read interleaved f32 I/Q samples from this file.
    /// Standard input is used if not given.
    #[arg(long)]
    pub input: Option<std::path::PathBuf>,

    /// Sample rate to use instead of the DAB default,
    /// set after the rest of the configuration.
    #[arg(long)]
    pub sample_rate: Option<f64>,

    /// IF and baseband gain pair.
    #[arg(long, value_enum, default_value_t = GainProfile::If47Bb14)]
    pub gain_profile: GainProfile,

    /// Number of complex samples moved between stages at a time.
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: usize,

    /// Do not ask for real-time scheduling.
    #[arg(long)]
    pub no_realtime: bool,
}

/// The two gain settings that have been used for transmitting.
/// It is not known which one is correct for the HackRF,
/// so both are kept selectable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum GainProfile {
    /// IF gain 47 dB, baseband gain 14 dB.
    #[value(name = "if47-bb14")]
    If47Bb14,
    /// IF gain 30 dB, baseband gain 30 dB.
    #[value(name = "if30-bb30")]
    If30Bb30,
}

impl GainProfile {
    /// Return (IF gain, baseband gain) in dB.
    pub fn gains(self) -> (f64, f64) {
        match self {
            GainProfile::If47Bb14 => (47.0, 14.0),
            GainProfile::If30Bb30 => (30.0, 30.0),
        }
    }
}

/// Everything that is set on the transmitter before streaming.
#[derive(Clone, Debug, PartialEq)]
pub struct TxConfig {
    /// Transmit channel used.
    pub channel: usize,
    /// Number of transmit channels streamed.
    pub num_channels: usize,
    /// Sample rate in samples per second.
    pub sample_rate: f64,
    /// Center frequency in Hertz.
    pub center_frequency: f64,
    /// Frequency correction in parts per million.
    pub frequency_correction: f64,
    /// Overall gain in dB.
    pub gain: f64,
    /// Intermediate frequency gain in dB.
    pub if_gain: f64,
    /// Baseband gain in dB.
    pub bb_gain: f64,
    /// Antenna name. Empty leaves the driver default.
    pub antenna: String,
    /// Analog bandwidth in Hertz.
    pub bandwidth: f64,
    /// Constant the samples are multiplied with before transmitting.
    pub scale: ComplexSample,
}

impl TxConfig {
    pub fn dab(profile: GainProfile) -> Self {
        let (if_gain, bb_gain) = profile.gains();
        Self {
            channel: 0,
            num_channels: 1,
            sample_rate: SAMPLE_RATE,
            center_frequency: CENTER_FREQUENCY,
            frequency_correction: FREQUENCY_CORRECTION_PPM,
            gain: OVERALL_GAIN,
            if_gain,
            bb_gain,
            antenna: String::new(),
            bandwidth: BANDWIDTH,
            scale: ComplexSample::new(1.0, 0.0),
        }
    }

    pub fn from_cli(cli: &Cli) -> Self {
        Self::dab(cli.gain_profile)
    }
}

impl Default for TxConfig {
    fn default() -> Self {
        Self::dab(GainProfile::If47Bb14)
    }
}
