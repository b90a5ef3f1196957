//! Stream endpoints and processing blocks of the transmit pipeline.

use crate::ComplexSample;
use crate::error::Error;

pub mod file_source;
pub use file_source::*;
pub mod scaler;
pub use scaler::*;

/// Complex-sample producer.
pub trait SampleSource {
    /// Fill the beginning of the buffer with new samples.
    /// Returns the number of samples written,
    /// which is 0 only at the end of the stream.
    fn read(&mut self, buffer: &mut [ComplexSample]) -> Result<usize, Error>;
}

/// Complex-sample consumer.
pub trait SampleSink {
    /// Called once before the first write.
    fn start(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Consume a block of samples. The whole block is consumed
    /// before returning.
    fn write(&mut self, samples: &[ComplexSample]) -> Result<(), Error>;

    /// Called once after the last write.
    fn finish(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// Settings of a transmitter front end.
/// Channel-specific setters take the channel number
/// the setting applies to.
pub trait TxControl {
    fn set_sample_rate(&mut self, rate: f64) -> Result<(), Error>;
    fn set_center_frequency(&mut self, channel: usize, frequency: f64) -> Result<(), Error>;
    /// Frequency correction in parts per million.
    fn set_frequency_correction(&mut self, channel: usize, ppm: f64) -> Result<(), Error>;
    fn set_gain(&mut self, channel: usize, gain: f64) -> Result<(), Error>;
    fn set_if_gain(&mut self, channel: usize, gain: f64) -> Result<(), Error>;
    fn set_bb_gain(&mut self, channel: usize, gain: f64) -> Result<(), Error>;
    /// Empty name selects the default antenna.
    fn set_antenna(&mut self, channel: usize, antenna: &str) -> Result<(), Error>;
    fn set_bandwidth(&mut self, channel: usize, bandwidth: f64) -> Result<(), Error>;
}

/// Transmitter hardware: something that can be configured and written to.
pub trait TxDevice: TxControl + SampleSink {}

impl<T: TxControl + SampleSink> TxDevice for T {}
