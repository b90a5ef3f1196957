//! In-memory stand-ins for the sample source and the radio.

use std::sync::{Arc, Mutex};

use crate::ComplexSample;
use crate::blocks::{SampleSink, SampleSource, TxControl};
use crate::error::Error;

pub struct MemorySource {
    samples: Vec<ComplexSample>,
    position: usize,
}

impl MemorySource {
    pub fn new(samples: Vec<ComplexSample>) -> Self {
        Self { samples, position: 0 }
    }
}

impl SampleSource for MemorySource {
    fn read(&mut self, buffer: &mut [ComplexSample]) -> Result<usize, Error> {
        let n = buffer.len().min(self.samples.len() - self.position);
        buffer[..n].copy_from_slice(&self.samples[self.position..self.position + n]);
        self.position += n;
        Ok(n)
    }
}

/// Produces the given samples, then blocks like an idle pipe
/// until the sender handed out by [`BlockingSource::new`] is dropped.
pub struct BlockingSource {
    first: MemorySource,
    release: crossbeam_channel::Receiver<()>,
}

impl BlockingSource {
    pub fn new(samples: Vec<ComplexSample>) -> (Self, crossbeam_channel::Sender<()>) {
        let (tx, rx) = crossbeam_channel::bounded(0);
        (Self { first: MemorySource::new(samples), release: rx }, tx)
    }
}

impl SampleSource for BlockingSource {
    fn read(&mut self, buffer: &mut [ComplexSample]) -> Result<usize, Error> {
        let n = self.first.read(buffer)?;
        if n > 0 {
            return Ok(n);
        }
        // Returns once the sender is gone.
        let _ = self.release.recv();
        Ok(0)
    }
}

fn radio_error() -> Error {
    std::io::Error::other("radio failure").into()
}

/// One call made to [`FakeRadio`].
#[derive(Clone, Debug, PartialEq)]
pub enum RadioCall {
    SampleRate(f64),
    CenterFrequency(usize, f64),
    FrequencyCorrection(usize, f64),
    Gain(usize, f64),
    IfGain(usize, f64),
    BbGain(usize, f64),
    Antenna(usize, String),
    Bandwidth(usize, f64),
    Start,
    Finish,
}

/// Records settings and samples. The records stay reachable
/// through the shared handles after the radio is moved into a pipeline.
pub struct FakeRadio {
    calls: Arc<Mutex<Vec<RadioCall>>>,
    written: Arc<Mutex<Vec<ComplexSample>>>,
    /// Index of the recorded call that fails, counting from 0.
    fail_at: Option<usize>,
    fail_writes: bool,
}

impl FakeRadio {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            written: Arc::new(Mutex::new(Vec::new())),
            fail_at: None,
            fail_writes: false,
        }
    }

    /// Radio whose call number `index` is recorded and then fails.
    pub fn failing_at(index: usize) -> Self {
        Self { fail_at: Some(index), ..Self::new() }
    }

    /// Radio that accepts settings but fails every write.
    pub fn failing_writes() -> Self {
        Self { fail_writes: true, ..Self::new() }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<RadioCall>>> {
        self.calls.clone()
    }

    pub fn written(&self) -> Arc<Mutex<Vec<ComplexSample>>> {
        self.written.clone()
    }

    fn record(&self, call: RadioCall) -> Result<(), Error> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        if self.fail_at == Some(calls.len() - 1) {
            return Err(radio_error());
        }
        Ok(())
    }
}

impl TxControl for FakeRadio {
    fn set_sample_rate(&mut self, rate: f64) -> Result<(), Error> {
        self.record(RadioCall::SampleRate(rate))
    }
    fn set_center_frequency(&mut self, channel: usize, frequency: f64) -> Result<(), Error> {
        self.record(RadioCall::CenterFrequency(channel, frequency))
    }
    fn set_frequency_correction(&mut self, channel: usize, ppm: f64) -> Result<(), Error> {
        self.record(RadioCall::FrequencyCorrection(channel, ppm))
    }
    fn set_gain(&mut self, channel: usize, gain: f64) -> Result<(), Error> {
        self.record(RadioCall::Gain(channel, gain))
    }
    fn set_if_gain(&mut self, channel: usize, gain: f64) -> Result<(), Error> {
        self.record(RadioCall::IfGain(channel, gain))
    }
    fn set_bb_gain(&mut self, channel: usize, gain: f64) -> Result<(), Error> {
        self.record(RadioCall::BbGain(channel, gain))
    }
    fn set_antenna(&mut self, channel: usize, antenna: &str) -> Result<(), Error> {
        self.record(RadioCall::Antenna(channel, antenna.to_string()))
    }
    fn set_bandwidth(&mut self, channel: usize, bandwidth: f64) -> Result<(), Error> {
        self.record(RadioCall::Bandwidth(channel, bandwidth))
    }
}

impl SampleSink for FakeRadio {
    fn start(&mut self) -> Result<(), Error> {
        self.record(RadioCall::Start)
    }

    fn write(&mut self, samples: &[ComplexSample]) -> Result<(), Error> {
        if self.fail_writes {
            return Err(radio_error());
        }
        self.written.lock().unwrap().extend_from_slice(samples);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Error> {
        self.record(RadioCall::Finish)
    }
}
