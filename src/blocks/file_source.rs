use std::io::Read;

use byteorder::{ByteOrder, NativeEndian};

use super::SampleSource;
use crate::{ComplexSample, Sample};
use crate::error::Error;

/// Bytes in one interleaved I/Q sample.
const BYTES_PER_SAMPLE: usize = 2 * std::mem::size_of::<Sample>();

/// Reads interleaved native-endian f32 I/Q samples from a byte stream.
/// Does not repeat at the end of the stream.
pub struct FileSource<R> {
    reader: R,
    /// Raw bytes read but not yet converted.
    /// Holds a partial sample between reads.
    bytes: Vec<u8>,
    /// Number of valid bytes at the beginning of `bytes`.
    pending: usize,
    floats: Vec<Sample>,
    eof: bool,
}

impl FileSource<std::io::Stdin> {
    pub fn stdin() -> Self {
        Self::new(std::io::stdin())
    }
}

impl FileSource<std::io::BufReader<std::fs::File>> {
    pub fn open(path: &std::path::Path) -> Result<Self, Error> {
        Ok(Self::new(std::io::BufReader::new(std::fs::File::open(path)?)))
    }
}

impl<R: Read> FileSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            bytes: Vec::new(),
            pending: 0,
            floats: Vec::new(),
            eof: false,
        }
    }
}

impl<R: Read> SampleSource for FileSource<R> {
    fn read(&mut self, buffer: &mut [ComplexSample]) -> Result<usize, Error> {
        let wanted = buffer.len() * BYTES_PER_SAMPLE;
        if self.bytes.len() < wanted {
            self.bytes.resize(wanted, 0);
        }

        // Keep reading until at least one whole sample is available
        // so that 0 is only returned at the end of the stream.
        while !self.eof && self.pending < BYTES_PER_SAMPLE.min(wanted) {
            match self.reader.read(&mut self.bytes[self.pending..wanted]) {
                Ok(0) => { self.eof = true; },
                Ok(n) => { self.pending += n; },
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {},
                Err(err) => return Err(err.into()),
            }
        }

        let samples = (self.pending / BYTES_PER_SAMPLE).min(buffer.len());
        let used = samples * BYTES_PER_SAMPLE;
        if samples == 0 {
            if self.eof && self.pending > 0 && self.pending < BYTES_PER_SAMPLE {
                log::warn!("Discarding {} bytes of incomplete sample at end of input", self.pending);
                self.pending = 0;
            }
            return Ok(0);
        }

        self.floats.resize(samples * 2, 0.0);
        NativeEndian::read_f32_into(&self.bytes[..used], &mut self.floats);
        for (sample, iq) in buffer.iter_mut().zip(self.floats.chunks_exact(2)) {
            *sample = ComplexSample::new(iq[0], iq[1]);
        }

        self.bytes.copy_within(used..self.pending, 0);
        self.pending -= used;
        Ok(samples)
    }
}
