//! Connecting blocks into a pipeline and running it.
//!
//! The source and each scaler get a worker thread of their own.
//! The sink runs on the thread calling [`Pipeline::run`],
//! so it does not need to be `Send`.
//! Blocks of samples are passed between threads through bounded channels,
//! so a sink that cannot keep up slows down the source.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::ComplexSample;
use crate::blocks::{SampleSink, SampleSource, Scaler};
use crate::error::Error;

/// Number of sample blocks buffered between two stages.
const QUEUE_DEPTH: usize = 16;

/// How often a sink waiting for samples checks for a stop request.
const STOP_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(100);

type SampleBlock = Vec<ComplexSample>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(usize);

impl BlockId {
    /// Position of the block in the order blocks were added.
    pub fn index(self) -> usize {
        self.0
    }
}

/// An input or output port of a block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Port {
    pub block: BlockId,
    pub index: usize,
}

impl Port {
    pub fn new(block: BlockId, index: usize) -> Self {
        Self { block, index }
    }
}

/// Output port `from` feeds input port `to`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub from: Port,
    pub to: Port,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("no block {0:?}")]
    UnknownBlock(BlockId),
    #[error("{block:?} has no output port {index}")]
    NoSuchOutput { block: BlockId, index: usize },
    #[error("{block:?} has no input port {index}")]
    NoSuchInput { block: BlockId, index: usize },
    #[error("input {0:?} is already connected")]
    InputAlreadyConnected(Port),
    #[error("output {0:?} is already connected")]
    OutputAlreadyConnected(Port),
    #[error("pipeline must have exactly one source, found {0}")]
    SourceCount(usize),
    #[error("{0:?} is not connected to the chain")]
    Unconnected(BlockId),
    #[error("{0:?} is not a sink")]
    NotASink(BlockId),
    #[error("chain does not end in a sink")]
    NoSink,
}

enum Block<K> {
    Source(Box<dyn SampleSource + Send>),
    Scaler(Scaler),
    Sink(K),
}

impl<K> Block<K> {
    fn num_inputs(&self) -> usize {
        match self {
            Block::Source(_) => 0,
            Block::Scaler(_) | Block::Sink(_) => 1,
        }
    }

    fn num_outputs(&self) -> usize {
        match self {
            Block::Source(_) | Block::Scaler(_) => 1,
            Block::Sink(_) => 0,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Block::Source(_) => "source",
            Block::Scaler(_) => "scaler",
            Block::Sink(_) => "sink",
        }
    }
}

/// Sample counts of a finished run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Samples produced by the source.
    /// Not known if the run was stopped before the source finished.
    pub samples_read: Option<u64>,
    /// Samples consumed by the sink.
    pub samples_written: u64,
    /// True if the run ended because of a stop request.
    pub stopped: bool,
}

/// Blocks and the connections between them.
/// `K` is the type of sink blocks.
pub struct Pipeline<K> {
    blocks: Vec<Block<K>>,
    connections: Vec<Connection>,
    block_size: usize,
}

impl<K: SampleSink> Pipeline<K> {
    /// `block_size` is the number of samples moved between stages at a time.
    pub fn new(block_size: usize) -> Self {
        Self {
            blocks: Vec::new(),
            connections: Vec::new(),
            block_size: block_size.max(1),
        }
    }

    fn add(&mut self, block: Block<K>) -> BlockId {
        self.blocks.push(block);
        BlockId(self.blocks.len() - 1)
    }

    pub fn add_source(&mut self, source: Box<dyn SampleSource + Send>) -> BlockId {
        self.add(Block::Source(source))
    }

    pub fn add_scaler(&mut self, scaler: Scaler) -> BlockId {
        self.add(Block::Scaler(scaler))
    }

    pub fn add_sink(&mut self, sink: K) -> BlockId {
        self.add(Block::Sink(sink))
    }

    fn block(&self, id: BlockId) -> Result<&Block<K>, PipelineError> {
        self.blocks.get(id.0).ok_or(PipelineError::UnknownBlock(id))
    }

    /// Connect an output port to an input port.
    /// An input can only have one incoming connection.
    pub fn connect(&mut self, from: Port, to: Port) -> Result<(), PipelineError> {
        if from.index >= self.block(from.block)?.num_outputs() {
            return Err(PipelineError::NoSuchOutput { block: from.block, index: from.index });
        }
        if to.index >= self.block(to.block)?.num_inputs() {
            return Err(PipelineError::NoSuchInput { block: to.block, index: to.index });
        }
        if self.connections.iter().any(|c| c.to == to) {
            return Err(PipelineError::InputAlreadyConnected(to));
        }
        // Passing the same block to two consumers is not supported.
        if self.connections.iter().any(|c| c.from == from) {
            return Err(PipelineError::OutputAlreadyConnected(from));
        }
        self.connections.push(Connection { from, to });
        Ok(())
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn sink_mut(&mut self, id: BlockId) -> Result<&mut K, PipelineError> {
        match self.blocks.get_mut(id.0) {
            Some(Block::Sink(sink)) => Ok(sink),
            Some(_) => Err(PipelineError::NotASink(id)),
            None => Err(PipelineError::UnknownBlock(id)),
        }
    }

    /// Order of blocks from the source to the sink.
    fn chain(&self) -> Result<Vec<BlockId>, PipelineError> {
        let sources: Vec<BlockId> = self.blocks.iter().enumerate()
            .filter(|(_, b)| matches!(b, Block::Source(_)))
            .map(|(i, _)| BlockId(i))
            .collect();
        if sources.len() != 1 {
            return Err(PipelineError::SourceCount(sources.len()));
        }

        let mut chain = vec![sources[0]];
        let mut current = sources[0];
        while let Some(next) = self.connections.iter()
            .find(|c| c.from == Port::new(current, 0))
            .map(|c| c.to.block)
        {
            chain.push(next);
            current = next;
        }

        if !matches!(self.blocks[current.0], Block::Sink(_)) {
            return Err(PipelineError::NoSink);
        }
        if let Some(unused) = (0..self.blocks.len()).map(BlockId).find(|id| !chain.contains(id)) {
            return Err(PipelineError::Unconnected(unused));
        }
        Ok(chain)
    }

    /// Run until the source ends and everything is written to the sink,
    /// or until `stop` is set.
    pub fn run(self, stop: Arc<AtomicBool>) -> Result<RunStats, Error> {
        let chain = self.chain()?;
        let block_size = self.block_size;
        let mut blocks: Vec<Option<Block<K>>> = self.blocks.into_iter().map(Some).collect();

        let mut workers = Vec::new();
        let mut upstream: Option<Receiver<SampleBlock>> = None;
        let mut source_worker = None;
        let mut sink = None;

        for id in chain {
            let Some(block) = blocks[id.0].take() else {
                continue;
            };
            let name = block.name();
            match block {
                Block::Source(source) => {
                    let (tx, rx) = bounded(QUEUE_DEPTH);
                    let stop = stop.clone();
                    source_worker = Some(std::thread::Builder::new()
                        .name(name.to_string())
                        .spawn(move || source_worker_loop(source, tx, block_size, &stop))?);
                    upstream = Some(rx);
                },
                Block::Scaler(scaler) => {
                    let (tx, rx) = bounded(QUEUE_DEPTH);
                    let input = upstream.replace(rx);
                    let stop = stop.clone();
                    workers.push(std::thread::Builder::new()
                        .name(name.to_string())
                        .spawn(move || scaler_worker_loop(scaler, input, tx, &stop))?);
                },
                Block::Sink(k) => {
                    sink = Some(k);
                },
            }
        }

        let (Some(mut sink), Some(input)) = (sink, upstream) else {
            return Err(PipelineError::NoSink.into());
        };

        sink.start()?;
        let mut samples_written: u64 = 0;
        let mut stopped = false;
        let mut write_result = Ok(());
        loop {
            if stop.load(Ordering::Relaxed) {
                stopped = true;
                break;
            }
            let samples = match input.recv_timeout(STOP_POLL_INTERVAL) {
                Ok(samples) => samples,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };
            if let Err(err) = sink.write(&samples) {
                write_result = Err(err);
                break;
            }
            samples_written += samples.len() as u64;
            log::trace!("Wrote {} samples", samples.len());
        }
        drop(input);
        // The sink is finished even after a failed write.
        let finish_result = sink.finish();
        write_result?;
        finish_result?;

        if stopped {
            // The source may be blocked reading its input,
            // so workers are left to finish on their own.
            log::debug!("Stopped, not waiting for worker threads");
            return Ok(RunStats { samples_read: None, samples_written, stopped });
        }

        for worker in workers {
            worker.join().map_err(|_| Error::WorkerPanicked("scaler".to_string()))?;
        }
        let samples_read = match source_worker {
            Some(worker) => worker.join()
                .map_err(|_| Error::WorkerPanicked("source".to_string()))??,
            None => 0,
        };
        Ok(RunStats {
            samples_read: Some(samples_read),
            samples_written,
            stopped: stop.load(Ordering::Relaxed),
        })
    }
}

/// Read blocks from the source until it ends. Returns number of samples read.
fn source_worker_loop(
    mut source: Box<dyn SampleSource + Send>,
    output: Sender<SampleBlock>,
    block_size: usize,
    stop: &AtomicBool,
) -> Result<u64, Error> {
    let mut total: u64 = 0;
    while !stop.load(Ordering::Relaxed) {
        let mut samples = vec![ComplexSample::new(0.0, 0.0); block_size];
        let n = source.read(&mut samples)?;
        if n == 0 {
            log::info!("End of input after {} samples", total);
            break;
        }
        samples.truncate(n);
        total += n as u64;
        if output.send(samples).is_err() {
            // Consumer is gone, nothing to do.
            break;
        }
    }
    Ok(total)
}

fn scaler_worker_loop(
    scaler: Scaler,
    input: Option<Receiver<SampleBlock>>,
    output: Sender<SampleBlock>,
    stop: &AtomicBool,
) {
    let Some(input) = input else {
        return;
    };
    for mut samples in input.iter() {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        scaler.process(&mut samples);
        if output.send(samples).is_err() {
            break;
        }
    }
}
