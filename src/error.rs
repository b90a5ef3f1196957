use crate::flowgraph::PipelineError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("SoapySDR: {0}")]
    Soapy(#[from] soapysdr::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid pipeline: {0}")]
    Pipeline(#[from] PipelineError),

    /// A worker thread panicked instead of returning.
    #[error("{0} thread panicked")]
    WorkerPanicked(String),

    /// Samples were written to a sink before it was started.
    #[error("sink is not started")]
    SinkNotStarted,
}
