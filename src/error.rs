use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to spawn {role}: {source}")]
    Spawn {
        role: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{0} panicked")]
    WorkerPanicked(&'static str),
}

#[derive(Debug, Error)]
pub enum AffinityError {
    #[error("thread affinity is not supported on this platform")]
    Unsupported,

    #[error("core {core} is out of range (CPU numbers must be below {max})")]
    InvalidCore { core: usize, max: usize },

    #[error("sched_setaffinity failed: {0}")]
    Os(#[from] io::Error),
}
