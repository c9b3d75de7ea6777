use thiserror::Error;

/// Ошибки диспетчеризации и доставки результата
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("worker pool is closed")]
    PoolClosed,
    #[error("work item discarded during pool shutdown")]
    PoolShutdown,
    #[error(transparent)]
    Call(#[from] TransportError),
    #[error("background callback failed: {0}")]
    Hook(String),
    #[error("worker panicked: {0}")]
    Panic(String),
    #[error("result producer dropped before delivery")]
    Dropped,
    #[error("timed out waiting for result")]
    WaitTimeout,
}

/// Ошибка нижележащего блокирующего клиента
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("transport failure: {0}")]
    Other(String),
}
