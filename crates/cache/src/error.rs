/// Errors raised while persisting cache state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cache lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, Error>;
