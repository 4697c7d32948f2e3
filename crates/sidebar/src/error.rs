/// Errors surfaced by the sidebar handle.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("sidebar coordinator has stopped")]
    Stopped,

    #[error("invalid intent: {0}")]
    InvalidIntent(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
