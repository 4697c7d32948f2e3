/// Failure of a marketplace read. `Display` is shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("could not reach the marketplace: {0}")]
    Network(String),

    #[error("marketplace returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("marketplace returned malformed data: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
