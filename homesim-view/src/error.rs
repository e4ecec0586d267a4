use homesim_api::IngestError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Invalid device payload: {0}")]
    Ingest(#[from] IngestError),

    #[error("Invalid backend url: {0}")]
    InvalidUrl(String),

    #[error("Missing container element #{0}")]
    MissingContainer(String),

    #[error("Document error: {0}")]
    Document(String),

    #[cfg(not(target_arch = "wasm32"))]
    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn document<S: Into<String>>(message: S) -> Self {
        Error::Document(message.into())
    }
}
