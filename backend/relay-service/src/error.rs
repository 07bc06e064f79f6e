use std::io;

/// Startup failures; frame-level problems are [`crate::relay::EventError`]
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("No available ports found on {host} (tried {tried:?})")]
    NoAvailablePorts { host: String, tried: Vec<u16> },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<RelayError> for io::Error {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::Io(e) => e,
            RelayError::Config(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            other @ RelayError::NoAvailablePorts { .. } => {
                io::Error::new(io::ErrorKind::AddrInUse, other.to_string())
            }
        }
    }
}
