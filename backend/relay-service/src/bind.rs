//! Listener selection for the relay binary
//!
//! The first candidate port that binds wins.

use crate::error::RelayError;
use std::net::TcpListener;

pub fn bind_first_available(host: &str, ports: &[u16]) -> Result<TcpListener, RelayError> {
    for &port in ports {
        match TcpListener::bind((host, port)) {
            Ok(listener) => {
                tracing::info!(host, port, "Bound relay listener");
                return Ok(listener);
            }
            Err(e) => {
                tracing::warn!(host, port, error = %e, "Port unavailable, trying next");
            }
        }
    }

    Err(RelayError::NoAvailablePorts {
        host: host.to_string(),
        tried: ports.to_vec(),
    })
}
