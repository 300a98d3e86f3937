use crate::{
    ipc_server::Endpoint,
    protocol::{CommandFrame, WIRE_VERSION},
};
use anyhow::{Context, Result};
use std::io::Write;

/// Send a single well-formed CLEAR frame to a running daemon.
///
/// Fire and forget: the protocol has no acknowledgment, so the connection is
/// shut down right after the write. A refused connection means no daemon is
/// running at the endpoint, which the caller surfaces as a plain failure.
pub fn send_clear(endpoint: &Endpoint) -> Result<()> {
    let frame = CommandFrame::clear().encode(WIRE_VERSION);
    match endpoint {
        Endpoint::Tcp(addr) => {
            let mut stream = std::net::TcpStream::connect(addr)
                .with_context(|| format!("Failed to connect to daemon at {}", addr))?;
            stream.write_all(frame.as_bytes()).context("Failed to write clear frame")?;
            stream.shutdown(std::net::Shutdown::Both).context("Failed to shut down connection")?;
        }
        Endpoint::Unix(path) => {
            let mut stream = std::os::unix::net::UnixStream::connect(path)
                .with_context(|| format!("Failed to connect to daemon at {}", path.display()))?;
            stream.write_all(frame.as_bytes()).context("Failed to write clear frame")?;
            stream.shutdown(std::net::Shutdown::Both).context("Failed to shut down connection")?;
        }
    }
    log::debug!("clear signal sent to {}", endpoint);
    Ok(())
}
