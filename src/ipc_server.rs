use crate::{
    app::DaemonCommand,
    protocol::{CommandFrame, FrameError, WIRE_VERSION},
};
use anyhow::{Context, Result};
use std::{
    fmt,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    path::PathBuf,
    time::Duration,
};
use tokio::{io::AsyncReadExt, sync::mpsc::UnboundedSender};

/// Fixed loopback port the irssi plugin sends notifications to.
pub const DEFAULT_PORT: u16 = 21693;

/// Socket path used by older plugin revisions (`--socket-file` default).
pub const DEFAULT_SOCKET_FILE: &str = "/tmp/irssi-icon.socket";

/// Where the daemon listens and the clear sender connects.
/// Both sides must agree on this, or the sender's connect fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp(SocketAddr),
    Unix(PathBuf),
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint::Tcp(SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, DEFAULT_PORT)))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp(addr) => write!(f, "{}", addr),
            Endpoint::Unix(path) => write!(f, "{}", path.display()),
        }
    }
}

// One frame per connection, read in one shot. No reassembly across reads.
const READ_BUFFER_SIZE: usize = 4096;

// Bounds a peer that connects but never sends.
const READ_DEADLINE: Duration = Duration::from_secs(5);

enum Listener {
    Tcp(tokio::net::TcpListener),
    Unix(tokio::net::UnixListener),
}

enum Stream {
    Tcp(tokio::net::TcpStream),
    Unix(tokio::net::UnixStream),
}

impl Stream {
    async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Stream::Tcp(stream) => stream.read(buf).await,
            Stream::Unix(stream) => stream.read(buf).await,
        }
    }
}

/// Server side of the notification channel: accepts connections from the
/// irssi plugin and forwards parsed commands to the daemon's main loop.
pub struct IpcServer {
    listener: Listener,
}

impl IpcServer {
    /// Bind the command endpoint, tolerating leftovers of an unclean shutdown:
    /// SO_REUSEADDR on the TCP side, a single unlink-and-retry for a stale
    /// socket file on the unix side.
    pub async fn bind(endpoint: &Endpoint) -> Result<Self> {
        let listener = match endpoint {
            Endpoint::Tcp(addr) => {
                let socket = match addr {
                    SocketAddr::V4(_) => tokio::net::TcpSocket::new_v4()?,
                    SocketAddr::V6(_) => tokio::net::TcpSocket::new_v6()?,
                };
                socket.set_reuseaddr(true).context("Failed to set SO_REUSEADDR on the command socket")?;
                socket.bind(*addr).with_context(|| format!("Failed to bind command socket on {}", addr))?;
                Listener::Tcp(socket.listen(16)?)
            }
            Endpoint::Unix(path) => match tokio::net::UnixListener::bind(path) {
                Ok(listener) => Listener::Unix(listener),
                Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                    log::warn!("Removing stale socket file {}", path.display());
                    std::fs::remove_file(path)
                        .with_context(|| format!("Failed to remove stale socket file {}", path.display()))?;
                    let listener = tokio::net::UnixListener::bind(path)
                        .with_context(|| format!("Failed to bind command socket on {}", path.display()))?;
                    Listener::Unix(listener)
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("Failed to bind command socket on {}", path.display()))
                }
            },
        };
        Ok(IpcServer { listener })
    }

    /// The endpoint actually bound. Differs from the requested one when
    /// binding TCP port 0.
    pub fn local_endpoint(&self) -> Result<Endpoint> {
        match &self.listener {
            Listener::Tcp(listener) => Ok(Endpoint::Tcp(listener.local_addr()?)),
            Listener::Unix(listener) => {
                let addr = listener.local_addr()?;
                let path = addr.as_pathname().context("command socket has no path")?;
                Ok(Endpoint::Unix(path.to_path_buf()))
            }
        }
    }

    async fn accept(&self) -> std::io::Result<Stream> {
        match &self.listener {
            Listener::Tcp(listener) => listener.accept().await.map(|(stream, _addr)| Stream::Tcp(stream)),
            Listener::Unix(listener) => listener.accept().await.map(|(stream, _addr)| Stream::Unix(stream)),
        }
    }

    /// Accept loop. Every connection gets one read-parse-dispatch cycle and is
    /// then closed; a bad frame on one connection never affects the next.
    pub async fn run(self, evt_send: UnboundedSender<DaemonCommand>) -> Result<()> {
        log::info!("notification channel initialized");
        crate::loop_select_exiting! {
            connection = self.accept() => match connection {
                Ok(stream) => {
                    if let Err(err) = handle_connection(stream, &evt_send).await {
                        log::debug!("dropping connection: {:#}", err);
                    }
                }
                Err(err) => log::warn!("Failed to accept connection: {:?}", err),
            }
        }
        Ok(())
    }
}

/// Handle a single plugin connection: one read of up to [`READ_BUFFER_SIZE`]
/// bytes, one parse, at most one command dispatched. The protocol has no
/// error-response path, so nothing is ever written back to the peer.
async fn handle_connection(mut stream: Stream, evt_send: &UnboundedSender<DaemonCommand>) -> Result<()> {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let read = tokio::time::timeout(READ_DEADLINE, stream.read(&mut buf))
        .await
        .context("peer sent no frame before the read deadline")?
        .context("Failed to read frame from peer")?;
    let raw = std::str::from_utf8(&buf[..read]).context("frame is not valid utf-8")?;

    match CommandFrame::parse(raw, WIRE_VERSION) {
        Ok(frame) => {
            log::debug!("received command: {:?}", frame);
            evt_send.send(frame.into()).context("daemon command channel closed")?;
        }
        Err(err @ FrameError::VersionMismatch { .. }) => log::warn!("rejecting frame: {}", err),
        Err(err) => log::debug!("ignoring frame: {}", err),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tokio::sync::mpsc::{error::TryRecvError, unbounded_channel, UnboundedReceiver};

    async fn start_server() -> (Endpoint, UnboundedReceiver<DaemonCommand>, tokio::task::JoinHandle<Result<()>>) {
        let server = IpcServer::bind(&Endpoint::Tcp("127.0.0.1:0".parse().unwrap())).await.unwrap();
        let endpoint = server.local_endpoint().unwrap();
        let (evt_send, evt_recv) = unbounded_channel();
        let handle = tokio::spawn(server.run(evt_send));
        (endpoint, evt_recv, handle)
    }

    fn send_raw(endpoint: &Endpoint, raw: &str) {
        let Endpoint::Tcp(addr) = endpoint else { panic!("test server is TCP") };
        let mut stream = std::net::TcpStream::connect(addr).unwrap();
        stream.write_all(raw.as_bytes()).unwrap();
    }

    async fn recv_command(evt_recv: &mut UnboundedReceiver<DaemonCommand>) -> DaemonCommand {
        tokio::time::timeout(Duration::from_secs(1), evt_recv.recv()).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn dispatches_one_command_per_connection() {
        let (endpoint, mut evt_recv, handle) = start_server().await;

        let remote = endpoint.clone();
        tokio::task::spawn_blocking(move || {
            send_raw(&remote, "1.4:NEWMSG> #general\r\nNew message in #general");
        });
        assert_eq!(recv_command(&mut evt_recv).await, DaemonCommand::NewMessage { info: "#general".to_owned() });

        let remote = endpoint.clone();
        tokio::task::spawn_blocking(move || {
            send_raw(&remote, "1.4:NEWWHISPER> alice\r\nhello there");
        });
        assert_eq!(
            recv_command(&mut evt_recv).await,
            DaemonCommand::NewWhisper { info: "alice".to_owned(), data: Some("hello there".to_owned()) }
        );

        handle.abort();
    }

    #[tokio::test]
    async fn version_mismatch_produces_no_command() {
        let (endpoint, mut evt_recv, handle) = start_server().await;

        let remote = endpoint.clone();
        tokio::task::spawn_blocking(move || send_raw(&remote, "1.3:CLEAR> ")).await.unwrap();

        // a well-formed frame afterwards still goes through
        let remote = endpoint.clone();
        tokio::task::spawn_blocking(move || send_raw(&remote, "1.4:CLEAR> ")).await.unwrap();

        assert_eq!(recv_command(&mut evt_recv).await, DaemonCommand::Clear);
        assert_eq!(evt_recv.try_recv(), Err(TryRecvError::Empty));

        handle.abort();
    }

    #[tokio::test]
    async fn malformed_frames_are_dropped_silently() {
        let (endpoint, mut evt_recv, handle) = start_server().await;

        for garbage in ["CLEAR", "no delimiters here", "1.4:BOGUS> x"] {
            let remote = endpoint.clone();
            let raw = garbage.to_owned();
            tokio::task::spawn_blocking(move || send_raw(&remote, &raw)).await.unwrap();
        }

        let remote = endpoint.clone();
        tokio::task::spawn_blocking(move || send_raw(&remote, "1.4:NEWMSG> #rust")).await.unwrap();

        assert_eq!(recv_command(&mut evt_recv).await, DaemonCommand::NewMessage { info: "#rust".to_owned() });
        assert_eq!(evt_recv.try_recv(), Err(TryRecvError::Empty));

        handle.abort();
    }

    #[tokio::test]
    async fn clear_signal_round_trip() {
        let (endpoint, mut evt_recv, handle) = start_server().await;

        let remote = endpoint.clone();
        tokio::task::spawn_blocking(move || client::send_clear(&remote)).await.unwrap().unwrap();

        assert_eq!(recv_command(&mut evt_recv).await, DaemonCommand::Clear);
        assert_eq!(evt_recv.try_recv(), Err(TryRecvError::Empty));

        handle.abort();
    }

    #[tokio::test]
    async fn unix_endpoint_round_trip_and_stale_socket_cleanup() {
        let dir = std::env::temp_dir().join(format!("irssi-icon-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("command.socket");
        // simulate a leftover socket file from an unclean shutdown
        std::fs::write(&path, b"").unwrap();

        let server = IpcServer::bind(&Endpoint::Unix(path.clone())).await.unwrap();
        let endpoint = server.local_endpoint().unwrap();
        let (evt_send, mut evt_recv) = unbounded_channel();
        let handle = tokio::spawn(server.run(evt_send));

        let remote = endpoint.clone();
        tokio::task::spawn_blocking(move || client::send_clear(&remote)).await.unwrap().unwrap();
        assert_eq!(recv_command(&mut evt_recv).await, DaemonCommand::Clear);

        handle.abort();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn sender_fails_cleanly_when_no_daemon_is_listening() {
        // port reserved and closed again, so nothing is listening there
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = client::send_clear(&Endpoint::Tcp(addr));
        assert!(result.is_err());
    }
}
