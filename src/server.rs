//! Single-shot TCP listener.
//!
//! Binds the configured endpoint with an explicit backlog, accepts exactly
//! one connection, and hands the stream to the session handler. Further
//! connection attempts queue at the transport layer (up to the backlog) but
//! are never dequeued, since accept is called only once.

use crate::config::Config;
use crate::session;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info};

/// Errors fatal to the server before a session starts
#[derive(Debug)]
pub enum ServerError {
    /// Host resolution or bind failure at startup.
    Bind(std::io::Error),
    /// Transport failure while waiting for a connection.
    Accept(std::io::Error),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Bind(e) => write!(f, "Failed to bind listener: {e}"),
            ServerError::Accept(e) => write!(f, "Failed to accept connection: {e}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Bind(e) | ServerError::Accept(e) => Some(e),
        }
    }
}

/// Listening socket bound to the configured endpoint
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Resolve the configured host and bind a listening socket with the
    /// configured backlog.
    pub async fn bind(config: &Config) -> Result<Self, ServerError> {
        let addr = resolve(&config.host, config.port).await?;

        let socket = Socket::new(
            match addr {
                SocketAddr::V4(_) => Domain::IPV4,
                SocketAddr::V6(_) => Domain::IPV6,
            },
            Type::STREAM,
            Some(Protocol::TCP),
        )
        .map_err(ServerError::Bind)?;

        socket.set_reuse_address(true).map_err(ServerError::Bind)?;
        socket.set_nonblocking(true).map_err(ServerError::Bind)?;
        socket.bind(&addr.into()).map_err(ServerError::Bind)?;
        socket
            .listen(config.backlog as i32)
            .map_err(ServerError::Bind)?;

        let inner = TcpListener::from_std(socket.into()).map_err(ServerError::Bind)?;
        let local_addr = inner.local_addr().map_err(ServerError::Bind)?;

        Ok(Listener { inner, local_addr })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the next connection attempt, without a timeout.
    ///
    /// Consumes the listener: this server serves exactly one connection, and
    /// the listening socket is released once the stream is handed off.
    pub async fn accept_one(self) -> Result<(TcpStream, SocketAddr), ServerError> {
        self.inner.accept().await.map_err(ServerError::Accept)
    }
}

/// Resolve the configured host to a concrete address.
async fn resolve(host: &str, port: u16) -> Result<SocketAddr, ServerError> {
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(ServerError::Bind)?;
    addrs.next().ok_or_else(|| {
        ServerError::Bind(std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            format!("no addresses resolved for host '{host}'"),
        ))
    })
}

/// Run one full accept/read/echo/close cycle.
///
/// Session failures are logged and swallowed: the process still completes
/// its single cycle and exits cleanly. Only startup failures propagate.
pub async fn run(config: Config) -> Result<(), ServerError> {
    let listener = Listener::bind(&config).await?;
    info!(address = %listener.local_addr(), "Waiting for a connection");

    let (stream, peer) = listener.accept_one().await?;
    info!(peer = %peer, "Client connected");

    match session::serve(stream).await {
        Ok(message) => {
            info!(
                bytes = message.len(),
                text = %String::from_utf8_lossy(&message),
                "Text received"
            );
        }
        Err(e) => {
            error!(error = %e, "Session failed");
        }
    }

    Ok(())
}
