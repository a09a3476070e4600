//! Control-channel (reliable stream) and data-channel (unreliable datagram)
//! socket adapters.
//!
//! All control-channel reads and writes are **exact-length** operations:
//! implementations loop internally until the requested byte count is
//! satisfied or the connection fails, per the protocol's socket-adapter
//! contract. `std::io::Read`/`Write`'s own `read_exact`/`write_all` already
//! provide this for `TcpStream`, so [`StdControlChannel`] is a thin wrapper.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use rbudp_core::RbudpError;

/// A reliable, ordered, bidirectional byte stream carrying the handshake,
/// per-round flags, and the feedback bitmap.
pub trait ControlChannel {
    /// Reads exactly `buf.len()` bytes, looping internally as needed.
    fn recv_exact(&mut self, buf: &mut [u8], stage: &'static str) -> Result<(), RbudpError>;

    /// Writes exactly `buf.len()` bytes, looping internally as needed.
    fn send_all(&mut self, buf: &[u8], stage: &'static str) -> Result<(), RbudpError>;

    /// Installs an inactivity timeout on reads. `None` disables the timeout.
    ///
    /// The protocol has no built-in timeout (a stalled control channel
    /// stalls the session indefinitely); this is the bounded inactivity
    /// timer the design notes allow implementations to add.
    fn set_read_timeout(&mut self, timeout: Option<Duration>, stage: &'static str) -> Result<(), RbudpError>;
}

/// A [`ControlChannel`] backed by `std::net::TcpStream`.
pub struct StdControlChannel {
    stream: TcpStream,
}

impl StdControlChannel {
    /// Wraps an already-connected or already-accepted stream.
    #[must_use]
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    /// Connects to `(host, port)`, blocking until the connection succeeds or fails.
    ///
    /// # Errors
    ///
    /// Returns [`RbudpError::Connect`] if resolution or connection fails.
    pub fn connect(host: &str, port: u16) -> Result<Self, RbudpError> {
        let stream = TcpStream::connect((host, port)).map_err(|source| RbudpError::Connect {
            stage: "connect",
            source,
        })?;
        Ok(Self::new(stream))
    }

    /// Binds a listener on `(bind_host, port)` and blocks for exactly one
    /// inbound connection.
    ///
    /// # Errors
    ///
    /// Returns [`RbudpError::Connect`] if binding or accepting fails.
    pub fn accept_one(bind_host: &str, port: u16) -> Result<Self, RbudpError> {
        let listener = TcpListener::bind((bind_host, port)).map_err(|source| RbudpError::Connect {
            stage: "listen",
            source,
        })?;
        let (stream, _peer) = listener.accept().map_err(|source| RbudpError::Connect {
            stage: "accept",
            source,
        })?;
        Ok(Self::new(stream))
    }
}

impl ControlChannel for StdControlChannel {
    fn recv_exact(&mut self, buf: &mut [u8], stage: &'static str) -> Result<(), RbudpError> {
        io::Read::read_exact(&mut self.stream, buf).map_err(|source| RbudpError::ControlIo { stage, source })
    }

    fn send_all(&mut self, buf: &[u8], stage: &'static str) -> Result<(), RbudpError> {
        io::Write::write_all(&mut self.stream, buf).map_err(|source| RbudpError::ControlIo { stage, source })
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>, stage: &'static str) -> Result<(), RbudpError> {
        self.stream
            .set_read_timeout(timeout)
            .map_err(|source| RbudpError::ControlIo { stage, source })
    }
}

/// An unreliable, unordered datagram endpoint.
///
/// There is no separate "is a datagram ready?" query: readiness is
/// synthesized from a non-blocking receive, per the design notes — a
/// would-block result from [`DataChannel::try_recv`] *is* "no datagram
/// ready right now".
pub trait DataChannel {
    /// Sends one datagram to `addr`. A send failure is always fatal.
    fn send_to(&self, buf: &[u8], addr: SocketAddr, stage: &'static str) -> Result<(), RbudpError>;

    /// Attempts to receive one datagram without blocking.
    ///
    /// Returns `Ok(None)` if no datagram is immediately available,
    /// `Ok(Some(len))` with the number of bytes written into `buf`
    /// otherwise.
    fn try_recv(&self, buf: &mut [u8], stage: &'static str) -> Result<Option<usize>, RbudpError>;
}

/// A [`DataChannel`] backed by `std::net::UdpSocket`, always configured
/// non-blocking.
pub struct StdDataChannel {
    socket: UdpSocket,
}

impl StdDataChannel {
    /// Binds a UDP socket to `(*, port)` for the receiver side.
    ///
    /// # Errors
    ///
    /// Returns [`RbudpError::Connect`] if the socket cannot be created or bound.
    pub fn bind(port: u16) -> Result<Self, RbudpError> {
        Self::from_socket2(Domain::IPV4, |socket| {
            socket.bind(&SockAddr::from(SocketAddr::from(([0, 0, 0, 0], port))))
        })
    }

    /// Creates an unbound UDP socket for the sender side (the OS assigns an
    /// ephemeral port on first send).
    ///
    /// # Errors
    ///
    /// Returns [`RbudpError::Connect`] if the socket cannot be created.
    pub fn unbound() -> Result<Self, RbudpError> {
        Self::from_socket2(Domain::IPV4, |_socket| Ok(()))
    }

    fn from_socket2(
        domain: Domain,
        configure: impl FnOnce(&Socket) -> io::Result<()>,
    ) -> Result<Self, RbudpError> {
        let to_connect_error = |source: io::Error| RbudpError::Connect {
            stage: "udp socket setup",
            source,
        };

        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP)).map_err(to_connect_error)?;
        socket.set_nonblocking(true).map_err(to_connect_error)?;
        configure(&socket).map_err(to_connect_error)?;

        Ok(Self {
            socket: socket.into(),
        })
    }

    /// Resolves `(host, port)` to a single socket address, for sendto targets.
    ///
    /// # Errors
    ///
    /// Returns [`RbudpError::Connect`] if resolution fails or yields no addresses.
    pub fn resolve(host: &str, port: u16) -> Result<SocketAddr, RbudpError> {
        (host, port)
            .to_socket_addrs()
            .map_err(|source| RbudpError::Connect {
                stage: "resolve data channel address",
                source,
            })?
            .next()
            .ok_or_else(|| RbudpError::Connect {
                stage: "resolve data channel address",
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses resolved"),
            })
    }
}

impl DataChannel for StdDataChannel {
    fn send_to(&self, buf: &[u8], addr: SocketAddr, stage: &'static str) -> Result<(), RbudpError> {
        self.socket
            .send_to(buf, addr)
            .map(|_| ())
            .map_err(|source| RbudpError::DataIo { stage, source })
    }

    fn try_recv(&self, buf: &mut [u8], stage: &'static str) -> Result<Option<usize>, RbudpError> {
        match self.socket.recv_from(buf) {
            Ok((len, _from)) => Ok(Some(len)),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(source) => Err(RbudpError::DataIo { stage, source }),
        }
    }
}
