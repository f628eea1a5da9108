//! A network stack backed by the operating system through tokio.

use super::network::resolve;
use super::udp::connect_udp;
use super::{Addr, BoxConnection, Dialer, Listener, Network, PacketConn, StreamListener};
use crate::context::Context;
use crate::errors::NetError;
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tracing::debug;

/// Dials and listens on real sockets: TCP, UDP and, on unix, unix streams.
///
/// Dialing UDP returns a connected [`UdpConnection`](super::UdpConnection).
/// Listening for UDP goes through [`Listener::listen_packet`].
#[derive(Debug, Clone, Default)]
pub struct Stack {
    connect_timeout: Option<Duration>,
    nodelay: bool,
}

impl Stack {
    /// Creates a stack with no connect timeout and Nagle enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits each dial to `timeout`, on top of any context deadline.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets `TCP_NODELAY` on dialed TCP connections.
    #[must_use]
    pub const fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Returns the connect timeout, if any.
    #[must_use]
    pub const fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    async fn connect(&self, network: Network, addr: &str) -> Result<BoxConnection, NetError> {
        match network {
            Network::Tcp | Network::Tcp4 | Network::Tcp6 => {
                let stream = connect_tcp(resolve(network, addr).await?).await?;
                stream.set_nodelay(self.nodelay)?;
                Ok(Box::new(stream))
            }
            Network::Unix => connect_unix(addr).await,
            Network::Udp | Network::Udp4 | Network::Udp6 => {
                let conn = connect_udp(resolve(network, addr).await?).await?;
                Ok(Box::new(conn))
            }
        }
    }
}

/// Tries each address in turn and returns the first connection.
async fn connect_tcp(addrs: Vec<SocketAddr>) -> Result<TcpStream, NetError> {
    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!(%addr, error = %e, "TCP connect attempt failed");
                last_err = Some(e);
            }
        }
    }
    Err(last_err.map_or_else(
        || NetError::invalid_address("", "no addresses to connect to"),
        NetError::Io,
    ))
}

#[cfg(unix)]
async fn connect_unix(path: &str) -> Result<BoxConnection, NetError> {
    let stream = tokio::net::UnixStream::connect(path).await?;
    Ok(Box::new(stream))
}

#[cfg(not(unix))]
async fn connect_unix(_path: &str) -> Result<BoxConnection, NetError> {
    Err(NetError::UnsupportedNetwork(Network::Unix.to_string()))
}

#[async_trait]
impl Dialer for Stack {
    async fn dial(
        &self,
        ctx: &Context,
        network: Network,
        addr: &str,
    ) -> Result<BoxConnection, NetError> {
        debug!(%network, addr, "Dialing");
        let connect = async {
            match self.connect_timeout {
                Some(timeout) => {
                    match tokio::time::timeout(timeout, self.connect(network, addr)).await {
                        Ok(result) => result,
                        Err(_) => Err(NetError::Io(io::Error::new(
                            io::ErrorKind::TimedOut,
                            "connect timed out",
                        ))),
                    }
                }
                None => self.connect(network, addr).await,
            }
        };
        ctx.run(connect).await?
    }
}

#[async_trait]
impl Listener for Stack {
    async fn listen(
        &self,
        ctx: &Context,
        network: Network,
        addr: &str,
    ) -> Result<Box<dyn StreamListener>, NetError> {
        ctx.check()?;
        debug!(%network, addr, "Listening");
        match network {
            Network::Tcp | Network::Tcp4 | Network::Tcp6 => {
                let addrs = resolve(network, addr).await?;
                let listener = TcpListener::bind(addrs.as_slice()).await?;
                Ok(Box::new(listener))
            }
            Network::Unix => bind_unix(addr),
            Network::Udp | Network::Udp4 | Network::Udp6 => {
                Err(NetError::UnsupportedNetwork(network.to_string()))
            }
        }
    }

    async fn listen_packet(
        &self,
        ctx: &Context,
        network: Network,
        addr: &str,
    ) -> Result<Box<dyn PacketConn>, NetError> {
        ctx.check()?;
        debug!(%network, addr, "Listening for packets");
        if !network.is_packet() {
            return Err(NetError::UnsupportedNetwork(network.to_string()));
        }
        let addrs = resolve(network, addr).await?;
        let socket = UdpSocket::bind(addrs.as_slice()).await?;
        Ok(Box::new(socket))
    }
}

#[cfg(unix)]
fn bind_unix(path: &str) -> Result<Box<dyn StreamListener>, NetError> {
    let listener = tokio::net::UnixListener::bind(path)?;
    Ok(Box::new(listener))
}

#[cfg(not(unix))]
fn bind_unix(_path: &str) -> Result<Box<dyn StreamListener>, NetError> {
    Err(NetError::UnsupportedNetwork(Network::Unix.to_string()))
}

#[async_trait]
impl StreamListener for TcpListener {
    async fn accept(&self) -> Result<(BoxConnection, Addr), NetError> {
        let (stream, peer) = TcpListener::accept(self).await?;
        let conn: BoxConnection = Box::new(stream);
        Ok((conn, Addr::Inet(peer)))
    }

    fn local_addr(&self) -> Result<Addr, NetError> {
        Ok(Addr::Inet(TcpListener::local_addr(self)?))
    }
}

#[cfg(unix)]
#[async_trait]
impl StreamListener for tokio::net::UnixListener {
    async fn accept(&self) -> Result<(BoxConnection, Addr), NetError> {
        let (stream, peer) = tokio::net::UnixListener::accept(self).await?;
        let conn: BoxConnection = Box::new(stream);
        Ok((
            conn,
            Addr::Unix(peer.as_pathname().map(std::path::Path::to_path_buf)),
        ))
    }

    fn local_addr(&self) -> Result<Addr, NetError> {
        let addr = tokio::net::UnixListener::local_addr(self)?;
        Ok(Addr::Unix(addr.as_pathname().map(std::path::Path::to_path_buf)))
    }
}

#[async_trait]
impl PacketConn for UdpSocket {
    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize, NetError> {
        Ok(UdpSocket::send_to(self, buf, target).await?)
    }

    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), NetError> {
        Ok(UdpSocket::recv_from(self, buf).await?)
    }

    fn local_addr(&self) -> Result<SocketAddr, NetError> {
        Ok(UdpSocket::local_addr(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ContextError;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_tcp_dial_and_accept() {
        let ctx = Context::background();
        let stack = Stack::new().with_nodelay(true);

        let listener = stack.listen(&ctx, Network::Tcp4, "127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().as_inet().unwrap();

        let server = tokio::spawn(async move {
            let (mut conn, peer) = listener.accept().await.unwrap();
            assert!(matches!(peer, Addr::Inet(_)));
            let mut buf = [0u8; 5];
            conn.read_exact(&mut buf).await.unwrap();
            conn.write_all(&buf).await.unwrap();
        });

        let mut conn = stack
            .dial(&ctx, Network::Tcp, &addr.to_string())
            .await
            .unwrap();
        conn.write_all(b"hello").await.unwrap();
        let mut echoed = [0u8; 5];
        conn.read_exact(&mut echoed).await.unwrap();
        assert_eq!(&echoed, b"hello");

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_udp_round_trip() {
        let ctx = Context::background();
        let stack = Stack::new();

        let a = stack.listen_packet(&ctx, Network::Udp4, "127.0.0.1:0").await.unwrap();
        let b = stack.listen_packet(&ctx, Network::Udp, "127.0.0.1:0").await.unwrap();

        a.send_to(b"ping", b.local_addr().unwrap()).await.unwrap();
        let mut buf = [0u8; 16];
        let (n, from) = b.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ping");
        assert_eq!(from, a.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_dial_udp_round_trip() {
        let ctx = Context::background();
        let stack = Stack::new();

        let server = stack.listen_packet(&ctx, Network::Udp4, "127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();

        let mut conn = stack.dial(&ctx, Network::Udp4, &addr.to_string()).await.unwrap();
        conn.write_all(b"ping").await.unwrap();

        let mut buf = [0u8; 16];
        let (n, from) = server.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ping");
        server.send_to(b"pong", from).await.unwrap();

        let n = conn.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"pong");
    }

    #[tokio::test]
    async fn test_listen_wrong_kind() {
        let ctx = Context::background();
        let stack = Stack::new();
        assert!(matches!(
            stack.listen(&ctx, Network::Udp, "127.0.0.1:0").await,
            Err(NetError::UnsupportedNetwork(_))
        ));
        assert!(matches!(
            stack.listen_packet(&ctx, Network::Tcp, "127.0.0.1:0").await,
            Err(NetError::UnsupportedNetwork(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_context_fails_fast() {
        let (ctx, handle) = Context::background().with_cancel();
        handle.cancel("shutting down");

        let stack = Stack::new();
        let err = stack.dial(&ctx, Network::Tcp, "127.0.0.1:9").await.unwrap_err();
        assert!(matches!(err, NetError::Context(_)));

        let err = stack.listen(&ctx, Network::Tcp, "127.0.0.1:0").await.err().unwrap();
        assert!(matches!(err, NetError::Context(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_io() {
        let ctx = Context::background();
        let stack = Stack::new();
        let listener = stack.listen(&ctx, Network::Tcp4, "127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = stack.dial(&ctx, Network::Tcp4, &addr).await.unwrap_err();
        assert!(matches!(err, NetError::Io(_)));
    }

    /// Returns a listener whose accept backlog is full, so further connects
    /// hang, along with the streams keeping it full.
    async fn saturated_listener() -> (tokio::net::TcpListener, Vec<TcpStream>) {
        let socket = tokio::net::TcpSocket::new_v4().unwrap();
        socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let listener = socket.listen(1).unwrap();
        let addr = listener.local_addr().unwrap();

        let mut held = Vec::new();
        for _ in 0..8 {
            match tokio::time::timeout(Duration::from_millis(100), TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => held.push(stream),
                _ => break,
            }
        }
        (listener, held)
    }

    #[tokio::test]
    async fn test_connect_timeout() {
        let (listener, _held) = saturated_listener().await;
        let addr = listener.local_addr().unwrap().to_string();

        let stack = Stack::new().with_connect_timeout(Duration::from_millis(200));
        assert_eq!(stack.connect_timeout(), Some(Duration::from_millis(200)));

        let err = stack
            .dial(&Context::background(), Network::Tcp4, &addr)
            .await
            .unwrap_err();
        assert!(
            matches!(&err, NetError::Io(e) if e.kind() == io::ErrorKind::TimedOut),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn test_cancel_during_connect() {
        let (listener, _held) = saturated_listener().await;
        let addr = listener.local_addr().unwrap().to_string();

        let (ctx, handle) = Context::background().with_cancel();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.cancel("shutting down");
        });

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            Stack::new().dial(&ctx, Network::Tcp4, &addr),
        )
        .await
        .expect("dial should end on cancel")
        .unwrap_err();
        assert!(
            matches!(&err, NetError::Context(ContextError::Cancelled(reason)) if reason == "shutting down"),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn test_expired_deadline_fails_fast() {
        let ctx = Context::background().with_timeout(Duration::ZERO);
        let stack = Stack::new();

        let err = stack.dial(&ctx, Network::Tcp, "127.0.0.1:9").await.unwrap_err();
        assert!(matches!(
            err,
            NetError::Context(ContextError::DeadlineExceeded)
        ));

        let err = stack.listen(&ctx, Network::Tcp, "127.0.0.1:0").await.err().unwrap();
        assert!(matches!(
            err,
            NetError::Context(ContextError::DeadlineExceeded)
        ));

        let err = stack
            .listen_packet(&ctx, Network::Udp, "127.0.0.1:0")
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            NetError::Context(ContextError::DeadlineExceeded)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unix_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stdctx.sock");
        let path = path.to_str().unwrap();

        let ctx = Context::background();
        let stack = Stack::new();
        let listener = stack.listen(&ctx, Network::Unix, path).await.unwrap();
        assert_eq!(listener.local_addr().unwrap().to_string(), path);

        let server = tokio::spawn(async move {
            let (mut conn, _) = listener.accept().await.unwrap();
            conn.write_all(b"hi").await.unwrap();
        });

        let mut conn = stack.dial(&ctx, Network::Unix, path).await.unwrap();
        let mut buf = [0u8; 2];
        conn.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hi");
        server.await.unwrap();
    }
}
