//! The dialing and listening seams.

use super::{Addr, Network};
use crate::context::Context;
use crate::errors::NetError;
use async_trait::async_trait;
use std::fmt;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};

/// A bidirectional byte stream returned by a [`Dialer`] or [`StreamListener`].
pub trait Connection: AsyncRead + AsyncWrite + Send + Unpin + fmt::Debug {}

impl<T> Connection for T where T: AsyncRead + AsyncWrite + Send + Unpin + fmt::Debug {}

/// A boxed [`Connection`].
pub type BoxConnection = Box<dyn Connection>;

/// Accepts incoming stream connections.
#[async_trait]
pub trait StreamListener: Send + Sync {
    /// Waits for the next connection.
    async fn accept(&self) -> Result<(BoxConnection, Addr), NetError>;

    /// Returns the address the listener is bound to.
    fn local_addr(&self) -> Result<Addr, NetError>;
}

/// Sends and receives datagrams.
#[async_trait]
pub trait PacketConn: Send + Sync {
    /// Sends `buf` to `target`, returning the number of bytes sent.
    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize, NetError>;

    /// Receives one datagram into `buf`.
    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), NetError>;

    /// Returns the address the socket is bound to.
    fn local_addr(&self) -> Result<SocketAddr, NetError>;
}

/// Opens outgoing connections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Connects to `addr` on `network`, giving up when `ctx` ends.
    async fn dial(
        &self,
        ctx: &Context,
        network: Network,
        addr: &str,
    ) -> Result<BoxConnection, NetError>;
}

/// Opens listening sockets.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Binds a stream listener.
    async fn listen(
        &self,
        ctx: &Context,
        network: Network,
        addr: &str,
    ) -> Result<Box<dyn StreamListener>, NetError>;

    /// Binds a datagram socket.
    async fn listen_packet(
        &self,
        ctx: &Context,
        network: Network,
        addr: &str,
    ) -> Result<Box<dyn PacketConn>, NetError>;
}
