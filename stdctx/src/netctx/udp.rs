//! Dialed UDP sockets exposed as a [`Connection`](super::Connection).

use crate::errors::NetError;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::UdpSocket;
use tracing::debug;

/// A UDP socket connected to a single peer.
///
/// Each write sends one datagram and each read receives one. A read buffer
/// smaller than the incoming datagram truncates it.
#[derive(Debug)]
pub struct UdpConnection {
    socket: UdpSocket,
}

impl UdpConnection {
    /// Returns the local address of the socket.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Returns the address of the connected peer.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.socket.peer_addr()
    }
}

impl AsyncRead for UdpConnection {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.socket.poll_recv(cx, buf)
    }
}

impl AsyncWrite for UdpConnection {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.socket.poll_send(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Binds an ephemeral socket of the matching family and connects it to the
/// first address that accepts.
pub(crate) async fn connect_udp(addrs: Vec<SocketAddr>) -> Result<UdpConnection, NetError> {
    let mut last_err = None;
    for addr in addrs {
        let local: SocketAddr = if addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let attempt = async {
            let socket = UdpSocket::bind(local).await?;
            socket.connect(addr).await?;
            Ok::<_, io::Error>(socket)
        };
        match attempt.await {
            Ok(socket) => return Ok(UdpConnection { socket }),
            Err(e) => {
                debug!(%addr, error = %e, "UDP connect attempt failed");
                last_err = Some(e);
            }
        }
    }
    Err(last_err.map_or_else(
        || NetError::invalid_address("", "no addresses to connect to"),
        NetError::Io,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_connected_socket_reads_and_writes_datagrams() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let peer_addr = peer.local_addr().unwrap();

        let mut conn = connect_udp(vec![peer_addr]).await.unwrap();
        assert_eq!(conn.peer_addr().unwrap(), peer_addr);

        conn.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 16];
        let (n, from) = peer.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ping");
        assert_eq!(from.port(), conn.local_addr().unwrap().port());

        peer.send_to(b"pong", from).await.unwrap();
        let n = conn.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"pong");
    }

    #[tokio::test]
    async fn test_no_addresses() {
        assert!(matches!(
            connect_udp(Vec::new()).await,
            Err(NetError::InvalidAddress { .. })
        ));
    }
}
