//! Network names and address resolution.

use crate::errors::NetError;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// A network family, named the way dial strings name them (`"tcp4"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    /// TCP over IPv4 or IPv6.
    Tcp,
    /// TCP over IPv4 only.
    Tcp4,
    /// TCP over IPv6 only.
    Tcp6,
    /// UDP over IPv4 or IPv6.
    Udp,
    /// UDP over IPv4 only.
    Udp4,
    /// UDP over IPv6 only.
    Udp6,
    /// Unix domain stream sockets.
    Unix,
}

impl Network {
    /// Returns the dial-string name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Tcp4 => "tcp4",
            Self::Tcp6 => "tcp6",
            Self::Udp => "udp",
            Self::Udp4 => "udp4",
            Self::Udp6 => "udp6",
            Self::Unix => "unix",
        }
    }

    /// Returns true for connection-oriented networks.
    #[must_use]
    pub const fn is_stream(self) -> bool {
        matches!(self, Self::Tcp | Self::Tcp4 | Self::Tcp6 | Self::Unix)
    }

    /// Returns true for datagram networks.
    #[must_use]
    pub const fn is_packet(self) -> bool {
        !self.is_stream()
    }

    /// Returns true if `addr` belongs to this network's IP family.
    #[must_use]
    pub const fn accepts(self, addr: &SocketAddr) -> bool {
        match self {
            Self::Tcp4 | Self::Udp4 => addr.is_ipv4(),
            Self::Tcp6 | Self::Udp6 => addr.is_ipv6(),
            Self::Tcp | Self::Udp => true,
            Self::Unix => false,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Self::Tcp),
            "tcp4" => Ok(Self::Tcp4),
            "tcp6" => Ok(Self::Tcp6),
            "udp" => Ok(Self::Udp),
            "udp4" => Ok(Self::Udp4),
            "udp6" => Ok(Self::Udp6),
            "unix" => Ok(Self::Unix),
            other => Err(NetError::UnsupportedNetwork(other.to_string())),
        }
    }
}

/// A local or remote socket address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addr {
    /// An IP socket address.
    Inet(SocketAddr),
    /// A unix socket path; `None` for unnamed sockets.
    Unix(Option<PathBuf>),
}

impl Addr {
    /// Returns the IP socket address, if this is one.
    #[must_use]
    pub const fn as_inet(&self) -> Option<SocketAddr> {
        match self {
            Self::Inet(addr) => Some(*addr),
            Self::Unix(_) => None,
        }
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inet(addr) => write!(f, "{addr}"),
            Self::Unix(Some(path)) => write!(f, "{}", path.display()),
            Self::Unix(None) => f.write_str("@"),
        }
    }
}

impl From<SocketAddr> for Addr {
    fn from(addr: SocketAddr) -> Self {
        Self::Inet(addr)
    }
}

/// Resolves `addr` ("host:port") to the socket addresses valid for `network`.
pub(crate) async fn resolve(network: Network, addr: &str) -> Result<Vec<SocketAddr>, NetError> {
    if network == Network::Unix {
        return Err(NetError::UnsupportedNetwork(network.to_string()));
    }
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host(addr)
        .await
        .map_err(|e| NetError::invalid_address(addr, e.to_string()))?
        .filter(|a| network.accepts(a))
        .collect();
    if addrs.is_empty() {
        return Err(NetError::invalid_address(
            addr,
            format!("no {network} address found"),
        ));
    }
    Ok(addrs)
}
