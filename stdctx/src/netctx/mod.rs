//! Context-scoped dialing and listening.
//!
//! Code that opens sockets asks the context for a [`Dialer`] or [`Listener`]
//! instead of calling the OS directly, so a caller can swap the network stack
//! (a proxy, an in-memory transport, a sandbox) without touching the callee.
//! Unlike logging and metrics there is no null fallback: dialing without a
//! dialer is an error.

mod network;
mod stack;
mod traits;
mod udp;

pub use network::{Addr, Network};
pub use stack::Stack;
pub use traits::{BoxConnection, Connection, Dialer, Listener, PacketConn, StreamListener};
pub use udp::UdpConnection;

#[cfg(test)]
pub(crate) use traits::MockDialer;

use crate::context::{Context, ContextKey};
use crate::errors::NetError;
use std::sync::Arc;

struct DialerKey;

impl ContextKey for DialerKey {
    type Value = Arc<dyn Dialer>;
}

struct ListenerKey;

impl ContextKey for ListenerKey {
    type Value = Arc<dyn Listener>;
}

/// Returns a context carrying `dialer`.
#[must_use]
pub fn with_dialer(ctx: &Context, dialer: Arc<dyn Dialer>) -> Context {
    ctx.with_value::<DialerKey>(dialer)
}

/// Returns a context without a dialer.
#[must_use]
pub fn without_dialer(ctx: &Context) -> Context {
    ctx.without::<DialerKey>()
}

/// Returns the context's dialer, if any.
#[must_use]
pub fn get_dialer(ctx: &Context) -> Option<Arc<dyn Dialer>> {
    ctx.value::<DialerKey>().cloned()
}

/// Returns a context carrying `listener`.
#[must_use]
pub fn with_listener(ctx: &Context, listener: Arc<dyn Listener>) -> Context {
    ctx.with_value::<ListenerKey>(listener)
}

/// Returns a context without a listener.
#[must_use]
pub fn without_listener(ctx: &Context) -> Context {
    ctx.without::<ListenerKey>()
}

/// Returns the context's listener, if any.
#[must_use]
pub fn get_listener(ctx: &Context) -> Option<Arc<dyn Listener>> {
    ctx.value::<ListenerKey>().cloned()
}

/// Returns a context that dials and listens through `stack`.
#[must_use]
pub fn with_stack(ctx: &Context, stack: Stack) -> Context {
    let stack = Arc::new(stack);
    with_listener(&with_dialer(ctx, stack.clone()), stack)
}

/// Connects to `addr` with the context's dialer.
///
/// # Errors
///
/// Returns [`NetError::NoDialer`] if the context has no dialer, otherwise
/// whatever the dialer returns.
pub async fn dial(ctx: &Context, network: Network, addr: &str) -> Result<BoxConnection, NetError> {
    let dialer = get_dialer(ctx).ok_or(NetError::NoDialer)?;
    dialer.dial(ctx, network, addr).await
}

/// Binds a stream listener with the context's listener.
///
/// # Errors
///
/// Returns [`NetError::NoListener`] if the context has no listener.
pub async fn listen(
    ctx: &Context,
    network: Network,
    addr: &str,
) -> Result<Box<dyn StreamListener>, NetError> {
    let listener = get_listener(ctx).ok_or(NetError::NoListener)?;
    listener.listen(ctx, network, addr).await
}

/// Binds a datagram socket with the context's listener.
///
/// # Errors
///
/// Returns [`NetError::NoListener`] if the context has no listener.
pub async fn listen_packet(
    ctx: &Context,
    network: Network,
    addr: &str,
) -> Result<Box<dyn PacketConn>, NetError> {
    let listener = get_listener(ctx).ok_or(NetError::NoListener)?;
    listener.listen_packet(ctx, network, addr).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_dial_without_dialer() {
        let ctx = Context::background();
        assert!(get_dialer(&ctx).is_none());
        let err = dial(&ctx, Network::Tcp, "127.0.0.1:1").await.unwrap_err();
        assert!(matches!(err, NetError::NoDialer));
    }

    #[tokio::test]
    async fn test_listen_without_listener() {
        let ctx = Context::background();
        assert!(get_listener(&ctx).is_none());
        assert!(matches!(
            listen(&ctx, Network::Tcp, "127.0.0.1:0").await,
            Err(NetError::NoListener)
        ));
        assert!(matches!(
            listen_packet(&ctx, Network::Udp, "127.0.0.1:0").await,
            Err(NetError::NoListener)
        ));
    }

    #[tokio::test]
    async fn test_dial_delegates_to_context_dialer() {
        let mut mock = MockDialer::new();
        mock.expect_dial()
            .withf(|_ctx, network, addr| *network == Network::Tcp && addr == "example.test:80")
            .times(1)
            .returning(|_, _, _| Err(NetError::UnsupportedNetwork("mock".to_string())));

        let ctx = with_dialer(&Context::background(), Arc::new(mock));
        let err = dial(&ctx, Network::Tcp, "example.test:80").await.unwrap_err();
        assert!(matches!(err, NetError::UnsupportedNetwork(n) if n == "mock"));
    }

    #[tokio::test]
    async fn test_without_dialer_only_clears_dialer() {
        let ctx = with_stack(&Context::background(), Stack::new());
        let ctx = without_dialer(&ctx);
        assert!(get_dialer(&ctx).is_none());
        assert!(get_listener(&ctx).is_some());
    }

    #[tokio::test]
    async fn test_without_listener_only_clears_listener() {
        let ctx = with_stack(&Context::background(), Stack::new());
        let ctx = without_listener(&ctx);
        assert!(get_listener(&ctx).is_none());
        assert!(get_dialer(&ctx).is_some());
    }

    #[tokio::test]
    async fn test_stack_round_trip_through_context() {
        let ctx = with_stack(&Context::background(), Stack::new());

        let listener = listen(&ctx, Network::Tcp4, "127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let server = tokio::spawn(async move {
            let (mut conn, _) = listener.accept().await.unwrap();
            conn.write_all(b"ok").await.unwrap();
        });

        let mut conn = dial(&ctx, Network::Tcp4, &addr).await.unwrap();
        let mut buf = [0u8; 2];
        conn.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ok");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_mock_dialer_sees_context_values() {
        struct Tenant;
        impl ContextKey for Tenant {
            type Value = &'static str;
        }

        let mut mock = MockDialer::new();
        mock.expect_dial()
            .with(
                mockall::predicate::function(|ctx: &Context| {
                    ctx.value::<Tenant>() == Some(&"acme")
                }),
                eq(Network::Unix),
                eq("/run/app.sock"),
            )
            .times(1)
            .returning(|_, _, _| Err(NetError::NoDialer));

        let ctx = Context::background().with_value::<Tenant>("acme");
        let ctx = with_dialer(&ctx, Arc::new(mock));
        assert!(dial(&ctx, Network::Unix, "/run/app.sock").await.is_err());
    }
}
