use ::axum::serve::Listener;
use ::rustls::ServerConfig;
use ::std::io;
use ::std::net::SocketAddr;
use ::std::sync::Arc;
use ::tokio::net::TcpListener;
use ::tokio::net::TcpStream;
use ::tokio_rustls::TlsAcceptor;
use ::tokio_rustls::server::TlsStream;
use ::tracing::debug;

/// A loopback TCP listener which terminates TLS before handing the
/// stream over to [`axum::serve`].
pub(crate) struct TlsListener {
    tcp_listener: TcpListener,
    acceptor: TlsAcceptor,
}

impl TlsListener {
    pub(crate) fn new(tcp_listener: TcpListener, config: Arc<ServerConfig>) -> Self {
        Self {
            tcp_listener,
            acceptor: TlsAcceptor::from(config),
        }
    }
}

impl Listener for TlsListener {
    type Io = TlsStream<TcpStream>;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        loop {
            let (stream, remote_addr) =
                <TcpListener as Listener>::accept(&mut self.tcp_listener).await;

            match self.acceptor.accept(stream).await {
                Ok(tls_stream) => return (tls_stream, remote_addr),
                Err(err) => {
                    // Plain http clients, and clients which refuse the
                    // self-signed chain, fail the handshake. Skip them
                    // and keep the listener alive.
                    debug!("tls handshake failed: {err}");
                }
            }
        }
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        self.tcp_listener.local_addr()
    }
}
