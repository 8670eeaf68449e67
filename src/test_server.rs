use ::axum::extract::Request;
use ::axum::handler::Handler;
use ::axum::response::IntoResponse;
use ::axum::routing::MethodRouter;
use ::axum::routing::Route;
use ::rustls::ServerConfig;
use ::std::convert::Infallible;
use ::std::net::SocketAddr;
use ::std::sync::Arc;
use ::std::sync::Mutex;
use ::std::sync::MutexGuard;
use ::tokio::task::spawn_blocking;
use ::tower::Layer;
use ::tower::Service;
use ::tracing::debug;
use ::url::Url;

use crate::CertificateBundle;
use crate::CertificateOptions;
use crate::Protocol;
use crate::Result;
use crate::ServerError;
use crate::TestRouter;
use crate::TestServerBuilder;
use crate::TestServerConfig;
use crate::certificate;
use crate::internals::TlsListener;
use crate::internals::new_tls_server_config;
use crate::util::ServeHandle;
use crate::util::new_localhost_tcp_listener;
use crate::util::spawn_serve;

/// The hostname both listeners are reachable as.
pub const DEFAULT_HOST: &str = "localhost";

///
/// The `TestServer` runs a real web server inside your test suite. It
/// serves plain http and self-signed https at the same time, from two
/// loopback-only sockets on ephemeral ports, both dispatching to the
/// same routes.
///
/// Creating one binds both sockets straight away:
///
/// ```rust
/// # async fn test() -> Result<(), Box<dyn ::std::error::Error>> {
/// #
/// use ::local_test_server::TestServer;
///
/// let server = TestServer::new().await?;
/// server.get("/ping", || async { "pong!" });
///
/// let url = server.url().expect("Should be listening after creation");
/// assert_eq!(url.host_str(), Some("localhost"));
/// #
/// # Ok(())
/// # }
/// ```
///
/// Routes registered after the server has started listening, through
/// [`TestServer::get`] and friends or any [`TestRouter`] clone, are
/// reachable immediately.
///
/// The server can be stopped with [`close`](Self::close), and started
/// again with [`listen`](Self::listen). Restarting picks fresh ephemeral
/// ports, so read [`url`](Self::url) again after a restart. The
/// certificate identity stays the same for the server's whole life.
///
/// To validate the https side without turning certificate checks off,
/// trust the authority found at `server.ssl_cert().ca_keys.cert`.
///
#[derive(Debug)]
pub struct TestServer {
    router: TestRouter,
    certificate: CertificateBundle,
    tls_config: Arc<ServerConfig>,
    config: TestServerConfig,
    state: Mutex<Option<BoundListeners>>,
}

/// The pair of serving sockets. These exist while the server is
/// listening, and are taken out wholesale when it closes.
#[derive(Debug)]
struct BoundListeners {
    http: ServeHandle,
    https: ServeHandle,
    http_addr: SocketAddr,
    https_addr: SocketAddr,
}

impl TestServer {
    /// Creates a server with the default configuration,
    /// and starts it listening.
    ///
    /// This is the same as creating a new `TestServer` with
    /// [`TestServerConfig::default()`].
    pub async fn new() -> Result<Self> {
        Self::new_with_config(TestServerConfig::default()).await
    }

    /// Creates a [`TestServerBuilder`], for customising the
    /// configuration.
    pub fn builder() -> TestServerBuilder {
        TestServerBuilder::new()
    }

    /// This is very similar to [`TestServer::new()`],
    /// however you can customise the certificate subject and fix the
    /// ports. See [`TestServerConfig`] for each setting.
    ///
    /// The returned server is already listening. If the certificate
    /// cannot be generated, or either listener cannot be bound, no
    /// socket is left behind.
    pub async fn new_with_config(config: TestServerConfig) -> Result<Self> {
        let router = TestRouter::new();

        let certificate_options = CertificateOptions {
            common_name: config.certificate.clone(),
        };
        let certificate = spawn_blocking(move || certificate::generate(&certificate_options))
            .await
            .map_err(|err| ServerError::CertificateGeneration(Box::new(err)))??;

        let tls_config = new_tls_server_config(&certificate)?;

        let server = Self {
            router,
            certificate,
            tls_config,
            config,
            state: Mutex::new(None),
        };
        server.listen().await?;

        Ok(server)
    }

    /// Binds the plain listener and the tls listener, and starts
    /// serving on both.
    ///
    /// Calling this while the server is already listening is a no-op
    /// which resolves straight away; the existing sockets and ports are
    /// kept. Calling it after [`close`](Self::close) binds fresh
    /// sockets, on fresh ephemeral ports unless the configuration fixed
    /// them.
    ///
    /// If either bind fails, the other socket from the same attempt is
    /// released before the error is returned.
    pub async fn listen(&self) -> Result<()> {
        if self.is_listening() {
            return Ok(());
        }

        let bound = self.bind_listeners().await?;

        let mut state = lock_state(&self.state);
        if state.is_some() {
            // A concurrent listen call won the race.
            // Keep its sockets, drop ours.
            return Ok(());
        }

        debug!(
            port = bound.http_addr.port(),
            ssl_port = bound.https_addr.port(),
            "listening"
        );
        *state = Some(bound);

        Ok(())
    }

    /// Unbinds both listeners, releasing their sockets.
    ///
    /// In-flight requests are allowed to finish draining before this
    /// resolves; idle connections are closed immediately. Afterwards
    /// [`port`](Self::port) and [`ssl_port`](Self::ssl_port) read
    /// `None`, and new connection attempts to the old addresses are
    /// refused by the OS.
    ///
    /// Closing an already closed server is a no-op which resolves
    /// without error, including when two calls race each other.
    pub async fn close(&self) -> Result<()> {
        let taken = lock_state(&self.state).take();
        let Some(listeners) = taken else {
            return Ok(());
        };

        debug!(
            port = listeners.http_addr.port(),
            ssl_port = listeners.https_addr.port(),
            "closing"
        );

        let (http_result, https_result) =
            ::tokio::join!(listeners.http.shutdown(), listeners.https.shutdown());
        http_result?;
        https_result?;

        Ok(())
    }

    /// Returns true while both listeners are bound and serving.
    pub fn is_listening(&self) -> bool {
        lock_state(&self.state).is_some()
    }

    /// The hostname the server is reachable as. Always `localhost`.
    pub fn host(&self) -> &'static str {
        DEFAULT_HOST
    }

    /// The plain http listener's port, while the server is listening.
    ///
    /// Ports are not stable across restarts. Read this again after
    /// calling [`listen`](Self::listen).
    pub fn port(&self) -> Option<u16> {
        lock_state(&self.state)
            .as_ref()
            .map(|listeners| listeners.http_addr.port())
    }

    /// The tls listener's port, while the server is listening.
    pub fn ssl_port(&self) -> Option<u16> {
        lock_state(&self.state)
            .as_ref()
            .map(|listeners| listeners.https_addr.port())
    }

    /// The base url of the plain http listener,
    /// something like `http://localhost:54321/`.
    pub fn url(&self) -> Option<Url> {
        self.port().map(|port| new_localhost_url("http", port))
    }

    /// The base url of the tls listener,
    /// something like `https://localhost:54322/`.
    pub fn ssl_url(&self) -> Option<Url> {
        self.ssl_port().map(|port| new_localhost_url("https", port))
    }

    /// The certificate material backing the https listener.
    ///
    /// This is generated once, when the server is created, and does not
    /// change across restarts.
    pub fn ssl_cert(&self) -> &CertificateBundle {
        &self.certificate
    }

    /// Returns a clonable handle for registering routes,
    /// for handing to helper code.
    pub fn router(&self) -> TestRouter {
        self.router.clone()
    }

    /// Registers a handler for `GET` requests to the path.
    ///
    /// Routes can be registered at any time,
    /// including while the server is listening.
    pub fn get<H, T>(&self, path: &str, handler: H)
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.router.get(path, handler)
    }

    /// Registers a handler for `POST` requests to the path.
    pub fn post<H, T>(&self, path: &str, handler: H)
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.router.post(path, handler)
    }

    /// Registers a handler for `PUT` requests to the path.
    pub fn put<H, T>(&self, path: &str, handler: H)
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.router.put(path, handler)
    }

    /// Registers a handler for `PATCH` requests to the path.
    pub fn patch<H, T>(&self, path: &str, handler: H)
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.router.patch(path, handler)
    }

    /// Registers a handler for `DELETE` requests to the path.
    pub fn delete<H, T>(&self, path: &str, handler: H)
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.router.delete(path, handler)
    }

    /// Registers a handler for `HEAD` requests to the path.
    pub fn head<H, T>(&self, path: &str, handler: H)
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.router.head(path, handler)
    }

    /// Registers a handler for `OPTIONS` requests to the path.
    pub fn options<H, T>(&self, path: &str, handler: H)
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.router.options(path, handler)
    }

    /// Registers a handler for `TRACE` requests to the path.
    pub fn trace<H, T>(&self, path: &str, handler: H)
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.router.trace(path, handler)
    }

    /// Registers a [`MethodRouter`] at the path.
    pub fn route(&self, path: &str, method_router: MethodRouter) {
        self.router.route(path, method_router)
    }

    /// Attaches a middleware layer around all routes registered so far.
    pub fn layer<L>(&self, layer: L)
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.router.layer(layer)
    }

    /// Binds both sockets concurrently, and spawns a serve task for
    /// each. The sockets are only handed back together; when one bind
    /// fails the other is released by dropping it.
    async fn bind_listeners(&self) -> Result<BoundListeners> {
        let (http, https) = ::tokio::try_join!(
            async {
                new_localhost_tcp_listener(self.config.port).map_err(|source| ServerError::Bind {
                    protocol: Protocol::Http,
                    source,
                })
            },
            async {
                new_localhost_tcp_listener(self.config.ssl_port).map_err(|source| {
                    ServerError::Bind {
                        protocol: Protocol::Https,
                        source,
                    }
                })
            },
        )?;

        let (http_listener, http_addr) = http;
        let (https_listener, https_addr) = https;

        let http_handle = spawn_serve(http_listener, self.router.clone(), Protocol::Http);

        let tls_listener = TlsListener::new(https_listener, Arc::clone(&self.tls_config));
        let https_handle = spawn_serve(tls_listener, self.router.clone(), Protocol::Https);

        Ok(BoundListeners {
            http: http_handle,
            https: https_handle,
            http_addr,
            https_addr,
        })
    }
}

fn new_localhost_url(scheme: &str, port: u16) -> Url {
    format!("{scheme}://{DEFAULT_HOST}:{port}")
        .parse()
        .expect("Localhost urls are always well formed")
}

fn lock_state(
    state: &Mutex<Option<BoundListeners>>,
) -> MutexGuard<'_, Option<BoundListeners>> {
    state.lock().expect("Failed to lock the listener state")
}

#[cfg(test)]
mod test_new {
    use super::*;

    #[tokio::test]
    async fn it_should_start_listening_on_two_distinct_ports() {
        let server = TestServer::new().await.expect("Should create test server");

        assert!(server.is_listening());

        let port = server.port().expect("Should have a http port");
        let ssl_port = server.ssl_port().expect("Should have a https port");
        assert!(port > 0);
        assert!(ssl_port > 0);
        assert_ne!(port, ssl_port);
    }

    #[tokio::test]
    async fn it_should_expose_localhost_urls() {
        let server = TestServer::new().await.expect("Should create test server");

        let url = server.url().expect("Should have a url");
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(url.port(), server.port());

        let ssl_url = server.ssl_url().expect("Should have a ssl url");
        assert_eq!(ssl_url.scheme(), "https");
        assert_eq!(ssl_url.host_str(), Some("localhost"));
        assert_eq!(ssl_url.port(), server.ssl_port());
    }
}

#[cfg(test)]
mod test_new_with_config {
    use super::*;

    #[tokio::test]
    async fn it_should_bind_the_requested_ports() {
        let (free_listener, free_addr) = new_localhost_tcp_listener(None).unwrap();
        drop(free_listener);

        let config = TestServerConfig {
            port: Some(free_addr.port()),
            ..TestServerConfig::default()
        };
        let server = TestServer::new_with_config(config)
            .await
            .expect("Should create test server on the requested port");

        assert_eq!(server.port(), Some(free_addr.port()));
    }

    #[tokio::test]
    async fn it_should_fail_with_a_bind_error_when_the_port_is_taken() {
        let (_guard_listener, taken_addr) = new_localhost_tcp_listener(None).unwrap();

        let config = TestServerConfig {
            port: Some(taken_addr.port()),
            ..TestServerConfig::default()
        };
        let result = TestServer::new_with_config(config).await;

        assert!(matches!(
            result,
            Err(ServerError::Bind {
                protocol: Protocol::Http,
                ..
            }),
        ));
    }
}
