use crate::Result;
use crate::TestServer;
use crate::TestServerConfig;

/// A builder for [`TestServer`]. Inside is a [`TestServerConfig`],
/// configured by each method, and then turned into a running server by
/// [`TestServerBuilder::build`].
///
/// The recommended way to make instances is to call
/// [`TestServer::builder`].
///
/// ```rust
/// # async fn test() -> Result<(), Box<dyn ::std::error::Error>> {
/// #
/// use ::local_test_server::TestServer;
///
/// let server = TestServer::builder()
///     .certificate("foo.bar")
///     .build()
///     .await?;
/// #
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TestServerBuilder {
    config: TestServerConfig,
}

impl TestServerBuilder {
    /// Creates a default `TestServerBuilder`.
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_config(config: TestServerConfig) -> Self {
        Self { config }
    }

    /// Sets the subject to embed in the generated certificate.
    pub fn certificate(mut self, subject: &str) -> Self {
        self.config.certificate = Some(subject.to_string());
        self
    }

    /// Fixes the plain http listener to the given port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = Some(port);
        self
    }

    /// Fixes the https listener to the given port.
    pub fn ssl_port(mut self, ssl_port: u16) -> Self {
        self.config.ssl_port = Some(ssl_port);
        self
    }

    /// For turning this into a [`TestServerConfig`] object,
    /// which can be passed to [`TestServer::new_with_config`].
    pub fn into_config(self) -> TestServerConfig {
        self.config
    }

    /// Generates the certificate, binds both listeners,
    /// and returns the running [`TestServer`].
    pub async fn build(self) -> Result<TestServer> {
        TestServer::new_with_config(self.config).await
    }
}
