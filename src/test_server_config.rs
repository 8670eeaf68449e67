///
/// The options for creating a [`TestServer`](crate::TestServer).
///
/// Every option is optional. `TestServerConfig::default()` gives you a
/// server with an auto generated `localhost` certificate, and two
/// ephemeral ports chosen by the OS.
///
/// This is a plain struct, so unknown options cannot be passed in at all;
/// they are rejected at compile time.
///
#[derive(Debug, Clone)]
pub struct TestServerConfig {
    /// The subject to embed in the generated certificate. It is handed
    /// through to the certificate provider untouched.
    ///
    /// **Defaults** to `localhost`.
    pub certificate: Option<String>,

    /// Fix the plain http listener to this port,
    /// instead of an ephemeral port chosen by the OS.
    ///
    /// **Defaults** to an ephemeral port.
    pub port: Option<u16>,

    /// Fix the https listener to this port,
    /// instead of an ephemeral port chosen by the OS.
    ///
    /// **Defaults** to an ephemeral port.
    pub ssl_port: Option<u16>,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            certificate: None,
            port: None,
            ssl_port: None,
        }
    }
}
