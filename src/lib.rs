//!
//! Local Test Server runs a real, throwaway web server inside your test
//! suite:
//!
//!  * You create a [`TestServer`] within a test,
//!  * it binds a plain http listener and a self-signed https listener,
//!    both loopback-only, on ephemeral ports,
//!  * you register routes against it (before or after it starts
//!    listening),
//!  * then point the http client you are actually testing at
//!    [`TestServer::url()`] or [`TestServer::ssl_url()`].
//!
//! It is made for testing code which insists on talking to a real
//! socket, such as http clients, proxies, and download tooling.
//!
//! ## Getting Started
//!
//! Create a [`TestServer`], and register routes on it:
//!
//! ```rust
//! # async fn test() -> Result<(), Box<dyn ::std::error::Error>> {
//! #
//! use ::local_test_server::TestServer;
//!
//! let server = TestServer::new().await?;
//! server.get("/foo", || async { "bar" });
//!
//! let url = server.url().expect("Should be listening after creation");
//! // make real requests against `url` with the client under test
//!
//! server.close().await?;
//! #
//! # Ok(())
//! # }
//! ```
//!
//! ## Properties
//!
//! While the server is listening it exposes:
//!
//!  * [`TestServer::host()`], always `localhost`,
//!  * [`TestServer::port()`] and [`TestServer::ssl_port()`], the two
//!    bound ports,
//!  * [`TestServer::url()`] and [`TestServer::ssl_url()`], ready-made
//!    base urls,
//!  * [`TestServer::ssl_cert()`], the generated certificate material.
//!
//! The ports read `None` while the server is closed, and may change
//! across a [`TestServer::close()`] / [`TestServer::listen()`] cycle.
//!
//! ## Https
//!
//! The https listener uses a certificate generated freshly for each
//! server, signed by a throwaway certificate authority. Clients can
//! validate the connection properly, without turning verification off,
//! by trusting `server.ssl_cert().ca_keys.cert`. Pass a
//! [`TestServerConfig::certificate`] value to embed a custom subject
//! instead of `localhost`.
//!

#![forbid(unsafe_code)]

pub(crate) mod internals;
pub(crate) mod util;

mod certificate;
pub use self::certificate::*;

mod server_error;
pub use self::server_error::*;

mod test_router;
pub use self::test_router::*;

mod test_server;
pub use self::test_server::*;

mod test_server_builder;
pub use self::test_server_builder::*;

mod test_server_config;
pub use self::test_server_config::*;

pub use ::http;
