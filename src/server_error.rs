use ::std::fmt;
use ::std::io;
use ::thiserror::Error;

/// Which of the two listeners an error relates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    /// The url scheme served by this listener.
    pub fn scheme(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// The ways creating, starting, or stopping a [`TestServer`](crate::TestServer)
/// can fail.
///
/// None of these are retried internally. They all propagate to the caller,
/// who may call [`TestServer::listen`](crate::TestServer::listen) again if
/// they wish.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The certificate provider failed to produce usable key material.
    ///
    /// Fatal to server creation. No listeners are left behind.
    #[error("failed to generate the server certificate")]
    CertificateGeneration(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The generated key material was rejected when building the TLS
    /// server configuration.
    #[error("generated certificate material was rejected by the TLS stack")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// One of the two listeners could not be bound.
    ///
    /// Any sibling listener bound during the same call has already been
    /// released again, so a failed call never leaks a socket.
    #[error("failed to bind the {protocol} listener")]
    Bind {
        protocol: Protocol,
        #[source]
        source: io::Error,
    },

    /// A listener's serve task could not be shut down cleanly.
    ///
    /// The server still counts as closed when this is returned.
    #[error("failed to shut down the {protocol} listener")]
    Close {
        protocol: Protocol,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<::rcgen::Error> for ServerError {
    fn from(err: ::rcgen::Error) -> Self {
        Self::CertificateGeneration(Box::new(err))
    }
}

impl From<::rustls::Error> for ServerError {
    fn from(err: ::rustls::Error) -> Self {
        Self::Tls(Box::new(err))
    }
}

pub type Result<T, E = ServerError> = ::std::result::Result<T, E>;

#[cfg(test)]
mod test_protocol {
    use super::*;

    #[test]
    fn it_should_display_as_the_url_scheme() {
        assert_eq!(Protocol::Http.to_string(), "http");
        assert_eq!(Protocol::Https.to_string(), "https");
    }
}
