mod tls_config;
pub(crate) use self::tls_config::*;

mod tls_listener;
pub(crate) use self::tls_listener::*;
