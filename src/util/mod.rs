mod new_localhost_tcp_listener;
pub(crate) use self::new_localhost_tcp_listener::*;

mod serve_handle;
pub(crate) use self::serve_handle::*;

mod spawn_serve;
pub(crate) use self::spawn_serve::*;
