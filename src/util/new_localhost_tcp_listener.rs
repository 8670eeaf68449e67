use ::reserve_port::ReservedPort;
use ::std::io;
use ::std::net::IpAddr;
use ::std::net::Ipv4Addr;
use ::std::net::SocketAddr;
use ::std::net::TcpListener as StdTcpListener;
use ::tokio::net::TcpListener as TokioTcpListener;

pub(crate) const LOOPBACK_IP_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Binds a [`tokio::net::TcpListener`] on the IP 127.0.0.1.
///
/// When no port is given, a random free port is picked and kept reserved,
/// so concurrently running tests cannot end up with the same one.
pub(crate) fn new_localhost_tcp_listener(
    maybe_port: Option<u16>,
) -> io::Result<(TokioTcpListener, SocketAddr)> {
    let (tcp_listener, socket_addr) = match maybe_port {
        Some(port) => {
            let socket_addr = SocketAddr::new(LOOPBACK_IP_ADDRESS, port);
            let tcp_listener = StdTcpListener::bind(socket_addr)?;
            (tcp_listener, socket_addr)
        }
        None => ReservedPort::random_permanently_reserved_tcp(LOOPBACK_IP_ADDRESS)
            .map_err(io::Error::other)?,
    };

    tcp_listener.set_nonblocking(true)?;
    let tokio_tcp_listener = TokioTcpListener::from_std(tcp_listener)?;

    Ok((tokio_tcp_listener, socket_addr))
}
