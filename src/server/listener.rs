// Listener module
// Binds the endpoint's TCP listener through socket2 so socket options are set before bind

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

/// Pending-connection queue length handed to `listen(2)`
const BACKLOG: i32 = 1024;

/// Bind a non-blocking `TcpListener` with `SO_REUSEADDR` and `SO_REUSEPORT`
///
/// Reuse lets a restarted process rebind while old sockets sit in
/// `TIME_WAIT`, and lets several processes share the port.
pub fn create_reusable_listener(addr: std::net::SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(BACKLOG)?;

    TcpListener::from_std(socket.into())
}
