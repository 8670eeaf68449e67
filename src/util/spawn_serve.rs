use ::axum::serve;
use ::axum::serve::Listener;
use ::std::net::SocketAddr;
use ::std::sync::Arc;
use ::tokio::spawn;
use ::tokio::sync::Notify;
use ::tower::make::Shared;

use crate::Protocol;
use crate::TestRouter;
use crate::util::ServeHandle;

/// A wrapper around [`axum::serve()`] which runs the service in a spawned
/// task, with graceful shutdown wired up to the returned
/// [`crate::util::ServeHandle`].
pub(crate) fn spawn_serve<L>(listener: L, router: TestRouter, protocol: Protocol) -> ServeHandle
where
    L: Listener<Addr = SocketAddr>,
{
    let shutdown_notification = Arc::new(Notify::new());
    let shutdown_signal = Arc::clone(&shutdown_notification);

    let server_handle = spawn(async move {
        serve(listener, Shared::new(router))
            .with_graceful_shutdown(async move { shutdown_signal.notified().await })
            .await
            .expect("Expect server to keep serving until told to shut down");
    });

    ServeHandle::new(server_handle, shutdown_notification, protocol)
}
