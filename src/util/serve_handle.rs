use ::std::sync::Arc;
use ::tokio::sync::Notify;
use ::tokio::task::JoinHandle;

use crate::Protocol;
use crate::Result;
use crate::ServerError;

/// Owns the serve task behind one listening socket.
///
/// Dropping the handle aborts the task outright. [`ServeHandle::shutdown`]
/// stops it gracefully instead, letting in-flight requests drain.
#[derive(Debug)]
pub(crate) struct ServeHandle {
    server_handle: Option<JoinHandle<()>>,
    shutdown_notification: Arc<Notify>,
    protocol: Protocol,
}

impl ServeHandle {
    pub(crate) fn new(
        server_handle: JoinHandle<()>,
        shutdown_notification: Arc<Notify>,
        protocol: Protocol,
    ) -> Self {
        Self {
            server_handle: Some(server_handle),
            shutdown_notification,
            protocol,
        }
    }

    /// Signals graceful shutdown, and waits for the serve task to finish
    /// draining whatever it is still serving.
    pub(crate) async fn shutdown(mut self) -> Result<()> {
        self.shutdown_notification.notify_one();

        if let Some(server_handle) = self.server_handle.take() {
            server_handle.await.map_err(|err| ServerError::Close {
                protocol: self.protocol,
                source: Box::new(err),
            })?;
        }

        Ok(())
    }
}

impl Drop for ServeHandle {
    fn drop(&mut self) {
        self.shutdown_notification.notify_one();
        if let Some(server_handle) = &self.server_handle {
            server_handle.abort();
        }
    }
}
