use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Create a linked handle/signal pair. The signal resolves once the handle is triggered or
/// dropped, whichever comes first.
pub fn shutdown_signal() -> (RpcServerShutdownHandle, RpcServerShutdownSignal) {
    let (tx, rx) = oneshot::channel();

    (RpcServerShutdownHandle { tx }, RpcServerShutdownSignal { rx })
}

pub struct RpcServerShutdownHandle {
    tx: oneshot::Sender<()>,
}

impl RpcServerShutdownHandle {
    pub fn shutdown(self) {
        let _ = self.tx.send(());
    }
}

pub struct RpcServerShutdownSignal {
    rx: oneshot::Receiver<()>,
}

impl Future for RpcServerShutdownSignal {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Sent or dropped, either way we're done.
        Pin::new(&mut self.rx).poll(cx).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn fires_on_shutdown() {
        let (handle, signal) = shutdown_signal();
        handle.shutdown();
        tokio::time::timeout(Duration::from_secs(1), signal).await.unwrap();
    }

    #[tokio::test]
    async fn fires_on_drop() {
        let (handle, signal) = shutdown_signal();
        drop(handle);
        tokio::time::timeout(Duration::from_secs(1), signal).await.unwrap();
    }

    #[tokio::test]
    async fn pending_while_handle_alive() {
        let (_handle, signal) = shutdown_signal();
        assert!(tokio::time::timeout(Duration::from_millis(20), signal).await.is_err());
    }
}
