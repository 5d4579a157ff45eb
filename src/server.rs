use std::{fmt, net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use tokio::{
    net::{TcpListener, ToSocketAddrs},
    sync::{Mutex, Notify, oneshot},
};

use crate::{
    Res,
    api::{self, CaptureState},
    warning,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackError {
    TimedOut(Duration),
    Closed,
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackError::TimedOut(after) => {
                write!(f, "no browser redirect within {} seconds", after.as_secs())
            }
            CallbackError::Closed => write!(f, "callback listener stopped unexpectedly"),
        }
    }
}

impl std::error::Error for CallbackError {}

/// A running one-shot listener waiting for the browser redirect.
pub struct PendingCallback {
    local_addr: SocketAddr,
    receiver: oneshot::Receiver<Option<String>>,
    shutdown: Arc<Notify>,
}

impl PendingCallback {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits for the single redirect request.
    ///
    /// Resolves to the captured value, or `None` when the request did not
    /// carry the expected parameter. The listener is stopped either way.
    pub async fn wait(self, timeout: Duration) -> Result<Option<String>, CallbackError> {
        let outcome = tokio::time::timeout(timeout, self.receiver).await;
        self.shutdown.notify_one();

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(CallbackError::Closed),
            Err(_) => Err(CallbackError::TimedOut(timeout)),
        }
    }
}

/// Binds `addr` and serves exactly one request in a background task.
///
/// The request's `param` query value is forwarded to the returned
/// [`PendingCallback`]; on success the browser gets `body` back. Bind errors
/// are returned right away so the caller does not open a browser for a
/// listener that never came up.
pub async fn start_callback_server<A: ToSocketAddrs>(
    addr: A,
    param: &'static str,
    body: &'static str,
) -> Res<PendingCallback> {
    let (sender, receiver) = oneshot::channel();
    let shutdown = Arc::new(Notify::new());

    let state = CaptureState {
        param,
        body,
        slot: Arc::new(Mutex::new(Some(sender))),
        shutdown: Arc::clone(&shutdown),
    };
    let app = Router::new().fallback(api::capture).with_state(state);

    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    let signal = Arc::clone(&shutdown);
    tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { signal.notified().await })
            .await;
        if let Err(e) = result {
            warning!("Callback listener failed: {}", e);
        }
    });

    Ok(PendingCallback {
        local_addr,
        receiver,
        shutdown,
    })
}
