use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{oneshot, watch};

use crate::LroError;

/// An in-flight unary call.
///
/// Awaiting a `Call` yields the response or the error passed through from the
/// transport. The request runs on its own task, so it makes progress whether
/// or not the `Call` is being polled, and any number of calls can be in flight
/// at once.
///
/// Cancelling aborts only this request. It does not cancel the long-running
/// operation the request refers to; use
/// [`OperationsClient::cancel_operation`](crate::OperationsClient::cancel_operation) for that.
#[must_use = "a call does nothing observable unless awaited or given a completion handler"]
pub struct Call<T> {
    result: oneshot::Receiver<Result<T, LroError>>,
    canceller: CallCanceller,
}

/// Cancels the [`Call`] it was taken from. Cheap to clone and safe to use
/// after the call has finished.
#[derive(Clone, Debug)]
pub struct CallCanceller {
    signal: Arc<watch::Sender<bool>>,
}

impl CallCanceller {
    pub fn cancel(&self) {
        self.signal.send_replace(true);
    }
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            futures::future::pending::<()>().await;
        }
    }
}

impl<T: Send + 'static> Call<T> {
    pub(crate) fn spawn<F>(request: F) -> Self
    where
        F: Future<Output = Result<T, LroError>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let (signal, mut cancel) = watch::channel(false);
        tokio::spawn(async move {
            // Whichever finishes first is the only thing ever delivered.
            let result = tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => Err(LroError::Cancelled),
                result = request => result,
            };
            if tx.send(result).is_err() {
                tracing::trace!("call result dropped, the caller went away");
            }
        });
        Call {
            result: rx,
            canceller: CallCanceller {
                signal: Arc::new(signal),
            },
        }
    }

    /// A completed call with a fixed result, used when a request is rejected
    /// before it reaches the transport.
    pub(crate) fn ready(result: Result<T, LroError>) -> Self {
        Self::spawn(futures::future::ready(result))
    }

    pub fn cancel(&self) {
        self.canceller.cancel()
    }

    pub fn canceller(&self) -> CallCanceller {
        self.canceller.clone()
    }

    /// Deliver the outcome to `handler` instead of awaiting it.
    ///
    /// The handler runs exactly once: with the response, with the error from
    /// the server, or with [`LroError::Cancelled`] if the returned canceller
    /// fired before the response arrived.
    pub fn on_complete<H>(self, handler: H) -> CallCanceller
    where
        H: FnOnce(Result<T, LroError>) + Send + 'static,
    {
        let canceller = self.canceller();
        tokio::spawn(async move { handler(self.await) });
        canceller
    }
}

impl<T> Future for Call<T> {
    type Output = Result<T, LroError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A dropped sender means the task was torn down with the runtime.
        Pin::new(&mut self.result)
            .poll(cx)
            .map(|result| result.unwrap_or(Err(LroError::Cancelled)))
    }
}

impl<T> std::fmt::Debug for Call<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Call").finish_non_exhaustive()
    }
}
