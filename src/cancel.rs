use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::{EvalError, EvalResult};

/// Host side of walk cancellation.
///
/// Cancellation is sticky until [`CancelHandle::reset`] is called.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn reset(&self) {
        self.sender.send_replace(false);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            receiver: self.sender.subscribe(),
        }
    }
}

/// Walk side of cancellation, checked at every extension suspension point.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    receiver: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Runs `fut` unless the walk is cancelled before or while it runs.
    pub async fn guard<F, T>(&self, fut: F) -> EvalResult<T>
    where
        F: Future<Output = EvalResult<T>>,
    {
        if self.is_cancelled() {
            return Err(EvalError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(EvalError::Cancelled),
            result = fut => result,
        }
    }

    async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                // sender gone: nobody can cancel any more
                std::future::pending::<()>().await;
            }
        }
    }
}
