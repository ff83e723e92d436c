//! Ctrl-C as a flag the session driver and the approval prompt can wait on.

use tokio::sync::watch;

/// Set once by the first Ctrl-C and never cleared.
#[derive(Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

impl Interrupt {
    /// Listen for Ctrl-C on the current runtime.
    pub fn ctrl_c() -> Self {
        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::debug!("Received Ctrl-C");
                    let _ = tx.send(true);
                }
                Err(e) => tracing::warn!(error = %e, "Could not listen for Ctrl-C"),
            }
        });
        Self { rx }
    }

    /// An interrupt fired through the returned sender instead of a signal.
    #[cfg(test)]
    pub fn manual() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    pub fn is_set(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the interrupt fires. Pends forever if the listener
    /// went away without firing.
    pub async fn fired(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|set| *set).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
