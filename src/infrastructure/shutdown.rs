use tokio::sync::watch;

/// Resolves once the process is asked to stop (Ctrl-C or SIGTERM).
#[derive(Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Signal wired to a caller-owned trigger.
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (sender, receiver) = watch::channel(false);
        (sender, Self { receiver })
    }

    /// Signal wired to the OS interrupt and terminate handlers.
    pub fn install() -> Self {
        let (sender, signal) = Self::channel();

        let ctrlc = sender.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, shutting down");
                let _ = ctrlc.send(true);
            }
        });

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let term = sender;
            tokio::spawn(async move {
                if let Ok(mut sig) = signal(SignalKind::terminate()) {
                    sig.recv().await;
                    tracing::info!("terminate received, shutting down");
                    let _ = term.send(true);
                }
            });
        }

        signal
    }

    pub async fn wait(mut self) {
        if *self.receiver.borrow() {
            return;
        }
        let _ = self.receiver.changed().await;
    }
}
