//! Two-stage interrupt handling.
//!
//! The first interrupt cancels the run: no new jobs start, running jobs finish and the results database is written.
//! A second interrupt gives up waiting and terminates the process with [`FORCED_EXIT_CODE`].
//!
//! A run that is cancelled for another reason (for example the error limit) also arms the second stage, so an
//! impatient user can still force the exit while jobs drain.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Exit code used when the user forces termination.
pub const FORCED_EXIT_CODE: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Waiting for the first interrupt.
    Armed,
    /// Run cancelled; the next interrupt forces the exit.
    Cancelling,
}

/// Wait for interrupts delivered by `next_interrupt` and drive `token` through the two stages.
///
/// Returns when the process should be terminated.
pub async fn supervise<F, Fut>(token: CancellationToken, mut next_interrupt: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut stage = Stage::Armed;
    loop {
        match stage {
            Stage::Armed => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => {}
                    () = next_interrupt() => {
                        tracing::info!("interrupted, waiting for running jobs (interrupt again to exit immediately)");
                        token.cancel();
                    }
                }
                stage = Stage::Cancelling;
            }
            Stage::Cancelling => {
                next_interrupt().await;
                tracing::warn!("interrupted again, exiting");
                return;
            }
        }
    }
}

/// Listen for Ctrl-C in the background. `force_exit` runs on the second interrupt.
pub fn spawn_interrupt_handler<X>(token: CancellationToken, force_exit: X) -> JoinHandle<()>
where
    X: FnOnce() + Send + 'static,
{
    tokio::spawn(async move {
        supervise(token, ctrl_c).await;
        force_exit();
    })
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "cannot listen for interrupts");
        std::future::pending::<()>().await;
    }
}
