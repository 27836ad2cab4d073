//! Interrupt handling for pipeline runs

use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Cancel `cancel` on the first interrupt and return on the second.
///
/// Returns `true` when a second interrupt asks for a hard stop, `false`
/// if listening for interrupts failed.
pub async fn watch_interrupts<F, Fut>(mut next_interrupt: F, cancel: CancellationToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = next_interrupt().await {
        error!("Failed to listen for interrupts: {}", e);
        return false;
    }
    warn!("Interrupt received, cancelling pipeline");
    cancel.cancel();

    match next_interrupt().await {
        Ok(()) => {
            warn!("Second interrupt received, aborting");
            true
        }
        Err(e) => {
            error!("Failed to listen for interrupts: {}", e);
            false
        }
    }
}
