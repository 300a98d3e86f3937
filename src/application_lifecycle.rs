//! Global application lifecycle handling: a broadcast channel that long-running
//! tasks subscribe to so the signal handler can shut the daemon down cleanly.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use tokio::sync::broadcast;

pub static APPLICATION_EXIT_SENDER: Lazy<broadcast::Sender<()>> = Lazy::new(|| broadcast::channel(2).0);

/// Notify all listening tasks of daemon termination.
pub fn send_exit() -> Result<()> {
    APPLICATION_EXIT_SENDER.send(()).context("Failed to send exit lifecycle event")?;
    Ok(())
}

/// Yields Ok(()) on daemon termination. Await on this in all long-running tasks.
pub async fn recv_exit() -> Result<()> {
    APPLICATION_EXIT_SENDER.subscribe().recv().await.context("Failed to receive lifecycle event")
}

/// Select in a loop, breaking once an application termination event is received.
#[macro_export]
macro_rules! loop_select_exiting {
    ($($content:tt)*) => {
        loop {
            tokio::select! {
                Ok(()) = $crate::application_lifecycle::recv_exit() => {
                    break;
                }
                $($content)*
            }
        }
    };
}
