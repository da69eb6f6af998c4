//! Background session keepalive
//!
//! Refreshes the tokens on a fixed interval while a user is signed in, so
//! interactive use rarely hits a 401. The task is owned by a handle: dropping
//! or cancelling the handle aborts it.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::fetch::AuthedClient;

/// Owner of a running keepalive task.
#[derive(Debug)]
pub struct KeepaliveHandle {
    task: JoinHandle<()>,
}

impl KeepaliveHandle {
    pub fn cancel(self) {
        self.task.abort();
        debug!("keepalive cancelled");
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for KeepaliveHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a task that refreshes the session every `interval`.
///
/// The task ends on its own when a refresh fails for good (the wrapper has
/// already cleared the session and redirected). Transport errors are logged
/// and retried on the next tick.
pub fn spawn_keepalive(client: Arc<AuthedClient>, interval: Duration) -> KeepaliveHandle {
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick fires immediately; tokens were just issued
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match client.refresh().await {
                Ok(()) => debug!("keepalive refresh succeeded"),
                Err(Error::RefreshFailed(reason)) => {
                    info!(reason = %reason, "keepalive stopping, session ended");
                    break;
                }
                Err(e) => warn!(error = %e, "keepalive refresh failed, will retry next tick"),
            }
        }
    });
    KeepaliveHandle { task }
}
