use std::future::Future;

use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::Result;

/// Runs a request nobody waits on.
///
/// Failures are logged and otherwise dropped; there is no retry. The handle may
/// be awaited by callers that need to observe completion, or simply dropped.
pub fn spawn_best_effort<F>(label: &'static str, request: F) -> JoinHandle<()>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = request.await {
            warn!(task = label, error = %err, "best-effort request failed");
        }
    })
}
