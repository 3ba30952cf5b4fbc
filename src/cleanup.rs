//! Best-effort removal of the output file.

use std::path::Path;
use tracing::{debug, warn};

/// Delete `path` when `should_delete` is set. Never fails: a missing file is a no-op and
/// any other removal error is logged and swallowed.
pub async fn cleanup(path: &Path, should_delete: bool) {
    if !should_delete {
        debug!(path = %path.display(), "keeping output file");
        return;
    }
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed output file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove output file"),
    }
}
