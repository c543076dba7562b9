// ── Connection guard ──
//
// The matrix speaks a strictly request/response protocol over a single
// link, so every logical operation takes exclusive ownership of the
// driver, opens the link, runs, and closes it again before the next
// operation may start.

use futures_util::future::BoxFuture;
use hdmatrix_api::{Error, MatrixDriver};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// A device operation borrowing the driver for the lifetime `'a`.
pub type DeviceFuture<'a, T> = BoxFuture<'a, Result<T, Error>>;

/// Serializes access to one driver and scopes each operation to one
/// connect/disconnect pair.
pub struct ConnectionGuard {
    link: Mutex<Link>,
    library_version: String,
}

struct Link {
    driver: Box<dyn MatrixDriver>,
    /// Set between a successful `connect` and the matching `disconnect`.
    /// Still set on entry only if the previous holder was cancelled.
    open: bool,
}

impl ConnectionGuard {
    pub fn new(driver: Box<dyn MatrixDriver>) -> Self {
        let library_version = driver.library_version().to_owned();
        Self {
            link: Mutex::new(Link {
                driver,
                open: false,
            }),
            library_version,
        }
    }

    /// Driver library version, captured at construction.
    pub fn library_version(&self) -> &str {
        &self.library_version
    }

    /// Run `op` against a freshly opened link.
    ///
    /// Waits for any in-flight operation to finish first. The link is
    /// closed on every exit path before the result is returned; a failed
    /// close is logged and does not mask the operation's own result.
    /// Nothing is retried.
    pub async fn with_connection<T, F>(&self, op: F) -> Result<T, Error>
    where
        F: for<'a> FnOnce(&'a mut dyn MatrixDriver) -> DeviceFuture<'a, T>,
    {
        let mut link = self.link.lock().await;

        if link.open {
            debug!("closing link left open by an interrupted operation");
            if let Err(e) = link.driver.disconnect().await {
                warn!(error = %e, "stale link close failed (non-fatal)");
            }
            link.open = false;
        }

        link.driver.connect().await?;
        link.open = true;

        let result = op(link.driver.as_mut()).await;

        if let Err(e) = link.driver.disconnect().await {
            warn!(error = %e, "link close failed (non-fatal)");
        }
        link.open = false;

        result
    }

    /// Close the link if an interrupted operation left it open.
    pub async fn close(&self) {
        let mut link = self.link.lock().await;
        if link.open {
            if let Err(e) = link.driver.disconnect().await {
                warn!(error = %e, "link close failed during shutdown");
            }
            link.open = false;
        }
    }
}
