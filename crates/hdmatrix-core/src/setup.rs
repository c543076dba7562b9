// ── Onboarding check ──
//
// One-shot probe used before a matrix is added: can we reach it, and is
// it a model we know how to drive?

use hdmatrix_api::MatrixDriver;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::is_supported_device_name;

/// Connect to the device, read its name and check it against the
/// supported model families.
///
/// Returns the reported name on success. The link is closed on every
/// exit path once `connect` has succeeded.
pub async fn validate_connection(driver: &mut dyn MatrixDriver) -> Result<String, CoreError> {
    driver.connect().await?;
    let name = driver.get_device_name().await;
    if let Err(e) = driver.disconnect().await {
        warn!(error = %e, "link close failed after validation (non-fatal)");
    }
    let name = name?;
    debug!(name = %name, "device answered validation probe");

    if !is_supported_device_name(&name) {
        return Err(CoreError::UnsupportedModel { name });
    }

    info!(name = %name, "matrix validated");
    Ok(name)
}
