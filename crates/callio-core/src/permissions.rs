use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Device capabilities the core needs before capturing media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    RecordAudio,
    Camera,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    Denied,
}

#[derive(Debug, Error)]
#[error("permission request failed: {0}")]
pub struct PermissionError(pub String);

/// Platform consent prompt. One batched request covers every capability.
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    async fn request(
        &self,
        capabilities: &[Capability],
    ) -> Result<HashMap<Capability, bool>, PermissionError>;
}

/// Provider for platforms without a runtime consent model.
pub struct NoopPermissions;

#[async_trait]
impl PermissionProvider for NoopPermissions {
    async fn request(
        &self,
        capabilities: &[Capability],
    ) -> Result<HashMap<Capability, bool>, PermissionError> {
        Ok(capabilities.iter().map(|c| (*c, true)).collect())
    }
}

/// Requests microphone and camera consent before engine use.
pub struct PermissionGate;

impl PermissionGate {
    /// Request both capabilities in a single batch.
    ///
    /// Granted only when every capability is granted. Provider failures
    /// are caught and reported as Denied rather than propagated; the
    /// caller decides whether Denied aborts setup.
    pub async fn acquire(provider: &dyn PermissionProvider) -> PermissionOutcome {
        let wanted = [Capability::RecordAudio, Capability::Camera];
        match provider.request(&wanted).await {
            Ok(grants) => {
                let all_granted = wanted
                    .iter()
                    .all(|c| grants.get(c).copied().unwrap_or(false));
                if all_granted {
                    tracing::info!("permissions granted");
                    PermissionOutcome::Granted
                } else {
                    tracing::info!("permissions denied");
                    PermissionOutcome::Denied
                }
            }
            Err(e) => {
                tracing::warn!("permission request error: {e}");
                PermissionOutcome::Denied
            }
        }
    }
}
