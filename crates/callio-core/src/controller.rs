use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::SessionConfig;
use crate::engine::{ClientRole, EngineEvent, EngineFactory, JoinOptions, RtcEngine};
use crate::errors::CallioError;

/// Owns the single live engine instance: create, configure,
/// join/leave, release.
///
/// At most one instance exists at a time. The slot is `None` when
/// uninitialized or after release; join/leave/role requests against an
/// empty slot never reach an engine.
pub struct EngineController {
    engine: Mutex<Option<Box<dyn RtcEngine>>>,
}

impl EngineController {
    pub fn new() -> Self {
        Self {
            engine: Mutex::new(None),
        }
    }

    /// Create and configure an engine instance.
    ///
    /// Rejects an empty app id before anything is constructed. A
    /// previous instance is released first, so the single-instance
    /// invariant holds across repeated setups. Returns the event
    /// stream of the new instance.
    pub async fn setup(
        &self,
        config: &SessionConfig,
        factory: &dyn EngineFactory,
    ) -> Result<UnboundedReceiver<EngineEvent>, CallioError> {
        if config.app_id.is_empty() {
            return Err(CallioError::Config(
                "an app id is required to initialize the engine".into(),
            ));
        }

        let mut slot = self.engine.lock().await;
        if let Some(previous) = slot.take() {
            tracing::warn!("releasing previous engine instance before setup");
            previous.release();
        }

        let (mut engine, events) = factory.create()?;
        if let Err(e) = engine.initialize(&config.app_id, config.channel_profile()) {
            engine.release();
            return Err(e.into());
        }
        if let Err(e) = engine.enable_video() {
            engine.release();
            return Err(e.into());
        }
        *slot = Some(engine);
        tracing::info!("engine initialized");
        Ok(events)
    }

    /// Assign the client role. No-op when the engine is absent.
    pub async fn set_role(&self, role: ClientRole) {
        let mut slot = self.engine.lock().await;
        match slot.as_mut() {
            Some(engine) => {
                if let Err(e) = engine.set_client_role(role) {
                    tracing::warn!("set_client_role failed: {e}");
                }
            }
            None => tracing::debug!("set_role ignored: engine not initialized"),
        }
    }

    /// Start the local preview and ask the engine to join the channel
    /// as broadcaster.
    ///
    /// Fails before any engine call when the token or channel name is
    /// missing; the join confirmation arrives later as an event.
    pub async fn join(&self, token: &str, channel: &str, uid: u32) -> Result<(), CallioError> {
        if token.is_empty() || channel.is_empty() {
            return Err(CallioError::Precondition(
                "a channel name and token are required to join".into(),
            ));
        }

        let mut slot = self.engine.lock().await;
        let engine = slot
            .as_mut()
            .ok_or_else(|| CallioError::Precondition("engine not initialized".into()))?;

        engine.start_preview()?;
        engine.join_channel(
            token,
            channel,
            uid,
            JoinOptions {
                client_role: ClientRole::Broadcaster,
            },
        )?;
        Ok(())
    }

    /// Leave the current channel. Absent engine is a no-op.
    pub async fn leave(&self) -> Result<(), CallioError> {
        let mut slot = self.engine.lock().await;
        match slot.as_mut() {
            Some(engine) => {
                engine.leave_channel()?;
                Ok(())
            }
            None => {
                tracing::debug!("leave ignored: engine not initialized");
                Ok(())
            }
        }
    }

    /// Release the engine instance. Safe to call repeatedly; only the
    /// first call after setup releases.
    pub async fn destroy(&self) {
        if let Some(engine) = self.engine.lock().await.take() {
            engine.release();
            tracing::info!("engine released");
        }
    }

    pub async fn is_initialized(&self) -> bool {
        self.engine.lock().await.is_some()
    }
}

impl Default for EngineController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EngineController {
    fn drop(&mut self) {
        // Teardown of the owner must not leak a live engine.
        if let Some(engine) = self.engine.get_mut().take() {
            tracing::info!("engine released on drop");
            engine.release();
        }
    }
}
