use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

/// Channel profile the engine is configured with at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelProfile {
    LiveBroadcasting,
    Communication,
}

/// Capability level of the local participant within a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientRole {
    #[default]
    Broadcaster,
    Audience,
}

/// Why a remote participant went offline. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfflineReason {
    Quit,
    Dropped,
    BecomeAudience,
}

/// Events delivered by the engine on its own execution context.
///
/// The engine pushes these into the unbounded channel handed out by
/// [`EngineFactory::create`]; the session core drains them on a
/// background task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    JoinChannelSuccess { channel: String, elapsed_ms: u64 },
    UserJoined { uid: u32, elapsed_ms: u64 },
    UserOffline { uid: u32, reason: OfflineReason },
}

/// Per-join options passed to [`RtcEngine::join_channel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JoinOptions {
    pub client_role: ClientRole,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct EngineError(String);

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Minimal capability surface of the underlying communication engine.
///
/// Calls return as soon as the engine accepts the request; join
/// confirmation and presence changes arrive later as [`EngineEvent`]s.
pub trait RtcEngine: Send {
    fn initialize(&mut self, app_id: &str, profile: ChannelProfile) -> Result<(), EngineError>;

    fn enable_video(&mut self) -> Result<(), EngineError>;

    fn set_client_role(&mut self, role: ClientRole) -> Result<(), EngineError>;

    fn start_preview(&mut self) -> Result<(), EngineError>;

    fn join_channel(
        &mut self,
        token: &str,
        channel: &str,
        uid: u32,
        options: JoinOptions,
    ) -> Result<(), EngineError>;

    fn leave_channel(&mut self) -> Result<(), EngineError>;

    /// Release the engine instance. The event stream closes once the
    /// engine drops its sender.
    fn release(self: Box<Self>);
}

/// Constructs engine instances.
///
/// The returned receiver carries every event the new instance will
/// ever deliver.
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Result<(Box<dyn RtcEngine>, UnboundedReceiver<EngineEvent>), EngineError>;
}
