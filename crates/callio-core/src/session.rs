use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::SessionConfig;
use crate::controller::EngineController;
use crate::engine::{ClientRole, EngineEvent, EngineFactory};
use crate::errors::CallioError;
use crate::events::{CallioEvent, CallioEventListener, EventEmitter, SessionState};
use crate::participants::ParticipantRoster;
use crate::permissions::{NoopPermissions, PermissionGate, PermissionOutcome, PermissionProvider};
use crate::token::{HttpTokenProvider, TokenProvider};

/// Caller-facing role selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Audience,
}

/// Orchestrates one call session: permission acquisition, engine
/// lifecycle, token retrieval, channel join/leave, and remote-participant
/// presence.
///
/// Public operations are async and expected to be invoked sequentially
/// by one caller. Presence events from the engine are drained on a
/// background task and applied to the roster as copy-on-write snapshots,
/// so UI readers never block on a half-applied update.
pub struct SessionManager {
    config: Mutex<SessionConfig>,
    controller: EngineController,
    state: Arc<RwLock<SessionState>>,
    participants: Arc<ParticipantRoster>,
    emitter: EventEmitter,
    factory: Arc<dyn EngineFactory>,
    tokens: Arc<dyn TokenProvider>,
    permissions: Arc<dyn PermissionProvider>,
}

impl SessionManager {
    /// Session with the default collaborators: HTTP token server and no
    /// runtime consent prompt.
    pub fn new(config: SessionConfig, factory: Arc<dyn EngineFactory>) -> Self {
        Self::with_collaborators(
            config,
            factory,
            Arc::new(HttpTokenProvider),
            Arc::new(NoopPermissions),
        )
    }

    /// Session with explicitly injected collaborators.
    pub fn with_collaborators(
        config: SessionConfig,
        factory: Arc<dyn EngineFactory>,
        tokens: Arc<dyn TokenProvider>,
        permissions: Arc<dyn PermissionProvider>,
    ) -> Self {
        Self {
            config: Mutex::new(config),
            controller: EngineController::new(),
            state: Arc::new(RwLock::new(SessionState::Idle)),
            participants: Arc::new(ParticipantRoster::new()),
            emitter: EventEmitter::new(),
            factory,
            tokens,
            permissions,
        }
    }

    /// Register a listener for session events.
    pub fn add_listener(&self, listener: Arc<dyn CallioEventListener>) {
        self.emitter.add_listener(listener);
    }

    pub fn state(&self) -> SessionState {
        *self.state.read().unwrap()
    }

    /// Whether the local participant is currently in the channel.
    pub fn joined(&self) -> bool {
        self.state() == SessionState::Joined
    }

    /// Snapshot of the remote participant uids, in join order.
    pub fn remote_participants(&self) -> Vec<u32> {
        self.participants.snapshot().as_ref().clone()
    }

    /// Copy of the current session configuration.
    pub fn config(&self) -> SessionConfig {
        self.config.lock().unwrap().clone()
    }

    /// Acquire permissions, create the engine, and start the event
    /// drain. A denied consent is reported but does not abort setup.
    pub async fn setup(&self) -> Result<(), CallioError> {
        self.set_state(SessionState::Initializing);

        if PermissionGate::acquire(self.permissions.as_ref()).await == PermissionOutcome::Denied {
            self.notify("camera and microphone permissions were denied");
        }

        let config = self.config();
        let events = match self.controller.setup(&config, self.factory.as_ref()).await {
            Ok(events) => events,
            Err(e) => {
                self.set_state(SessionState::Error);
                return Err(e);
            }
        };

        self.spawn_event_drain(events);
        self.set_state(SessionState::Ready);
        Ok(())
    }

    /// Host maps to the broadcaster capability, Audience to
    /// receive-only.
    pub async fn set_role(&self, role: Role) {
        let client_role = match role {
            Role::Host => ClientRole::Broadcaster,
            Role::Audience => ClientRole::Audience,
        };
        self.controller.set_role(client_role).await;
    }

    /// Retrieve a token for `channel_name`.
    ///
    /// An empty channel name falls back to the configured default.
    /// Without a configured token server the stored token is returned
    /// unchanged; otherwise a fetched token and the requested channel
    /// name are written back to the configuration for the next join.
    pub async fn fetch_token(&self, channel_name: &str) -> Result<String, CallioError> {
        let (default_channel, server_url, uid, expiry, stored_token) = {
            let config = self.config.lock().unwrap();
            (
                config.channel_name.clone(),
                config.server_url.clone(),
                config.uid,
                config.token_expiry_secs,
                config.token.clone(),
            )
        };

        let channel = if channel_name.is_empty() {
            tracing::info!("no channel name given, using the configured channel: {default_channel}");
            default_channel
        } else {
            channel_name.to_string()
        };

        let Some(server_url) = server_url.filter(|url| !url.is_empty()) else {
            self.notify("add a token server URL to the configuration to fetch a fresh token");
            return Ok(stored_token.unwrap_or_default());
        };

        let token = self.tokens.fetch(&server_url, &channel, uid, expiry).await?;
        tracing::info!("channel token fetched from server");

        {
            let mut config = self.config.lock().unwrap();
            config.token = Some(token.clone());
            config.channel_name = channel;
        }
        Ok(token)
    }

    /// Ask the engine to join the configured channel as broadcaster.
    ///
    /// Returns once the engine accepts the request; the Joined state is
    /// entered when the engine confirms the join.
    pub async fn join(&self) -> Result<(), CallioError> {
        if self.state() != SessionState::Ready {
            return Err(CallioError::Precondition(
                "session is not ready to join a channel".into(),
            ));
        }

        let (token, channel, uid) = {
            let config = self.config.lock().unwrap();
            (
                config.token.clone().unwrap_or_default(),
                config.channel_name.clone(),
                config.uid,
            )
        };
        if token.is_empty() || channel.is_empty() {
            return Err(CallioError::Precondition(
                "a channel name and token are required to join".into(),
            ));
        }

        // Enter Joining before the engine call so a confirmation that
        // arrives immediately is not dropped by the event drain.
        self.set_state(SessionState::Joining);
        if let Err(e) = self.controller.join(&token, &channel, uid).await {
            self.set_state(SessionState::Ready);
            return Err(e);
        }
        Ok(())
    }

    /// Leave the current channel. A no-op when not joined.
    pub async fn leave(&self) -> Result<(), CallioError> {
        if self.state() != SessionState::Joined {
            tracing::debug!("leave ignored: not joined");
            return Ok(());
        }

        self.set_state(SessionState::Leaving);
        match self.controller.leave().await {
            Ok(()) => {
                self.set_state(SessionState::Ready);
                self.notify("left the channel");
                Ok(())
            }
            Err(e) => {
                self.set_state(SessionState::Joined);
                Err(e)
            }
        }
    }

    /// Release the engine and clear presence state. Safe to call twice;
    /// the second call changes nothing.
    pub async fn destroy(&self) {
        self.controller.destroy().await;
        if !self.participants.is_empty() {
            self.participants.clear();
            self.emitter.emit(CallioEvent::ParticipantsChanged(Vec::new()));
        }
        if self.state() != SessionState::Idle {
            self.set_state(SessionState::Idle);
        }
    }

    /// Create the engine, fetch a token for the configured channel, and
    /// join it.
    pub async fn join_call(&self) -> Result<(), CallioError> {
        self.setup().await?;
        let channel = self.config.lock().unwrap().channel_name.clone();
        self.fetch_token(&channel).await?;
        self.join().await
    }

    /// Leave the channel and release the engine.
    pub async fn leave_call(&self) -> Result<(), CallioError> {
        self.leave().await?;
        self.destroy().await;
        Ok(())
    }

    fn set_state(&self, state: SessionState) {
        *self.state.write().unwrap() = state;
        self.emitter.emit(CallioEvent::StateChanged(state));
    }

    fn notify(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{message}");
        self.emitter.emit(CallioEvent::Notice(message));
    }

    fn spawn_event_drain(&self, mut events: UnboundedReceiver<EngineEvent>) {
        let participants = self.participants.clone();
        let state = self.state.clone();
        let emitter = self.emitter.clone();

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    EngineEvent::JoinChannelSuccess { channel, .. } => {
                        let confirmed = {
                            let mut s = state.write().unwrap();
                            if *s == SessionState::Joining {
                                *s = SessionState::Joined;
                                true
                            } else {
                                false
                            }
                        };
                        if confirmed {
                            emitter.emit(CallioEvent::StateChanged(SessionState::Joined));
                            emitter.emit(CallioEvent::Notice(format!(
                                "successfully joined the channel {channel}"
                            )));
                        } else {
                            tracing::debug!("join confirmation ignored outside Joining");
                        }
                    }
                    EngineEvent::UserJoined { uid, .. } => {
                        tracing::info!("remote user joined with uid {uid}");
                        if participants.add(uid) {
                            emitter.emit(CallioEvent::ParticipantJoined(uid));
                            emitter.emit(CallioEvent::ParticipantsChanged(
                                participants.snapshot().as_ref().clone(),
                            ));
                        }
                    }
                    EngineEvent::UserOffline { uid, reason } => {
                        tracing::info!("remote user left the channel, uid {uid}, reason {reason:?}");
                        if participants.remove(uid) {
                            emitter.emit(CallioEvent::ParticipantLeft { uid, reason });
                            emitter.emit(CallioEvent::ParticipantsChanged(
                                participants.snapshot().as_ref().clone(),
                            ));
                        }
                    }
                }
            }
            tracing::debug!("engine event stream closed");
        });
    }
}
