//! Session controller
//!
//! Owns the single SSH session: its lifecycle state, registered handle,
//! transcript and the execution gate. All methods take `&self`, so one
//! controller can be shared behind an `Arc` by a presentation layer and any
//! number of background tasks.
//!
//! Shared state sits behind a `std::sync::Mutex` that is only held between
//! awaits. The transport calls are the only suspension points and every
//! state change is applied after they resolve.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{Instrument, debug, info, warn};

use super::gate::ExecutionGate;
use super::registry::SessionRegistry;
use super::state::LifecycleState;
use super::transcript::{Transcript, TranscriptEntry};
use crate::config::ClientSettings;
use crate::error::{SessionError, SessionResult, TransportError, TransportResult};
use crate::models::{CommandResult, ConnectionConfig, SessionHandle, SessionId, SessionInfo};
use crate::tracing::span_names;
use crate::transport::SshTransport;

/// Time added to the transport's own connect timeout before the controller
/// gives up on a connect or disconnect
const CONNECT_GRACE_SECS: u64 = 45;

/// Timeouts applied by [`SessionController`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerOptions {
    /// Upper bound for `connect` and `disconnect`; `None` waits indefinitely
    pub connect_timeout: Option<Duration>,
    /// Upper bound for one command; `None` waits indefinitely
    pub command_timeout: Option<Duration>,
}

impl ControllerOptions {
    /// Options without any timeout
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect_timeout: None,
            command_timeout: None,
        }
    }

    /// Derives timeouts from user settings
    #[must_use]
    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self {
            connect_timeout: Some(
                settings.connection.connect_timeout() + Duration::from_secs(CONNECT_GRACE_SECS),
            ),
            command_timeout: settings.execution.command_timeout(),
        }
    }

    /// Sets the connect and disconnect timeout
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the per-command timeout
    #[must_use]
    pub const fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }
}

#[derive(Debug, Default)]
struct ControllerState {
    lifecycle: LifecycleState,
    registry: SessionRegistry,
    transcript: Transcript,
    last_sequence: u64,
    working_directory: Option<String>,
}

impl ControllerState {
    fn next_sequence(&mut self) -> u64 {
        self.last_sequence += 1;
        self.last_sequence
    }
}

/// Drives connect, execute and disconnect against an [`SshTransport`]
pub struct SessionController {
    transport: Arc<dyn SshTransport>,
    options: ControllerOptions,
    state: Mutex<ControllerState>,
    gate: ExecutionGate,
    state_tx: watch::Sender<LifecycleState>,
}

impl SessionController {
    /// Creates a disconnected controller without timeouts
    #[must_use]
    pub fn new(transport: Arc<dyn SshTransport>) -> Self {
        let (state_tx, _) = watch::channel(LifecycleState::Disconnected);
        Self {
            transport,
            options: ControllerOptions::new(),
            state: Mutex::new(ControllerState::default()),
            gate: ExecutionGate::new(),
            state_tx,
        }
    }

    /// Sets the timeouts
    #[must_use]
    pub const fn with_options(mut self, options: ControllerOptions) -> Self {
        self.options = options;
        self
    }

    /// Timeouts in effect
    #[must_use]
    pub const fn options(&self) -> &ControllerOptions {
        &self.options
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_lifecycle(&self, state: &mut ControllerState, next: LifecycleState) {
        debug_assert!(
            state.lifecycle.can_transition_to(next),
            "illegal transition {} -> {next}",
            state.lifecycle
        );
        debug!(from = %state.lifecycle, to = %next, "Lifecycle transition");
        state.lifecycle = next;
        self.state_tx.send_replace(next);
    }

    /// Drops every trace of the session and enters `Disconnected`
    fn teardown(&self, state: &mut ControllerState) {
        state.registry.clear();
        state.transcript.clear();
        state.last_sequence = 0;
        state.working_directory = None;
        if state.lifecycle != LifecycleState::Disconnected {
            self.set_lifecycle(state, LifecycleState::Disconnected);
        }
    }

    /// Opens a session
    ///
    /// On success the handle is registered, a greeting entry carrying the
    /// transport message and `user@host:port` starts the transcript, and the
    /// state becomes `Connected`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::AlreadyConnected`] if a session is registered
    /// - [`SessionError::InvalidState`] while connecting or disconnecting
    /// - [`SessionError::ConnectFailure`] if the transport rejects the
    ///   attempt, errors or times out; the state returns to `Disconnected`
    pub async fn connect(&self, config: ConnectionConfig) -> SessionResult<SessionHandle> {
        let span = crate::trace_operation!(
            span_names::SESSION_CONNECT,
            host = %config.host(),
            port = config.port()
        );
        self.connect_inner(config).instrument(span).await
    }

    async fn connect_inner(&self, config: ConnectionConfig) -> SessionResult<SessionHandle> {
        {
            let mut state = self.lock();
            match state.lifecycle {
                LifecycleState::Disconnected => {}
                LifecycleState::Connected => return Err(SessionError::AlreadyConnected),
                other => {
                    return Err(SessionError::InvalidState {
                        operation: "connect",
                        state: other,
                    });
                }
            }
            if !state.registry.is_empty() {
                return Err(SessionError::AlreadyConnected);
            }
            self.set_lifecycle(&mut state, LifecycleState::Connecting);
        }
        // Falls back to Disconnected on every exit that does not reach Connected
        let _settle = SettleOnDrop::new(self, LifecycleState::Connecting);

        debug!(username = %config.username(), method = %config.auth().method(), "Connecting");
        let started = Instant::now();
        let outcome = bounded(self.options.connect_timeout, self.transport.connect(&config)).await;

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Connection attempt failed");
                return Err(SessionError::ConnectFailure(e.to_string()));
            }
        };
        let session_id = match (response.success, response.session_id) {
            (true, Some(session_id)) => session_id,
            (true, None) => {
                warn!("Transport reported success without a session id");
                return Err(SessionError::ConnectFailure(
                    "transport did not return a session identifier".to_string(),
                ));
            }
            (false, _) => {
                warn!(message = %response.message, "Connection rejected");
                return Err(SessionError::ConnectFailure(response.message));
            }
        };

        let handle = SessionHandle::new(session_id, SessionInfo::from_config(&config));
        let greeting = format!("{}\nConnected to {}", response.message, handle.info().target());

        let mut state = self.lock();
        state.registry.register(handle.clone())?;
        let sequence = state.next_sequence();
        state
            .transcript
            .append(TranscriptEntry::greeting(sequence, greeting))?;
        state.working_directory = response.current_directory;
        self.set_lifecycle(&mut state, LifecycleState::Connected);
        drop(state);

        info!(
            session_id = %handle.id(),
            duration_ms = elapsed_ms(started),
            "Session connected"
        );
        Ok(handle)
    }

    /// Runs one command on the registered session
    ///
    /// The command is trimmed. Blank commands, and any command while not
    /// connected, are ignored with `Ok(None)`. A transport failure or
    /// timeout still produces an entry, with a synthesized
    /// [`CommandResult::transport_failure`] result.
    ///
    /// # Errors
    ///
    /// - [`SessionError::SessionNotFound`] if `session_id` is not the
    ///   registered session
    /// - [`SessionError::ExecutionInProgress`] if another command is running
    /// - [`SessionError::SessionLost`] if the transport no longer knows the
    ///   session; the session is torn down locally
    pub async fn execute(
        &self,
        session_id: &SessionId,
        command: &str,
    ) -> SessionResult<Option<Arc<TranscriptEntry>>> {
        let command = command.trim();
        if command.is_empty() {
            return Ok(None);
        }
        let span = crate::trace_operation!(span_names::SESSION_EXECUTE, session_id = %session_id);
        self.execute_inner(session_id, command).instrument(span).await
    }

    async fn execute_inner(
        &self,
        session_id: &SessionId,
        command: &str,
    ) -> SessionResult<Option<Arc<TranscriptEntry>>> {
        let permit = {
            let state = self.lock();
            if !state.lifecycle.is_connected() {
                debug!(state = %state.lifecycle, "Ignoring command while not connected");
                return Ok(None);
            }
            if !state.registry.contains(session_id) {
                return Err(SessionError::SessionNotFound(session_id.to_string()));
            }
            self.gate.try_acquire()?
        };

        debug!(command, "Executing");
        let started = Instant::now();
        let outcome = bounded(
            self.options.command_timeout,
            self.transport.execute(session_id, command),
        )
        .await;

        let result = match outcome {
            Ok(output) => {
                debug!(
                    exit_status = output.exit_status,
                    duration_ms = elapsed_ms(started),
                    "Command finished"
                );
                CommandResult::from(output)
            }
            Err(e) if e.is_fatal() => {
                warn!(error = %e, "Transport lost the session");
                self.teardown(&mut self.lock());
                return Err(SessionError::SessionLost(e.to_string()));
            }
            Err(e) => {
                warn!(error = %e, duration_ms = elapsed_ms(started), "Command execution failed");
                CommandResult::transport_failure(format!("Command execution failed: {e}"))
            }
        };

        let entry = {
            let mut state = self.lock();
            if !state.registry.contains(session_id) {
                return Err(SessionError::SessionNotFound(session_id.to_string()));
            }
            if let Some(directory) = &result.current_directory {
                state.working_directory = Some(directory.clone());
            }
            let sequence = state.next_sequence();
            state
                .transcript
                .append(TranscriptEntry::command(sequence, command, result))?
        };
        drop(permit);
        Ok(Some(entry))
    }

    /// Closes the session
    ///
    /// A transport failure is logged and the session is dropped locally
    /// regardless. Calling this while disconnected does nothing.
    ///
    /// # Errors
    ///
    /// - [`SessionError::ExecutionInProgress`] while a command is running;
    ///   nothing changes
    /// - [`SessionError::InvalidState`] while connecting or disconnecting
    pub async fn disconnect(&self) -> SessionResult<()> {
        let span = crate::trace_operation!(span_names::SESSION_DISCONNECT);
        self.disconnect_inner().instrument(span).await
    }

    async fn disconnect_inner(&self) -> SessionResult<()> {
        let (handle, permit) = {
            let mut state = self.lock();
            match state.lifecycle {
                LifecycleState::Connected => {}
                LifecycleState::Disconnected => return Ok(()),
                other => {
                    return Err(SessionError::InvalidState {
                        operation: "disconnect",
                        state: other,
                    });
                }
            }
            let permit = self.gate.try_acquire()?;
            let handle = state.registry.current().cloned();
            self.set_lifecycle(&mut state, LifecycleState::Disconnecting);
            (handle, permit)
        };
        let _settle = SettleOnDrop::new(self, LifecycleState::Disconnecting);

        if let Some(handle) = handle {
            let outcome = bounded(
                self.options.connect_timeout,
                self.transport.disconnect(handle.id()),
            )
            .await;
            match outcome {
                Ok(()) => info!(session_id = %handle.id(), "Session disconnected"),
                Err(e) => warn!(
                    session_id = %handle.id(),
                    error = %e,
                    "Transport disconnect failed; dropping session anyway"
                ),
            }
        }

        self.teardown(&mut self.lock());
        drop(permit);
        Ok(())
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.lock().lifecycle
    }

    /// Receiver that observes every lifecycle transition
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.state_tx.subscribe()
    }

    /// Transcript entries in submission order
    #[must_use]
    pub fn transcript(&self) -> Vec<Arc<TranscriptEntry>> {
        self.lock().transcript.snapshot()
    }

    /// Registered session, if any
    #[must_use]
    pub fn session(&self) -> Option<SessionHandle> {
        self.lock().registry.current().cloned()
    }

    /// All live sessions (zero or one)
    #[must_use]
    pub fn sessions(&self) -> Vec<SessionHandle> {
        self.lock().registry.list()
    }

    /// Remote working directory as last reported by the transport
    #[must_use]
    pub fn current_directory(&self) -> Option<String> {
        self.lock().working_directory.clone()
    }

    /// Returns true while a command is in flight
    #[must_use]
    pub fn is_executing(&self) -> bool {
        self.gate.is_busy()
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("options", &self.options)
            .field("state", &self.state())
            .field("executing", &self.is_executing())
            .finish_non_exhaustive()
    }
}

/// Tears the session down if the controller is still in `pending` when
/// dropped, covering early returns and futures dropped mid-await
struct SettleOnDrop<'a> {
    controller: &'a SessionController,
    pending: LifecycleState,
}

impl<'a> SettleOnDrop<'a> {
    const fn new(controller: &'a SessionController, pending: LifecycleState) -> Self {
        Self {
            controller,
            pending,
        }
    }
}

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        let mut state = self.controller.lock();
        if state.lifecycle == self.pending {
            self.controller.teardown(&mut state);
        }
    }
}

async fn bounded<T>(
    limit: Option<Duration>,
    future: impl Future<Output = TransportResult<T>>,
) -> TransportResult<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .unwrap_or_else(|_| Err(TransportError::Timeout(limit))),
        None => future.await,
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
